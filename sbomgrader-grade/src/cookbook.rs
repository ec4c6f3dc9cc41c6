//! [`Cookbook`] — a named partition of rule names into MUST/SHOULD/MAY
//! tiers, and [`CookbookResult`] — the per-tier view of a grading
//! [`Result`] plus the derived [`Grade`] (spec.md §4.5).

use crate::config::CookbookConfig;
use crate::error::{RuleSetError, UnknownRulesetSnafu};
use crate::grade::Grade;
use crate::result::{Result, ResultDetail};
use crate::ruleset::{Format, RuleSet};
use indexmap::IndexSet;
use std::collections::HashMap;

/// The three tiers a cookbook partitions rule names into, in the fixed
/// iteration order the Result-diagnostics determinism contract (spec.md
/// §4.5) requires: MUST, then SHOULD, then MAY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum RuleForce {
    #[strum(serialize = "MUST")]
    Must,
    #[strum(serialize = "SHOULD")]
    Should,
    #[strum(serialize = "MAY")]
    May,
}

/// A named projection of a [`RuleSet`] by rule-name membership into
/// MUST/SHOULD/MAY tiers (spec.md §3 "Cookbook").
///
/// `must`/`should`/`may` are `IndexSet`s rather than `HashSet`s so tier
/// iteration preserves the cookbook file's declared order, which
/// [`CookbookResult`]'s diagnostics ordering depends on.
#[derive(Debug, Clone)]
pub struct Cookbook {
    pub name: String,
    pub ruleset: RuleSet,
    pub must: IndexSet<String>,
    pub should: IndexSet<String>,
    pub may: IndexSet<String>,
}

impl Cookbook {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ruleset: RuleSet,
        must: IndexSet<String>,
        should: IndexSet<String>,
        may: IndexSet<String>,
    ) -> Self {
        Cookbook {
            name: name.into(),
            ruleset,
            must,
            should,
            may,
        }
    }

    /// Builds a `Cookbook` from a parsed cookbook file, combining the
    /// `RuleSet`s `config.rulesets` names resolve to in `rulesets_by_name`
    /// (ruleset *loading* from disk is a Non-goal; the caller resolves
    /// identifiers to already-constructed `RuleSet`s).
    pub fn from_config(
        config: &CookbookConfig,
        rulesets_by_name: &HashMap<String, RuleSet>,
    ) -> std::result::Result<Self, RuleSetError> {
        let mut ruleset = RuleSet::new();
        for ruleset_name in &config.rulesets {
            let found = rulesets_by_name.get(ruleset_name).ok_or_else(|| {
                UnknownRulesetSnafu {
                    cookbook: config.name.clone(),
                    ruleset: ruleset_name.clone(),
                }
                .build()
            })?;
            ruleset = ruleset.combine(found.clone());
        }
        let must: IndexSet<String> = config.must.iter().cloned().collect();
        let should: IndexSet<String> = config.should.iter().cloned().collect();
        let may: IndexSet<String> = config.may.iter().cloned().collect();
        let selection: std::collections::HashSet<String> =
            must.iter().chain(&should).chain(&may).cloned().collect();
        ruleset.set_selection(selection);
        Ok(Cookbook::new(config.name.clone(), ruleset, must, should, may))
    }

    #[must_use]
    pub fn contains(&self, rule_name: &str) -> bool {
        self.must.contains(rule_name) || self.should.contains(rule_name) || self.may.contains(rule_name)
    }

    #[must_use]
    pub fn all_used_rule_names(&self) -> IndexSet<String> {
        self.must
            .iter()
            .chain(&self.should)
            .chain(&self.may)
            .cloned()
            .collect()
    }

    /// Grades `doc` against this cookbook's ruleset, wrapping the raw
    /// [`Result`] with tier/grade projection.
    pub fn call(&self, doc: &sbomgrader_core::Document, format: &Format) -> CookbookResult {
        let result = self.ruleset.call(doc, format);
        CookbookResult {
            result,
            cookbook_name: self.name.clone(),
            must: self.must.clone(),
            should: self.should.clone(),
            may: self.may.clone(),
        }
    }
}

/// A [`Result`] viewed through one [`Cookbook`]'s tiers, with the derived
/// [`Grade`] (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct CookbookResult {
    pub result: Result,
    pub cookbook_name: String,
    pub must: IndexSet<String>,
    pub should: IndexSet<String>,
    pub may: IndexSet<String>,
}

impl CookbookResult {
    #[must_use]
    fn tier(&self, force: RuleForce) -> &IndexSet<String> {
        match force {
            RuleForce::Must => &self.must,
            RuleForce::Should => &self.should,
            RuleForce::May => &self.may,
        }
    }

    /// Every rule detail in `force`'s tier, in cookbook-file declared order.
    #[must_use]
    pub fn by_force(&self, force: RuleForce) -> Vec<ResultDetail> {
        self.tier(force).iter().map(|name| self.result.get(name)).collect()
    }

    #[must_use]
    pub fn get(&self, rule_name: &str) -> ResultDetail {
        self.result.get(rule_name)
    }

    /// Grade derivation (spec.md §4.5): any unsuccessful MUST rule ⇒ `F`;
    /// otherwise start at `A` and step down once per unsuccessful SHOULD
    /// rule, clamped at `F`. MAY failures never affect the grade.
    #[must_use]
    pub fn grade(&self) -> Grade {
        let any_must_failed = self.must.iter().any(|name| self.result.is_unsuccessful(name));
        if any_must_failed {
            return Grade::F;
        }
        let should_failures = self.should.iter().filter(|name| self.result.is_unsuccessful(name)).count();
        let mut grade = Grade::A;
        for _ in 0..should_failures {
            grade = grade.lower();
        }
        grade
    }

    /// The subset of this tiering whose rules are `Failed`/`Error`, per
    /// `CookbookResult.get_unsuccessful` in the original source.
    #[must_use]
    pub fn unsuccessful(&self) -> CookbookResult {
        let keep = |set: &IndexSet<String>| -> IndexSet<String> {
            set.iter().filter(|n| self.result.is_unsuccessful(n)).cloned().collect()
        };
        CookbookResult {
            result: self.result.clone(),
            cookbook_name: self.cookbook_name.clone(),
            must: keep(&self.must),
            should: keep(&self.should),
            may: keep(&self.may),
        }
    }

    #[must_use]
    pub fn all_used_rule_names(&self) -> IndexSet<String> {
        self.must
            .iter()
            .chain(&self.should)
            .chain(&self.may)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    pub(super) fn cookbook_result(must: &[&str], should: &[&str], may: &[&str], failed: &[&str]) -> CookbookResult {
        let mut result = Result::new();
        let all: Vec<&str> = must.iter().chain(should).chain(may).copied().collect();
        for name in &all {
            if failed.contains(name) {
                result.failed.insert((*name).to_string(), "bad".to_string());
            } else {
                result.ran.insert((*name).to_string());
            }
        }
        CookbookResult {
            result,
            cookbook_name: "test".to_string(),
            must: must.iter().map(|s| s.to_string()).collect(),
            should: should.iter().map(|s| s.to_string()).collect(),
            may: may.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn must_failure_is_f() {
        let cr = cookbook_result(&["r1", "r2"], &["r3", "r4", "r5"], &["r6"], &["r1"]);
        assert_eq!(cr.grade(), Grade::F);
    }

    #[test]
    fn one_should_failure_and_may_failure_ignored_is_b() {
        let cr = cookbook_result(&["r1", "r2"], &["r3", "r4", "r5"], &["r6"], &["r4", "r6"]);
        assert_eq!(cr.grade(), Grade::B);
    }

    #[test]
    fn force_iteration_order_is_must_should_may() {
        let order: Vec<RuleForce> = RuleForce::iter().collect();
        assert_eq!(order, vec![RuleForce::Must, RuleForce::Should, RuleForce::May]);
    }
}

#[cfg(test)]
mod proptests {
    use super::tests::*;
    use super::*;
    use proptest::prelude::*;

    /// spec.md §8 "grade monotonicity": failing one more SHOULD rule never
    /// improves the grade, and any MUST failure always bottoms out at `F`
    /// regardless of how many SHOULD rules also fail.
    proptest! {
        #[test]
        fn failing_an_additional_should_rule_never_improves_the_grade(
            should_count in 0usize..6,
            extra_should_fails in 0usize..6,
            must_fails in prop::bool::ANY,
        ) {
            let should: Vec<String> = (0..should_count).map(|i| format!("should_{i}")).collect();
            let should_refs: Vec<&str> = should.iter().map(String::as_str).collect();
            let must: &[&str] = if must_fails { &["must_0"] } else { &[] };

            let base_failed: Vec<&str> = if must_fails { vec!["must_0"] } else { Vec::new() };
            let base = cookbook_result(must, &should_refs, &[], &base_failed);

            let extra = extra_should_fails.min(should_count);
            let mut more_failed = base_failed.clone();
            more_failed.extend(should_refs.iter().take(extra).copied());
            let worse = cookbook_result(must, &should_refs, &[], &more_failed);

            prop_assert!(worse.grade() >= base.grade());
            if must_fails {
                prop_assert_eq!(worse.grade(), Grade::F);
            }
        }
    }
}

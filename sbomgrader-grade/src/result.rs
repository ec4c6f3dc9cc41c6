//! [`Result`] and [`ResultDetail`] — the disjoint-sets-over-rule-names
//! bookkeeping a [`crate::ruleset::RuleSet`] invocation produces, and the
//! per-rule status it classifies into on demand (spec.md §3 "Result").

use std::collections::{HashMap, HashSet};

/// The classification a single rule landed in after a grading run.
///
/// Mirrors `original_source/sbomgrader/core/enums.py::ResultType`, with
/// `NotPresent` kept as the implicit "rule name unknown to any category"
/// state (see [`Result::get`]) rather than a category `Result` itself
/// tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum ResultType {
    #[strum(serialize = "success")]
    Success,
    #[strum(serialize = "not present")]
    NotPresent,
    #[strum(serialize = "failed")]
    Failed,
    #[strum(serialize = "error")]
    Error,
    #[strum(serialize = "skipped")]
    Skipped,
    #[strum(serialize = "not implemented")]
    NotImplemented,
}

impl ResultType {
    /// A single-glyph rendering for the markdown report, matching
    /// `ResultType.get_visual` in the original source.
    #[must_use]
    pub fn visual(self) -> &'static str {
        match self {
            ResultType::Success => "\u{2713}",
            ResultType::Failed => "\u{2717}",
            ResultType::Error => "!",
            ResultType::Skipped => "\u{21BB}",
            ResultType::NotPresent => "??",
            ResultType::NotImplemented => "?",
        }
    }
}

/// The resolved status of one rule, named by `rule_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDetail {
    pub rule_name: String,
    pub result_type: ResultType,
    pub result_detail: Option<String>,
}

/// Disjoint-by-construction sets/maps over rule names produced by grading a
/// document against a [`crate::ruleset::RuleSet`] (spec.md §3 "Result").
///
/// A rule name can legitimately appear in more than one bucket once two
/// `Result`s are [merged](Result::merge) (e.g. a rule ran under one
/// ruleset and was skipped by another covering the same name); [`Result::get`]
/// resolves that overlap by priority, per spec.md §3's invariant note:
/// "consumers must classify by priority Error > Fail > Skipped >
/// NotImplemented > Success".
#[derive(Debug, Clone, Default)]
pub struct Result {
    pub ran: HashSet<String>,
    pub failed: HashMap<String, String>,
    pub errors: HashMap<String, String>,
    pub skipped: HashSet<String>,
    pub not_implemented: HashSet<String>,
}

impl Result {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Union-merges `other` into a fresh `Result`, left unbiased — matching
    /// `Result.__add__`'s `self.x | other.x` dict/set union in the original
    /// source.
    #[must_use]
    pub fn merge(&self, other: &Result) -> Result {
        Result {
            ran: self.ran.union(&other.ran).cloned().collect(),
            failed: self
                .failed
                .iter()
                .chain(other.failed.iter())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            errors: self
                .errors
                .iter()
                .chain(other.errors.iter())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            skipped: self.skipped.union(&other.skipped).cloned().collect(),
            not_implemented: self
                .not_implemented
                .union(&other.not_implemented)
                .cloned()
                .collect(),
        }
    }

    pub fn merge_in(&mut self, other: Result) {
        self.ran.extend(other.ran);
        self.failed.extend(other.failed);
        self.errors.extend(other.errors);
        self.skipped.extend(other.skipped);
        self.not_implemented.extend(other.not_implemented);
    }

    /// Classifies a rule name by priority — `Error > Failed > Skipped >
    /// NotImplemented > Success > NotPresent` — per spec.md §3's explicit
    /// priority ordering (see DESIGN.md for why this differs from the
    /// bucket-check order in `original_source/sbomgrader/grade/rules.py`,
    /// which checks `failed` ahead of `errors`).
    #[must_use]
    pub fn get(&self, rule_name: &str) -> ResultDetail {
        if let Some(detail) = self.errors.get(rule_name) {
            return ResultDetail {
                rule_name: rule_name.to_string(),
                result_type: ResultType::Error,
                result_detail: Some(detail.clone()),
            };
        }
        if let Some(detail) = self.failed.get(rule_name) {
            return ResultDetail {
                rule_name: rule_name.to_string(),
                result_type: ResultType::Failed,
                result_detail: Some(detail.clone()),
            };
        }
        if self.skipped.contains(rule_name) {
            return ResultDetail {
                rule_name: rule_name.to_string(),
                result_type: ResultType::Skipped,
                result_detail: Some("Rule was not present in the cookbook.".to_string()),
            };
        }
        if self.not_implemented.contains(rule_name) {
            return ResultDetail {
                rule_name: rule_name.to_string(),
                result_type: ResultType::NotImplemented,
                result_detail: Some("No implementation found for the document type.".to_string()),
            };
        }
        if self.ran.contains(rule_name) {
            return ResultDetail {
                rule_name: rule_name.to_string(),
                result_type: ResultType::Success,
                result_detail: Some("Success.".to_string()),
            };
        }
        ResultDetail {
            rule_name: rule_name.to_string(),
            result_type: ResultType::NotPresent,
            result_detail: Some("Rule is not present in any RuleSet.".to_string()),
        }
    }

    /// `true` if `rule_name` classifies as [`ResultType::Failed`] or
    /// [`ResultType::Error`] — the "unsuccessful" predicate cookbook
    /// grading (§4.5) is built on.
    #[must_use]
    pub fn is_unsuccessful(&self, rule_name: &str) -> bool {
        matches!(
            self.get(rule_name).result_type,
            ResultType::Failed | ResultType::Error
        )
    }
}

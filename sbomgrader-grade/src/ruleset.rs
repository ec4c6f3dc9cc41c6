//! [`RuleSet`] — owns a collection of [`Rule`]s keyed by `(format, name)`
//! and drives a single grading pass over a document (spec.md §3 "A RuleSet
//! owns a set of Rules keyed by (format, name)").

use crate::config::RuleFileConfig;
use crate::error::RuleSetError;
use crate::result::Result;
use crate::rule::Rule;
use checker::CheckerRegistry;
use sbomgrader_core::document::Document;
use sbomgrader_core::evaluate::Evaluator;
use sbomgrader_core::variable::{resolve, VariableDef};
use std::collections::{HashMap, HashSet};

use crate::checker;

/// A named format a document may be graded/translated as (`"spdx23"`,
/// `"cdx16"`, ...). Modeled as an open string newtype rather than a closed
/// enum — spec.md §1 widens scope to SPDX 2.2/2.3 and CycloneDX 1.5/1.6,
/// and rule files name formats as free-form strings (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Format(pub String);

impl Format {
    pub const SPDX22: &'static str = "spdx22";
    pub const SPDX23: &'static str = "spdx23";
    pub const CDX15: &'static str = "cdx15";
    pub const CDX16: &'static str = "cdx16";
}

impl From<&str> for Format {
    fn from(value: &str) -> Self {
        Format(value.to_string())
    }
}

impl From<String> for Format {
    fn from(value: String) -> Self {
        Format(value)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A collection of compiled [`Rule`]s across formats, plus the subset
/// `selection` actually evaluated when called (spec.md §4.5/original
/// source `Cookbook.initialize` narrows `selection` to must|should|may).
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<Format, HashMap<String, Rule>>,
    all_rule_names: HashSet<String>,
    selection: Option<HashSet<String>>,
    global_variables: HashMap<Format, Vec<VariableDef>>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a `RuleSet` from one parsed rule file, resolving `func_name`
    /// checkers against `registry`.
    pub fn from_config(
        config: &RuleFileConfig,
        registry: &CheckerRegistry,
    ) -> std::result::Result<Self, RuleSetError> {
        let mut rules: HashMap<Format, HashMap<String, Rule>> = HashMap::new();
        let mut all_rule_names = HashSet::new();

        for rule_config in &config.rules {
            all_rule_names.insert(rule_config.name.clone());
            for implementation in &rule_config.implementations {
                let rule = Rule::from_config(rule_config, implementation, registry)?;
                rules
                    .entry(Format::from(implementation.name.as_str()))
                    .or_default()
                    .insert(rule_config.name.clone(), rule);
            }
        }

        let mut global_variables = HashMap::new();
        if let Some(vars) = &config.variables {
            for implementation in &vars.implementations {
                let defs = implementation
                    .variables
                    .iter()
                    .map(|v| VariableDef::new(v.name.clone(), v.field_path.clone()))
                    .collect();
                global_variables.insert(Format::from(implementation.name.as_str()), defs);
            }
        }

        Ok(RuleSet {
            rules,
            all_rule_names,
            selection: None,
            global_variables,
        })
    }

    #[must_use]
    pub fn all_rule_names(&self) -> &HashSet<String> {
        &self.all_rule_names
    }

    /// Narrows which rule names actually get evaluated by [`RuleSet::call`];
    /// names outside the selection are classified as `Skipped`. `None`
    /// means "everything known", matching the original source's default
    /// `selection = self.all_rule_names`.
    pub fn set_selection(&mut self, selection: HashSet<String>) {
        self.selection = Some(selection);
    }

    #[must_use]
    pub fn combine(mut self, other: RuleSet) -> RuleSet {
        for (format, rule_map) in other.rules {
            self.rules.entry(format).or_default().extend(rule_map);
        }
        self.all_rule_names.extend(other.all_rule_names);
        self.selection = match (self.selection.take(), other.selection) {
            (Some(mut a), Some(b)) => {
                a.extend(b);
                Some(a)
            }
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        };
        for (format, defs) in other.global_variables {
            self.global_variables.entry(format).or_default().extend(defs);
        }
        self
    }

    /// Grades `doc` (known to be in format `format`) against every rule
    /// name this set knows, per spec.md §4.4/`RuleSet.__call__`.
    pub fn call(&self, doc: &Document, format: &Format) -> Result {
        let mut result = Result::new();

        let fallback: HashMap<String, Vec<Document>> = self
            .global_variables
            .get(format)
            .map(|defs| {
                resolve(defs, HashMap::new(), |path, scope| {
                    let ev = Evaluator::new(scope);
                    ev.get_objects(doc, path).unwrap_or_default()
                })
                .into_resolved()
            })
            .unwrap_or_default();

        let rules_for_format = self.rules.get(format);

        for name in &self.all_rule_names {
            if let Some(selection) = &self.selection {
                if !selection.contains(name) {
                    result.skipped.insert(name.clone());
                    continue;
                }
            }
            match rules_for_format.and_then(|m| m.get(name)) {
                Some(rule) => result.merge_in(rule.call(doc, &fallback)),
                None => {
                    result.not_implemented.insert(name.clone());
                }
            }
        }
        result
    }
}

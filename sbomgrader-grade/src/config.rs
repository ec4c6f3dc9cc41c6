//! `serde`-deserializable shapes of the "Rule file" and "Cookbook file"
//! formats from spec.md §6. Loading these from disk is a Non-goal; callers
//! hand in an already-decoded tree (typically via `serde_yaml`/`serde_json`
//! straight into these structs).

use indexmap::IndexMap;
use serde::Deserialize;

fn default_minimum_tested_elements() -> usize {
    1
}

/// Top-level shape of a rule file (spec.md §6 "Rule file").
#[derive(Debug, Clone, Deserialize)]
pub struct RuleFileConfig {
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub variables: Option<GlobalVariablesConfig>,
}

/// `variables.implementations[]` — per-format variables visible to every
/// rule in the file as fallback scope (spec.md §4.4 "resolver with optional
/// fallback scope from RuleSet-global variables").
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalVariablesConfig {
    pub implementations: Vec<ImplementationVariablesConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImplementationVariablesConfig {
    pub name: String,
    pub variables: Vec<VariableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    #[serde(rename = "failureMessage")]
    pub failure_message: String,
    pub implementations: Vec<ImplementationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImplementationConfig {
    pub name: String,
    #[serde(rename = "fieldPath")]
    pub field_path: Option<String>,
    pub checker: IndexMap<String, CheckerOperand>,
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
    #[serde(rename = "minimumTestedElements", default = "default_minimum_tested_elements")]
    pub minimum_tested_elements: usize,
    #[serde(rename = "failureMessage", default)]
    pub failure_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    #[serde(rename = "fieldPath")]
    pub field_path: String,
}

/// The right-hand side of a rule file's `checker: {op: value}` mapping.
/// `value` may be a single operand or a list (spec.md §6: "Lists may mix
/// `FIELD_NOT_PRESENT` with concrete values").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CheckerOperand {
    Single(OperandValue),
    List(Vec<OperandValue>),
}

impl CheckerOperand {
    #[must_use]
    pub fn as_list(&self) -> Vec<&OperandValue> {
        match self {
            CheckerOperand::Single(v) => vec![v],
            CheckerOperand::List(v) => v.iter().collect(),
        }
    }
}

/// One operand value: a literal scalar, or the string sentinel
/// `"FIELD_NOT_PRESENT"` (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OperandValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl OperandValue {
    #[must_use]
    pub fn is_field_not_present(&self) -> bool {
        matches!(self, OperandValue::String(s) if s == "FIELD_NOT_PRESENT")
    }
}

/// Top-level shape of a cookbook file (spec.md §6 "Cookbook file").
#[derive(Debug, Clone, Deserialize)]
pub struct CookbookConfig {
    pub name: String,
    pub rulesets: Vec<String>,
    #[serde(rename = "MUST", default)]
    pub must: Vec<String>,
    #[serde(rename = "SHOULD", default)]
    pub should: Vec<String>,
    #[serde(rename = "MAY", default)]
    pub may: Vec<String>,
}

//! The `checker: any -> bool | unit` contract from spec.md §4.4, reified as
//! a trait plus the precompiled combinators named in spec.md §6's
//! `{op: value}` checker shape, grounded in `operation_map` from
//! `original_source/rules/rule.py`.

use sbomgrader_core::document::Scalar;
use sbomgrader_core::Document;
use std::fmt;
use std::sync::Arc;

/// A single operand value from a rule file's `checker` mapping: either a
/// concrete scalar or the `FIELD_NOT_PRESENT` sentinel (spec.md §6).
#[derive(Debug, Clone, PartialEq)]
pub enum CheckValue {
    FieldNotPresent,
    Scalar(Document),
}

impl CheckValue {
    #[must_use]
    fn matches(&self, value: &Document) -> bool {
        match self {
            CheckValue::FieldNotPresent => value.is_missing(),
            CheckValue::Scalar(expected) => !value.is_missing() && value == expected,
        }
    }
}

/// A unary predicate run against the [`Document`] matched by a rule's field
/// path. `Ok(true)`/`Ok(())` means pass; `Ok(false)` or `Err` means fail
/// (spec.md §9, ambiguity 2 — the checker return-value convention this
/// crate adopts).
pub trait Checker: Send + Sync + fmt::Debug {
    /// Returns `Ok(true)` on pass, `Ok(false)` on a plain fail, `Err` on a
    /// fail carrying detail for the rule's failure message.
    fn check(&self, value: &Document) -> std::result::Result<bool, String>;
}

impl<F> Checker for F
where
    F: Fn(&Document) -> bool + Send + Sync + fmt::Debug,
{
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(self(value))
    }
}

#[derive(Debug)]
pub struct Eq(pub CheckValue);
impl Checker for Eq {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(self.0.matches(value))
    }
}

#[derive(Debug)]
pub struct Neq(pub CheckValue);
impl Checker for Neq {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(!self.0.matches(value))
    }
}

#[derive(Debug)]
pub struct In(pub Vec<CheckValue>);
impl Checker for In {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(self.0.iter().any(|v| v.matches(value)))
    }
}

#[derive(Debug)]
pub struct NotIn(pub Vec<CheckValue>);
impl Checker for NotIn {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(!self.0.iter().any(|v| v.matches(value)))
    }
}

fn as_str(value: &Document) -> Option<&str> {
    match value {
        Document::Scalar(Scalar::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

#[derive(Debug)]
pub struct StrStartsWith(pub String);
impl Checker for StrStartsWith {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(as_str(value).is_some_and(|s| s.starts_with(&self.0)))
    }
}

#[derive(Debug)]
pub struct StrEndsWith(pub String);
impl Checker for StrEndsWith {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(as_str(value).is_some_and(|s| s.ends_with(&self.0)))
    }
}

#[derive(Debug)]
pub struct StrContains(pub String);
impl Checker for StrContains {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(as_str(value).is_some_and(|s| s.contains(&self.0)))
    }
}

/// `str_matches_regex`. Uses `fancy_regex` (the teacher's regex crate of
/// choice) so lookaround patterns from a rule file behave the same as the
/// Python `re` module's.
pub struct StrMatchesRegex(pub fancy_regex::Regex);
impl fmt::Debug for StrMatchesRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StrMatchesRegex").field(&self.0.as_str()).finish()
    }
}
impl Checker for StrMatchesRegex {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        let Some(s) = as_str(value) else {
            return Ok(false);
        };
        self.0
            .is_match(s)
            .map_err(|e| format!("regex execution failed: {e}"))
    }
}

/// The `Sized` (str/list/map) length probed by `length_eq`/`length_gt`/
/// `length_lt`, matching `isinstance(actual, Sized)` in the original source.
fn doc_len(value: &Document) -> Option<usize> {
    match value {
        Document::Scalar(Scalar::String(s)) => Some(s.chars().count()),
        Document::Seq(s) => Some(s.len()),
        Document::Map(m) => Some(m.len()),
        _ => None,
    }
}

#[derive(Debug)]
pub struct LengthEq(pub usize);
impl Checker for LengthEq {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(doc_len(value) == Some(self.0))
    }
}

#[derive(Debug)]
pub struct LengthGt(pub usize);
impl Checker for LengthGt {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(doc_len(value).is_some_and(|n| n > self.0))
    }
}

#[derive(Debug)]
pub struct LengthLt(pub usize);
impl Checker for LengthLt {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        Ok(doc_len(value).is_some_and(|n| n < self.0))
    }
}

/// Registry of host-provided, per-format checker functions resolved by
/// `func_name` — the Rust analogue of `RuleLoader.load_rule`'s dynamic
/// import. Opaque by design (spec.md §1 Non-goals: "SPDX/CycloneDX domain
/// predicates").
pub type CheckerRegistry = std::collections::HashMap<(String, String), Arc<dyn Checker>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        v.into()
    }

    #[test]
    fn eq_matches_field_not_present_sentinel() {
        let checker = Eq(CheckValue::FieldNotPresent);
        assert!(checker.check(&Document::Missing).unwrap());
        assert!(!checker.check(&doc(json!("x"))).unwrap());
    }

    #[test]
    fn in_checks_membership() {
        let checker = In(vec![
            CheckValue::Scalar(doc(json!("a"))),
            CheckValue::Scalar(doc(json!("b"))),
        ]);
        assert!(checker.check(&doc(json!("b"))).unwrap());
        assert!(!checker.check(&doc(json!("c"))).unwrap());
    }

    #[test]
    fn length_gt_only_applies_to_sized_values() {
        let checker = LengthGt(1);
        assert!(checker.check(&doc(json!([1, 2, 3]))).unwrap());
        assert!(!checker.check(&doc(json!(42))).unwrap());
    }
}

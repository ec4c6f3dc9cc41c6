//! [`Rule`] — binds a path, a [`Checker`], a failure message, and a minimum
//! match threshold; [`Rule::call`] invokes the evaluator and classifies the
//! outcome into a [`Result`] (spec.md §4.4).

use crate::checker::{
    CheckValue, Checker, CheckerRegistry, Eq as EqCheck, In, LengthEq, LengthGt, LengthLt,
    Neq, NotIn, StrContains, StrEndsWith, StrMatchesRegex, StrStartsWith,
};
use crate::config::{CheckerOperand, ImplementationConfig, OperandValue, RuleConfig, VariableConfig};
use crate::error::{
    EmptyCheckerSnafu, InvalidRegexSnafu, MissingOperandSnafu, PathSnafu, RuleSetError,
    UnknownOperationSnafu, UnresolvedFuncNameSnafu,
};
use crate::result::Result;
use sbomgrader_core::document::Document;
use sbomgrader_core::evaluate::Evaluator;
use sbomgrader_core::error::EvaluateError;
use sbomgrader_core::path::Path;
use sbomgrader_core::variable::{resolve, VariableDef, VariableScope};
use snafu::ResultExt;
use std::collections::HashMap;
use std::sync::Arc;

/// One compiled rule for a single format (spec.md §3 "Rule").
#[derive(Clone)]
pub struct Rule {
    pub name: String,
    pub(crate) checker: Arc<dyn Checker>,
    pub field_path: Path,
    pub failure_message: String,
    pub min_matches: usize,
    pub variables: Vec<VariableDef>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("field_path", &self.field_path)
            .field("min_matches", &self.min_matches)
            .finish_non_exhaustive()
    }
}

fn operand_to_check_value(v: &OperandValue) -> CheckValue {
    if v.is_field_not_present() {
        return CheckValue::FieldNotPresent;
    }
    let json = match v {
        OperandValue::String(s) => serde_json::Value::String(s.clone()),
        OperandValue::Number(n) => serde_json::Value::Number(n.clone()),
        OperandValue::Bool(b) => serde_json::Value::Bool(*b),
    };
    CheckValue::Scalar(json.into())
}

fn as_single_string(op: &CheckerOperand, rule: &str) -> std::result::Result<String, RuleSetError> {
    let list = op.as_list();
    let first = list.first().ok_or_else(|| {
        MissingOperandSnafu {
            rule: rule.to_string(),
        }
        .build()
    })?;
    match first {
        OperandValue::String(s) => Ok(s.clone()),
        OperandValue::Number(n) => Ok(n.to_string()),
        OperandValue::Bool(b) => Ok(b.to_string()),
    }
}

fn as_single_usize(op: &CheckerOperand, rule: &str) -> std::result::Result<usize, RuleSetError> {
    let list = op.as_list();
    let first = list.first().ok_or_else(|| {
        MissingOperandSnafu {
            rule: rule.to_string(),
        }
        .build()
    })?;
    let OperandValue::Number(n) = first else {
        return MissingOperandSnafu {
            rule: rule.to_string(),
        }
        .fail();
    };
    Ok(n.as_u64().unwrap_or_default() as usize)
}

/// Builds the `Arc<dyn Checker>` named by `op` against `operand`, per the
/// `operation_map` table in `original_source/rules/rule.py`.
pub(crate) fn build_checker(
    rule_name: &str,
    implementation: &str,
    op: &str,
    operand: &CheckerOperand,
    registry: &CheckerRegistry,
) -> std::result::Result<Arc<dyn Checker>, RuleSetError> {
    Ok(match op {
        "eq" => {
            let v = operand.as_list();
            let first = v.first().ok_or_else(|| {
                MissingOperandSnafu {
                    rule: rule_name.to_string(),
                }
                .build()
            })?;
            Arc::new(EqCheck(operand_to_check_value(first)))
        }
        "neq" => {
            let v = operand.as_list();
            let first = v.first().ok_or_else(|| {
                MissingOperandSnafu {
                    rule: rule_name.to_string(),
                }
                .build()
            })?;
            Arc::new(Neq(operand_to_check_value(first)))
        }
        "in" => Arc::new(In(operand.as_list().into_iter().map(operand_to_check_value).collect())),
        "not_in" => Arc::new(NotIn(
            operand.as_list().into_iter().map(operand_to_check_value).collect(),
        )),
        "str_startswith" => Arc::new(StrStartsWith(as_single_string(operand, rule_name)?)),
        "str_endswith" => Arc::new(StrEndsWith(as_single_string(operand, rule_name)?)),
        "str_contains" => Arc::new(StrContains(as_single_string(operand, rule_name)?)),
        "str_matches_regex" => {
            let pattern = as_single_string(operand, rule_name)?;
            let regex = fancy_regex::Regex::new(&pattern).context(InvalidRegexSnafu {
                rule: rule_name.to_string(),
                pattern: pattern.clone(),
            })?;
            Arc::new(StrMatchesRegex(regex))
        }
        "length_eq" => Arc::new(LengthEq(as_single_usize(operand, rule_name)?)),
        "length_gt" => Arc::new(LengthGt(as_single_usize(operand, rule_name)?)),
        "length_lt" => Arc::new(LengthLt(as_single_usize(operand, rule_name)?)),
        "func_name" => {
            let func_name = as_single_string(operand, rule_name)?;
            registry
                .get(&(implementation.to_string(), func_name.clone()))
                .cloned()
                .ok_or_else(|| {
                    UnresolvedFuncNameSnafu {
                        rule: rule_name.to_string(),
                        implementation: implementation.to_string(),
                        func_name,
                    }
                    .build()
                })?
        }
        other => {
            return UnknownOperationSnafu {
                op: other.to_string(),
                rule: rule_name.to_string(),
            }
            .fail()
        }
    })
}

impl Rule {
    pub(crate) fn from_config(
        rule: &RuleConfig,
        implementation: &ImplementationConfig,
        registry: &CheckerRegistry,
    ) -> std::result::Result<Self, RuleSetError> {
        let (op, operand) = implementation
            .checker
            .iter()
            .next()
            .ok_or_else(|| EmptyCheckerSnafu { rule: rule.name.clone() }.build())?;
        let checker = build_checker(&rule.name, &implementation.name, op, operand, registry)?;
        let field_path = sbomgrader_core::path::parse(
            implementation.field_path.as_deref().unwrap_or(""),
            None,
        )
        .context(PathSnafu {
            rule: rule.name.clone(),
        })?;
        let failure_message = implementation
            .failure_message
            .clone()
            .unwrap_or_else(|| rule.failure_message.clone());
        let variables = implementation
            .variables
            .iter()
            .map(|v: &VariableConfig| VariableDef::new(v.name.clone(), v.field_path.clone()))
            .collect();
        Ok(Rule {
            name: rule.name.clone(),
            checker,
            field_path,
            failure_message,
            min_matches: implementation.minimum_tested_elements,
            variables,
        })
    }

    /// Runs this rule against `doc`, classifying the outcome into a
    /// single-rule [`Result`] (spec.md §4.4 steps 1–3).
    #[tracing::instrument(level = "debug", skip(self, doc, fallback_vars), fields(rule = %self.name))]
    pub fn call(&self, doc: &Document, fallback_vars: &HashMap<String, Vec<Document>>) -> Result {
        let mut out = Result::new();
        out.ran.insert(self.name.clone());

        let scope = resolve(&self.variables, fallback_vars.clone(), |path, scope| {
            let ev = Evaluator::new(scope);
            ev.get_objects(doc, path).unwrap_or_default()
        });

        let outcome = self.run(doc, &scope);
        match outcome {
            Ok(()) => {
                tracing::debug!(outcome = "success");
            }
            Err(EvaluateError::FieldNotPresent { path_tried, .. }) => {
                out.ran.remove(&self.name);
                out.failed.insert(
                    self.name.clone(),
                    format!("{} Field not present: {path_tried}", self.failure_message),
                );
                tracing::debug!(outcome = "failed", reason = "field not present");
            }
            Err(EvaluateError::BelowMinimumMatches { min_matches, actual, .. }) => {
                out.ran.remove(&self.name);
                out.failed.insert(
                    self.name.clone(),
                    format!(
                        "{}\nDetail from runtime: no fields matched filter (need >= {min_matches}, got {actual})",
                        self.failure_message
                    ),
                );
                tracing::debug!(outcome = "failed", reason = "below minimum matches");
            }
            Err(err @ (EvaluateError::AssertionFailed { .. } | EvaluateError::AllFailed { .. })) => {
                out.ran.remove(&self.name);
                out.failed.insert(
                    self.name.clone(),
                    format!("{}\nDetail from runtime: {err}", self.failure_message),
                );
                tracing::debug!(outcome = "failed", reason = "assertion failed");
            }
            Err(err) => {
                out.ran.remove(&self.name);
                out.errors.insert(self.name.clone(), format!("{err:?} {err}"));
                tracing::debug!(outcome = "error");
            }
        }
        out
    }

    fn run(&self, doc: &Document, scope: &VariableScope) -> std::result::Result<(), EvaluateError> {
        let ev = Evaluator::new(scope);
        let checker = &self.checker;
        ev.run_func(doc, &self.field_path, Some(self.min_matches), |value| {
            match checker.check(value) {
                Ok(true) => Ok(()),
                Ok(false) => Err("check did not pass".to_string()),
                Err(detail) => Err(detail),
            }
        })
    }
}

#[cfg(test)]
mockall::mock! {
    pub DocChecker {}

    impl std::fmt::Debug for DocChecker {
        fn fmt<'a>(&self, f: &mut std::fmt::Formatter<'a>) -> std::fmt::Result;
    }

    impl Checker for DocChecker {
        fn check(&self, value: &Document) -> std::result::Result<bool, String>;
    }
}

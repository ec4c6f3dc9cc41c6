//! Renders a [`CookbookBundleResult`]/[`CookbookResult`] into the three
//! output shapes `original_source/sbomgrader/core/enums.py::OutputType`
//! names: markdown (visual), JSON, and YAML (spec.md §6 "Grade output").
//!
//! The terminal rendering of the final report — i.e. printing this string
//! somewhere — is a Non-goal; this module only produces the `String`.

use crate::bundle::CookbookBundleResult;
use crate::cookbook::{CookbookResult, RuleForce};
use crate::result::ResultType;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::Write as _;
use strum::IntoEnumIterator;

/// Which shape [`render_cookbook_result`]/[`render_bundle_result`] produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum OutputType {
    #[strum(serialize = "visual")]
    Visual,
    #[strum(serialize = "json")]
    Json,
    #[strum(serialize = "yaml")]
    Yaml,
}

#[derive(Debug, Serialize)]
struct RuleOutcome {
    #[serde(flatten)]
    detail: IndexMap<String, Option<String>>,
}

#[derive(Debug, Serialize)]
struct CookbookDict {
    cookbook_name: String,
    grade: String,
    #[serde(rename = "MUST")]
    must: IndexMap<String, RuleOutcome>,
    #[serde(rename = "SHOULD")]
    should: IndexMap<String, RuleOutcome>,
    #[serde(rename = "MAY")]
    may: IndexMap<String, RuleOutcome>,
}

fn tier_dict(cookbook_result: &CookbookResult, force: RuleForce) -> IndexMap<String, RuleOutcome> {
    cookbook_result
        .by_force(force)
        .into_iter()
        .map(|detail| {
            let mut m = IndexMap::new();
            m.insert(detail.result_type.to_string(), detail.result_detail.clone());
            (detail.rule_name, RuleOutcome { detail: m })
        })
        .collect()
}

#[cfg(feature = "yaml")]
fn to_yaml<T: Serialize>(value: &T) -> String {
    serde_yaml::to_string(value).unwrap_or_default()
}

#[cfg(not(feature = "yaml"))]
fn to_yaml<T: Serialize>(_value: &T) -> String {
    String::new()
}

fn to_cookbook_dict(cookbook_result: &CookbookResult) -> CookbookDict {
    CookbookDict {
        cookbook_name: cookbook_result.cookbook_name.clone(),
        grade: cookbook_result.grade().to_string(),
        must: tier_dict(cookbook_result, RuleForce::Must),
        should: tier_dict(cookbook_result, RuleForce::Should),
        may: tier_dict(cookbook_result, RuleForce::May),
    }
}

fn render_cookbook_markdown(cookbook_result: &CookbookResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Cookbook: {}", cookbook_result.cookbook_name);
    let _ = writeln!(out, "\n## Summary\n");
    let _ = writeln!(out, "Achieved grade: {}\n", cookbook_result.grade());
    for force in RuleForce::iter() {
        let details = cookbook_result.by_force(force);
        if details.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n### {force}:\n");
        for detail in &details {
            if detail.result_type == ResultType::NotPresent {
                continue;
            }
            let _ = writeln!(out, "- {} {}", detail.rule_name, detail.result_type.visual());
        }
    }
    let unsuccessful = cookbook_result.unsuccessful();
    if !unsuccessful.all_used_rule_names().is_empty() {
        let _ = writeln!(out, "\n## Failure details\n");
        for (rule, message) in unsuccessful
            .result
            .failed
            .iter()
            .chain(unsuccessful.result.errors.iter())
        {
            let _ = writeln!(out, "\n### {rule}\n\n{message}");
        }
    }
    out
}

/// Renders one cookbook's result in the requested shape.
#[must_use]
pub fn render_cookbook_result(cookbook_result: &CookbookResult, output: OutputType) -> String {
    match output {
        OutputType::Visual => render_cookbook_markdown(cookbook_result),
        OutputType::Json => {
            serde_json::to_string_pretty(&to_cookbook_dict(cookbook_result)).unwrap_or_default()
        }
        OutputType::Yaml => to_yaml(&to_cookbook_dict(cookbook_result)),
    }
}

#[derive(Debug, Serialize)]
struct BundleDict {
    grade: String,
    cookbook_results: Vec<CookbookDict>,
}

/// Renders a whole bundle's result (every member cookbook) in the
/// requested shape, mirroring `CookbookBundleResult.output` in the original
/// source.
#[must_use]
pub fn render_bundle_result(bundle_result: &CookbookBundleResult, output: OutputType) -> String {
    match output {
        OutputType::Visual => {
            let mut out = String::new();
            let _ = writeln!(out, "# Cookbook bundle result\n");
            let _ = writeln!(out, "**Grade: {}**\n", bundle_result.grade());
            let _ = writeln!(out, "## Used cookbooks\n");
            for cookbook_result in &bundle_result.cookbook_results {
                let _ = writeln!(out, "- {}", cookbook_result.cookbook_name);
            }
            out.push_str("\n---\n\n");
            let sections: Vec<String> = bundle_result
                .cookbook_results
                .iter()
                .map(|cr| render_cookbook_markdown(cr))
                .collect();
            out.push_str(&sections.join("\n---\n\n"));
            out
        }
        OutputType::Json => {
            let dict = BundleDict {
                grade: bundle_result.grade().to_string(),
                cookbook_results: bundle_result.cookbook_results.iter().map(to_cookbook_dict).collect(),
            };
            serde_json::to_string_pretty(&dict).unwrap_or_default()
        }
        OutputType::Yaml => {
            let dict = BundleDict {
                grade: bundle_result.grade().to_string(),
                cookbook_results: bundle_result.cookbook_results.iter().map(to_cookbook_dict).collect(),
            };
            to_yaml(&dict)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Result;
    use indexmap::IndexSet;

    fn sample() -> CookbookResult {
        let mut result = Result::new();
        result.ran.insert("r1".to_string());
        result.failed.insert("r2".to_string(), "oops".to_string());
        CookbookResult {
            result,
            cookbook_name: "demo".to_string(),
            must: IndexSet::from(["r1".to_string()]),
            should: IndexSet::from(["r2".to_string()]),
            may: IndexSet::new(),
        }
    }

    #[test]
    fn markdown_contains_grade_and_glyphs() {
        let text = render_cookbook_result(&sample(), OutputType::Visual);
        assert!(text.contains("Achieved grade"));
        assert!(text.contains('\u{2717}'));
    }

    #[test]
    fn json_round_trips_through_serde_value() {
        let text = render_cookbook_result(&sample(), OutputType::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["cookbook_name"], "demo");
    }
}

//! End-to-end scenario: parse a rule file and a cookbook file, grade a
//! document against the resulting cookbook, and check the derived grade —
//! the worked example from spec.md §8.

use sbomgrader_core::document::Document;
use sbomgrader_grade::checker::CheckerRegistry;
use sbomgrader_grade::config::{CookbookConfig, RuleFileConfig};
use sbomgrader_grade::cookbook::Cookbook;
use sbomgrader_grade::grade::Grade;
use sbomgrader_grade::ruleset::{Format, RuleSet};
use serde_json::json;
use std::collections::HashMap;

const RULE_FILE: &str = r"
rules:
  - name: has_version
    failureMessage: spdxVersion must be SPDX-2.3
    implementations:
      - name: spdx23
        fieldPath: spdxVersion
        checker:
          eq: SPDX-2.3
  - name: every_package_has_a_name
    failureMessage: every package must have a name
    implementations:
      - name: spdx23
        fieldPath: packages[&].name
        checker:
          func_name: non_empty
  - name: has_license_declared
    failureMessage: every package should declare a license
    implementations:
      - name: spdx23
        fieldPath: packages[&].licenseDeclared
        checker:
          neq: NOASSERTION
";

const COOKBOOK_FILE: &str = r"
name: basic
rulesets: [core]
MUST: [has_version, every_package_has_a_name]
SHOULD: [has_license_declared]
MAY: []
";

#[derive(Debug)]
struct NonEmpty;
impl sbomgrader_grade::Checker for NonEmpty {
    fn check(&self, value: &Document) -> std::result::Result<bool, String> {
        match value {
            Document::Scalar(sbomgrader_core::document::Scalar::String(s)) => Ok(!s.is_empty()),
            _ => Ok(false),
        }
    }
}

fn build_cookbook() -> Cookbook {
    let rule_file: RuleFileConfig = serde_yaml::from_str(RULE_FILE).unwrap();
    let mut registry = CheckerRegistry::new();
    registry.insert(
        ("spdx23".to_string(), "non_empty".to_string()),
        std::sync::Arc::new(NonEmpty),
    );
    let core_ruleset = RuleSet::from_config(&rule_file, &registry).unwrap();

    let cookbook_config: CookbookConfig = serde_yaml::from_str(COOKBOOK_FILE).unwrap();
    let mut rulesets_by_name = HashMap::new();
    rulesets_by_name.insert("core".to_string(), core_ruleset);
    Cookbook::from_config(&cookbook_config, &rulesets_by_name).unwrap()
}

#[test]
fn fully_compliant_document_grades_a() {
    let cookbook = build_cookbook();
    let doc: Document = json!({
        "spdxVersion": "SPDX-2.3",
        "packages": [
            {"name": "pkg-a", "licenseDeclared": "MIT"},
            {"name": "pkg-b", "licenseDeclared": "Apache-2.0"},
        ]
    })
    .into();

    let result = cookbook.call(&doc, &Format::from("spdx23"));
    assert_eq!(result.grade(), Grade::A);
}

#[test]
fn missing_must_rule_caps_grade_at_f() {
    let cookbook = build_cookbook();
    let doc: Document = json!({
        "spdxVersion": "SPDX-2.2",
        "packages": [{"name": "pkg-a", "licenseDeclared": "MIT"}]
    })
    .into();

    let result = cookbook.call(&doc, &Format::from("spdx23"));
    assert_eq!(result.grade(), Grade::F);
    assert!(result.result.is_unsuccessful("has_version"));
}

#[test]
fn should_rule_failure_lowers_one_step() {
    let cookbook = build_cookbook();
    let doc: Document = json!({
        "spdxVersion": "SPDX-2.3",
        "packages": [{"name": "pkg-a", "licenseDeclared": "NOASSERTION"}]
    })
    .into();

    let result = cookbook.call(&doc, &Format::from("spdx23"));
    assert_eq!(result.grade(), Grade::B);
}

#[test]
fn unknown_format_marks_all_rules_not_implemented() {
    let cookbook = build_cookbook();
    let doc: Document = json!({"spdxVersion": "SPDX-2.3"}).into();

    let result = cookbook.call(&doc, &Format::from("cdx16"));
    let detail = result.get("has_version");
    assert_eq!(
        detail.result_type,
        sbomgrader_grade::result::ResultType::NotImplemented
    );
}

//! Translation round-trip: a minimal SPDX 2.3 document describing one
//! component with one PURL converts to CycloneDX 1.6 and back, producing
//! the original fields — the worked scenario from spec.md §8.

use sbomgrader_core::document::Document;
use sbomgrader_translate::config::TranslationMapConfig;
use sbomgrader_translate::{HookRegistry, TemplateEngine, TranslationMap};
use serde_json::json;

const MAP_FILE: &str = r#"
first: spdx23
second: cdx16
chunks:
  - name: component
    firstFieldPath: packages[&]
    secondFieldPath: components[&]
    firstData: '{"name": "{{ name | unwrap }}", "externalRefs": [{"referenceType": "purl", "referenceLocator": "{{ purl | unwrap }}"}]}'
    secondData: '{"name": "{{ name | unwrap }}", "purl": "{{ purl | unwrap }}"}'
    firstVariables:
      - name: name
        fieldPath: "@.name"
      - name: purl
        fieldPath: "@.purl"
    secondVariables:
      - name: name
        fieldPath: "@.name"
      - name: purl
        fieldPath: "@.externalRefs[referenceType=purl].referenceLocator"
"#;

fn build_map() -> TranslationMap {
    let config: TranslationMapConfig = serde_yaml::from_str(MAP_FILE).unwrap();
    TranslationMap::from_config(&config).unwrap()
}

#[test]
fn spdx_to_cdx_round_trip_preserves_component_fields() {
    let map = build_map();
    let mut engine = TemplateEngine::new();
    let hooks = HookRegistry::new();

    let spdx_doc: Document = json!({
        "packages": [
            {
                "name": "widget",
                "externalRefs": [
                    {"referenceType": "purl", "referenceLocator": "pkg:generic/widget@1.0"}
                ]
            }
        ]
    })
    .into();

    let cdx_doc = map.convert(&spdx_doc, "spdx23", &hooks, &mut engine, None).unwrap();
    let cdx_value: serde_json::Value = cdx_doc.clone().into();
    assert_eq!(
        cdx_value,
        json!({"components": [{"name": "widget", "purl": "pkg:generic/widget@1.0"}]})
    );

    let round_tripped = map.convert(&cdx_doc, "cdx16", &hooks, &mut engine, None).unwrap();
    let round_tripped_value: serde_json::Value = round_tripped.into();
    let expected = json!({
        "packages": [
            {
                "name": "widget",
                "externalRefs": [
                    {"referenceType": "purl", "referenceLocator": "pkg:generic/widget@1.0"}
                ]
            }
        ]
    });

    // spec.md §8 "round-trips": `M.convert(M.convert(doc_A, B), A)` must
    // equal `doc_A`. A bare `assert_eq!` on a nested `Value` prints the
    // whole tree on failure; diff the pretty-printed forms instead so a
    // regression here points straight at the changed field.
    let expected_pretty = serde_json::to_string_pretty(&expected).unwrap();
    let actual_pretty = serde_json::to_string_pretty(&round_tripped_value).unwrap();
    let diff = similar::TextDiff::from_lines(&expected_pretty, &actual_pretty);
    assert!(
        diff.ratio() == 1.0,
        "round trip changed the document:\n{}",
        diff.unified_diff().context_radius(3).header("expected", "round_tripped")
    );
}

#[test]
fn preprocessing_hook_runs_before_chunk_conversion() {
    let mut config: TranslationMapConfig = serde_yaml::from_str(MAP_FILE).unwrap();
    config.first_preprocessing.push("inject_default_name".to_string());
    let map = TranslationMap::from_config(&config).unwrap();

    let mut engine = TemplateEngine::new();
    let mut hooks = HookRegistry::new();
    hooks.insert(
        "inject_default_name".to_string(),
        std::sync::Arc::new(|doc: Document| {
            let mut map = doc.as_map().cloned().unwrap_or_default();
            if let Some(Document::Seq(packages)) = map.get_mut("packages") {
                for package in packages.iter_mut() {
                    if let Some(pmap) = package.as_map_mut() {
                        pmap.entry("name".to_string()).or_insert_with(|| {
                            Document::Scalar(sbomgrader_core::document::Scalar::String("unnamed".to_string()))
                        });
                    }
                }
            }
            Ok(Document::Map(map))
        }),
    );

    let doc: Document = json!({"packages": [{"externalRefs": []}]}).into();
    let converted = map.convert(&doc, "spdx23", &hooks, &mut engine, None).unwrap();
    let value: serde_json::Value = converted.into();
    assert_eq!(value, json!({"components": [{"name": "unnamed", "purl": ""}]}));
}

//! `serde`-deserializable shape of the "Translation map file" format from
//! spec.md §6. Loading it from disk is a Non-goal; callers hand in an
//! already-decoded tree (typically parsed with `serde_yaml`/`serde_json`
//! straight into these structs).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    #[serde(rename = "fieldPath")]
    pub field_path: String,
}

/// One `chunks[]` entry (spec.md §6 "Translation map file").
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkConfig {
    pub name: String,
    #[serde(rename = "firstFieldPath", default)]
    pub first_field_path: Option<String>,
    #[serde(rename = "secondFieldPath", default)]
    pub second_field_path: Option<String>,
    #[serde(rename = "firstData")]
    pub first_data: String,
    #[serde(rename = "secondData")]
    pub second_data: String,
    #[serde(rename = "firstVariables", default)]
    pub first_variables: Vec<VariableConfig>,
    #[serde(rename = "secondVariables", default)]
    pub second_variables: Vec<VariableConfig>,
}

/// Top-level shape of a translation map file (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationMapConfig {
    pub first: String,
    pub second: String,
    #[serde(rename = "firstVariables", default)]
    pub first_variables: Vec<VariableConfig>,
    #[serde(rename = "secondVariables", default)]
    pub second_variables: Vec<VariableConfig>,
    pub chunks: Vec<ChunkConfig>,
    #[serde(rename = "firstPreprocessing", default)]
    pub first_preprocessing: Vec<String>,
    #[serde(rename = "secondPreprocessing", default)]
    pub second_preprocessing: Vec<String>,
    #[serde(rename = "firstPostprocessing", default)]
    pub first_postprocessing: Vec<String>,
    #[serde(rename = "secondPostprocessing", default)]
    pub second_postprocessing: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_translation_map() {
        let yaml = r#"
first: spdx23
second: cdx16
chunks:
  - name: main_component
    firstFieldPath: packages[0]
    secondFieldPath: metadata.component
    firstData: '{"name": "{{ name | unwrap }}"}'
    secondData: '{"name": "{{ name | unwrap }}"}'
    firstVariables:
      - name: name
        fieldPath: "@.name"
    secondVariables:
      - name: name
        fieldPath: "@.name"
firstPostprocessing: [set_spdx_format]
"#;
        let parsed: TranslationMapConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.chunks.len(), 1);
        assert_eq!(parsed.first_postprocessing, vec!["set_spdx_format".to_string()]);
    }
}

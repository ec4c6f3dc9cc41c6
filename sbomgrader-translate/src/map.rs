//! [`TranslationMap`] — two named formats, a list of [`Chunk`]s, and
//! optional per-side preprocess/postprocess hooks (spec.md §3
//! "TranslationMap", §4.6).

use crate::chunk::{Chunk, Side};
use crate::config::{ChunkConfig, TranslationMapConfig, VariableConfig};
use crate::error::{ConvertError, UnknownFormatSnafu};
use crate::hooks::{run_hooks, HookRegistry};
use crate::template::TemplateEngine;
use sbomgrader_core::document::Document;
use sbomgrader_core::path::Path;
use sbomgrader_core::variable::{resolve, VariableDef};
use sbomgrader_core::Evaluator;
use std::collections::HashMap;

fn parse_optional_path(raw: Option<&str>) -> Result<Option<Path>, ConvertError> {
    raw.map(|r| sbomgrader_core::path::parse(r, None).map_err(ConvertError::from))
        .transpose()
}

fn variable_defs(configs: &[VariableConfig]) -> Vec<VariableDef> {
    configs.iter().map(|c| VariableDef::new(c.name.clone(), c.field_path.clone())).collect()
}

impl Chunk {
    /// Builds a `Chunk` from one parsed `chunks[]` entry.
    pub fn from_config(config: &ChunkConfig) -> Result<Self, ConvertError> {
        Ok(Chunk {
            name: config.name.clone(),
            first_field_path: parse_optional_path(config.first_field_path.as_deref())?,
            second_field_path: parse_optional_path(config.second_field_path.as_deref())?,
            first_template: config.first_data.clone(),
            second_template: config.second_data.clone(),
            first_variables: variable_defs(&config.first_variables),
            second_variables: variable_defs(&config.second_variables),
        })
    }
}

/// Two named formats (`first`/`second`), their chunks, and the per-side
/// hook names that a host-supplied [`HookRegistry`] resolves at `convert`
/// time.
#[derive(Debug, Clone)]
pub struct TranslationMap {
    pub first: String,
    pub second: String,
    pub chunks: Vec<Chunk>,
    pub first_variables: Vec<VariableDef>,
    pub second_variables: Vec<VariableDef>,
    pub first_preprocessing: Vec<String>,
    pub second_preprocessing: Vec<String>,
    pub first_postprocessing: Vec<String>,
    pub second_postprocessing: Vec<String>,
}

impl TranslationMap {
    pub fn from_config(config: &TranslationMapConfig) -> Result<Self, ConvertError> {
        let chunks = config.chunks.iter().map(Chunk::from_config).collect::<Result<_, _>>()?;
        Ok(TranslationMap {
            first: config.first.clone(),
            second: config.second.clone(),
            chunks,
            first_variables: variable_defs(&config.first_variables),
            second_variables: variable_defs(&config.second_variables),
            first_preprocessing: config.first_preprocessing.clone(),
            second_preprocessing: config.second_preprocessing.clone(),
            first_postprocessing: config.first_postprocessing.clone(),
            second_postprocessing: config.second_postprocessing.clone(),
        })
    }

    fn side_of(&self, format: &str) -> Result<Side, ConvertError> {
        if format == self.first {
            Ok(Side::First)
        } else if format == self.second {
            Ok(Side::Second)
        } else {
            UnknownFormatSnafu { format: format.to_string() }.fail()
        }
    }

    fn preprocessing(&self, side: Side) -> &[String] {
        match side {
            Side::First => &self.first_preprocessing,
            Side::Second => &self.second_preprocessing,
        }
    }

    fn postprocessing(&self, side: Side) -> &[String] {
        match side {
            Side::First => &self.first_postprocessing,
            Side::Second => &self.second_postprocessing,
        }
    }

    fn global_variables(&self, side: Side) -> &[VariableDef] {
        match side {
            Side::First => &self.first_variables,
            Side::Second => &self.second_variables,
        }
    }

    /// Converts `doc` (known to be in format `from_format`) to the other
    /// format this map covers, per spec.md §4.6's four-step `convert`
    /// contract. `override_format` is applied as the reserved hook name
    /// `"set_format"` if the caller registered one — this crate never
    /// knows SPDX/CycloneDX field names itself (Non-goal).
    pub fn convert(
        &self,
        doc: &Document,
        from_format: &str,
        hooks: &HookRegistry,
        engine: &mut TemplateEngine,
        override_format: Option<&str>,
    ) -> Result<Document, ConvertError> {
        let source_side = self.side_of(from_format)?;
        let target_side = source_side.other();

        let preprocessed = run_hooks(self.preprocessing(source_side), hooks, doc.clone())?;

        let global_defs = self.global_variables(source_side);
        let global_scope: HashMap<String, Vec<Document>> = resolve(global_defs, HashMap::new(), |path, scope| {
            let ev = Evaluator::new(scope);
            ev.get_objects(&preprocessed, path).unwrap_or_default()
        })
        .into_resolved();

        let mut out = Document::map();
        for chunk in &self.chunks {
            chunk.convert_and_add(&preprocessed, &mut out, source_side, target_side, &global_scope, engine)?;
        }

        let mut out = run_hooks(self.postprocessing(target_side), hooks, out)?;

        if let Some(format) = override_format {
            if hooks.contains_key("set_format") {
                out = run_hooks(&["set_format".to_string()], hooks, out)?;
            } else {
                tracing::warn!(format, "no \"set_format\" hook registered; override_format ignored");
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Surfaces `convert`'s `tracing::warn!` (missing `set_format` hook) on
    /// `cargo test -- --nocapture`.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    fn sample_config() -> TranslationMapConfig {
        let yaml = r#"
first: spdx23
second: cdx16
chunks:
  - name: component
    firstFieldPath: packages[&]
    secondFieldPath: components[&]
    firstData: '{"name": "{{ name | unwrap }}"}'
    secondData: '{"id": "{{ name | unwrap }}"}'
    firstVariables:
      - name: name
        fieldPath: "@.id"
    secondVariables:
      - name: name
        fieldPath: "@.name"
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn converts_from_second_format_to_first() {
        let map = TranslationMap::from_config(&sample_config()).unwrap();
        let doc: Document = json!({"components": [{"id": "a"}]}).into();
        let mut engine = TemplateEngine::new();
        let out = map.convert(&doc, "cdx16", &HookRegistry::new(), &mut engine, None).unwrap();
        let value: serde_json::Value = out.into();
        assert_eq!(value, json!({"packages": [{"name": "a"}]}));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let map = TranslationMap::from_config(&sample_config()).unwrap();
        let doc: Document = json!({}).into();
        let mut engine = TemplateEngine::new();
        let err = map.convert(&doc, "unknown", &HookRegistry::new(), &mut engine, None);
        assert!(err.is_err());
    }

    #[test]
    fn override_format_without_a_hook_warns_and_no_ops() {
        init_tracing();
        let map = TranslationMap::from_config(&sample_config()).unwrap();
        let doc: Document = json!({"components": [{"id": "a"}]}).into();
        let mut engine = TemplateEngine::new();
        let out = map
            .convert(&doc, "cdx16", &HookRegistry::new(), &mut engine, Some("spdx23"))
            .unwrap();
        let value: serde_json::Value = out.into();
        assert_eq!(value, json!({"packages": [{"name": "a"}]}));
    }
}

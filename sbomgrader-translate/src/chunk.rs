//! [`Chunk`] — a correspondence between a source-side and target-side
//! region of a document, with per-side templates and variables (spec.md
//! §3 "Chunk (translation)", §4.6).

use crate::error::ConvertError;
use crate::template::TemplateEngine;
use sbomgrader_core::document::Document;
use sbomgrader_core::evaluate::Evaluator;
use sbomgrader_core::path::Path;
use sbomgrader_core::variable::{VariableDef, VariableScope};
use std::collections::HashMap;

/// Which side of a [`crate::map::TranslationMap`] a [`Chunk`] field belongs
/// to. Named `First`/`Second` (not source/target) because a single chunk is
/// read in both directions depending on which format the input document is
/// in (spec.md §4.6 "To convert a document from source to target").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl Side {
    #[must_use]
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

/// One chunk: per-side `(path, template, variables)` (spec.md §3).
#[derive(Debug, Clone)]
pub struct Chunk {
    pub name: String,
    pub first_field_path: Option<Path>,
    pub second_field_path: Option<Path>,
    pub first_template: String,
    pub second_template: String,
    pub first_variables: Vec<VariableDef>,
    pub second_variables: Vec<VariableDef>,
}

impl Chunk {
    #[must_use]
    pub fn field_path_for(&self, side: Side) -> Option<&Path> {
        match side {
            Side::First => self.first_field_path.as_ref(),
            Side::Second => self.second_field_path.as_ref(),
        }
    }

    #[must_use]
    pub fn template_for(&self, side: Side) -> &str {
        match side {
            Side::First => &self.first_template,
            Side::Second => &self.second_template,
        }
    }

    #[must_use]
    pub fn variables_for(&self, side: Side) -> &[VariableDef] {
        match side {
            Side::First => &self.first_variables,
            Side::Second => &self.second_variables,
        }
    }

    /// Resolves `variables_for(side)` relative to a single source occurrence
    /// at `base`, per spec.md §4.6 step 3 ("resolves *relative* variables
    /// against the base path"). Declared-order resolution (not
    /// dependency-sorted like [`sbomgrader_core::variable::resolve`]) since
    /// a relative definition's base changes per occurrence and can't be
    /// pre-parsed once the way absolute global variables are (see
    /// DESIGN.md).
    fn resolve_relative(
        defs: &[VariableDef],
        doc: &Document,
        base: &str,
        fallback: HashMap<String, Vec<Document>>,
    ) -> VariableScope {
        let mut scope = VariableScope::with_fallback(fallback);
        for def in defs {
            let path = match sbomgrader_core::path::parse(&def.raw_path, Some(base)) {
                Ok(p) => p,
                Err(err) => {
                    tracing::warn!(variable = %def.name, %err, "chunk variable path failed to parse");
                    continue;
                }
            };
            let evaluator = Evaluator::new(&scope);
            let values = evaluator.get_objects(doc, &path).unwrap_or_default();
            scope.insert(def.name.clone(), values);
        }
        scope
    }

    /// Converts this chunk's data from `source` to `target` and writes the
    /// result into `target_doc` (spec.md §4.6 steps 2-4).
    #[allow(clippy::too_many_arguments)]
    pub fn convert_and_add(
        &self,
        source_doc: &Document,
        target_doc: &mut Document,
        source: Side,
        target: Side,
        global_scope: &HashMap<String, Vec<Document>>,
        engine: &mut TemplateEngine,
    ) -> Result<(), ConvertError> {
        let root = Path::default();
        let source_path = self.field_path_for(source).unwrap_or(&root);
        let lookup_scope = VariableScope::with_fallback(global_scope.clone());
        let lookup = Evaluator::new(&lookup_scope);
        let base_paths = lookup.get_paths(source_doc, source_path)?;

        let target_path = self.field_path_for(target).unwrap_or(&root).clone();
        let target_vars = self.variables_for(target);
        let side_label = match target {
            Side::First => "first",
            Side::Second => "second",
        };

        for base in base_paths {
            let scope = Self::resolve_relative(target_vars, source_doc, &base, global_scope.clone());
            let render_scope = scope_as_map(&scope, target_vars, global_scope);
            let rendered = engine
                .render(
                    &format!("{}::{side_label}", self.name),
                    self.template_for(target),
                    &render_scope,
                )
                .map_err(|source| {
                    crate::error::TemplateRenderSnafu {
                        chunk: self.name.clone(),
                        side: side_label.to_string(),
                        source,
                    }
                    .build()
                })?;

            let rendered_doc = parse_rendered(&self.name, &rendered)?;
            let rendered_doc = prune_empty(rendered_doc);

            let insert_scope = VariableScope::default();
            let inserter = Evaluator::new(&insert_scope);
            inserter.insert_at_path(target_doc, &target_path, &rendered_doc)?;
        }
        Ok(())
    }
}

/// Flattens a [`VariableScope`] (locally resolved + fallback) into the plain
/// map the template engine renders against, so template authors see both
/// the chunk's own relative variables and the map-wide global ones.
fn scope_as_map(
    scope: &VariableScope,
    defs: &[VariableDef],
    global_scope: &HashMap<String, Vec<Document>>,
) -> HashMap<String, Vec<Document>> {
    let mut out = global_scope.clone();
    for def in defs {
        if let Some(values) = scope.get(&def.name) {
            out.insert(def.name.clone(), values.to_vec());
        }
    }
    out
}

/// Parses rendered template text back into a [`Document`], trying JSON
/// first and, with the `yaml` feature, falling back to YAML — spec.md §4.6
/// says only "the same structured decoder used on input", and since either
/// ecosystem's decoder is an accepted input format (§3.1), JSON is tried
/// first as the more common template-output shape.
fn parse_rendered(chunk: &str, rendered: &str) -> Result<Document, ConvertError> {
    match serde_json::from_str::<serde_json::Value>(rendered) {
        Ok(value) => Ok(value.into()),
        Err(json_err) => {
            #[cfg(feature = "yaml")]
            {
                if let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(rendered) {
                    return Ok(value.into());
                }
            }
            Err(crate::error::TemplateParseSnafu {
                chunk: chunk.to_string(),
                source: json_err,
            }
            .build())
        }
    }
}

/// Recursively drops `Missing`/`Null` map entries and empty maps/sequences,
/// per spec.md §4.6 step 3's "optionally prunes empty-valued nodes".
fn prune_empty(doc: Document) -> Document {
    match doc {
        Document::Map(m) => {
            let pruned: indexmap::IndexMap<String, Document> = m
                .into_iter()
                .map(|(k, v)| (k, prune_empty(v)))
                .filter(|(_, v)| !is_empty_node(v))
                .collect();
            Document::Map(pruned)
        }
        Document::Seq(s) => {
            let pruned: Vec<Document> = s.into_iter().map(prune_empty).filter(|v| !is_empty_node(v)).collect();
            Document::Seq(pruned)
        }
        other => other,
    }
}

fn is_empty_node(doc: &Document) -> bool {
    matches!(doc, Document::Missing)
        || matches!(doc, Document::Scalar(sbomgrader_core::document::Scalar::Null))
        || matches!(doc, Document::Map(m) if m.is_empty())
        || matches!(doc, Document::Seq(s) if s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk() -> Chunk {
        Chunk {
            name: "component".to_string(),
            first_field_path: Some(sbomgrader_core::path::parse("packages[&]", None).unwrap()),
            second_field_path: Some(sbomgrader_core::path::parse("components[&]", None).unwrap()),
            first_template: r#"{"name": "{{ name | unwrap }}"}"#.to_string(),
            second_template: r#"{"id": "{{ name | unwrap }}"}"#.to_string(),
            // A side's variables extract data from whichever document is
            // being read *from* (the other side), not from its own output
            // shape: rendering `first_template` reads a second-format
            // source (field `id`), and vice versa.
            first_variables: vec![VariableDef::new("name", "@.id")],
            second_variables: vec![VariableDef::new("name", "@.name")],
        }
    }

    #[test]
    fn converts_each_source_occurrence_into_a_target_element() {
        let chunk = chunk();
        let source: Document = json!({"components": [{"id": "a"}, {"id": "b"}]}).into();
        let mut target = Document::map();
        let mut engine = TemplateEngine::new();
        chunk
            .convert_and_add(&source, &mut target, Side::Second, Side::First, &HashMap::new(), &mut engine)
            .unwrap();
        let value: serde_json::Value = target.into();
        assert_eq!(value, json!({"packages": [{"name": "a"}, {"name": "b"}]}));
    }

    #[test]
    fn prune_empty_drops_null_and_empty_collections() {
        let doc: Document = json!({"a": null, "b": {}, "c": [], "d": "keep"}).into();
        let pruned = prune_empty(doc);
        let value: serde_json::Value = pruned.into();
        assert_eq!(value, json!({"d": "keep"}));
    }
}

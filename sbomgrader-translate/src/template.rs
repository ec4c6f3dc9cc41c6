//! Template rendering collaborator (spec.md §9 "Template rendering"):
//! a `tera::Tera` instance carrying the three convenience filters spec.md
//! names — `unwrap`, `slice(start, end)`, `fallback(*lists)` — over a
//! resolved variable scope (`name -> list<Document>`).

use sbomgrader_core::Document;
use std::collections::HashMap;
use tera::{to_value, Context, Filter, Tera, Value};

/// `unwrap` — take the first element of the piped list, or a caller-supplied
/// `default` if the list is empty.
#[derive(Debug)]
struct Unwrap;
impl Filter for Unwrap {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        match value.as_array().and_then(|a| a.first()) {
            Some(v) => Ok(v.clone()),
            None => Ok(args.get("default").cloned().unwrap_or(Value::Null)),
        }
    }
}

/// `slice(start, end)` — a sub-range of the piped list.
#[derive(Debug)]
struct Slice;
impl Filter for Slice {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let array = value
            .as_array()
            .ok_or_else(|| tera::Error::msg("slice filter requires an array"))?;
        let start = args.get("start").and_then(Value::as_u64).unwrap_or(0) as usize;
        let end = args
            .get("end")
            .and_then(Value::as_u64)
            .map(|e| e as usize)
            .unwrap_or(array.len());
        let end = end.min(array.len());
        let start = start.min(end);
        Ok(Value::Array(array[start..end].to_vec()))
    }
}

/// `fallback(others=[...])` — the first non-empty list among the piped value
/// and the lists supplied in `others`.
#[derive(Debug)]
struct Fallback;
impl Filter for Fallback {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let is_nonempty = |v: &Value| !matches!(v.as_array(), Some(a) if a.is_empty());
        if is_nonempty(value) {
            return Ok(value.clone());
        }
        if let Some(Value::Array(candidates)) = args.get("others") {
            for candidate in candidates {
                if is_nonempty(candidate) {
                    return Ok(candidate.clone());
                }
            }
        }
        Ok(value.clone())
    }
}

/// Builds a `tera::Context` from a resolved variable scope, exposing each
/// variable as the JSON array of its matched documents.
fn context_from_scope(scope: &HashMap<String, Vec<Document>>) -> tera::Result<Context> {
    let mut context = Context::new();
    for (name, docs) in scope {
        let values: Vec<serde_json::Value> = docs.iter().cloned().map(Into::into).collect();
        context.insert(name, &to_value(values)?);
    }
    Ok(context)
}

/// Owns one `tera::Tera` instance with the spec.md §9 filters registered,
/// and renders chunk templates against a resolved variable scope.
pub struct TemplateEngine {
    tera: Tera,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    #[must_use]
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.register_filter("unwrap", Unwrap);
        tera.register_filter("slice", Slice);
        tera.register_filter("fallback", Fallback);
        TemplateEngine { tera }
    }

    /// Renders `template_src` (registered under `template_name`, so repeated
    /// renders of the same chunk/side reuse Tera's parsed-template cache)
    /// against `scope`.
    pub fn render(
        &mut self,
        template_name: &str,
        template_src: &str,
        scope: &HashMap<String, Vec<Document>>,
    ) -> tera::Result<String> {
        if self.tera.get_template_names().all(|n| n != template_name) {
            self.tera.add_raw_template(template_name, template_src)?;
        }
        let context = context_from_scope(scope)?;
        self.tera.render(template_name, &context)
    }
}

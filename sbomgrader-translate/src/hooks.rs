//! Preprocessing/postprocessing hooks — host-provided functions looked up
//! by name (spec.md §9 "opaque to the core"). A hook consumes a [`Document`]
//! and returns its replacement, covering both the "mutate in place" and
//! "return a replacement" contracts spec.md §4.6 describes: a hook that
//! wants to mutate simply returns a modified clone.

use sbomgrader_core::Document;
use std::collections::HashMap;
use std::sync::Arc;

pub type Hook = Arc<dyn Fn(Document) -> std::result::Result<Document, crate::error::ConvertError> + Send + Sync>;

/// Name-keyed lookup table for hooks, handed in by the host application.
/// `TranslationMap` never constructs one itself (Non-goal: dynamic
/// hook loading from a Python-style module is out of scope).
pub type HookRegistry = HashMap<String, Hook>;

pub(crate) fn run_hooks(
    names: &[String],
    registry: &HookRegistry,
    mut doc: Document,
) -> std::result::Result<Document, crate::error::ConvertError> {
    for name in names {
        let hook = registry
            .get(name)
            .ok_or_else(|| crate::error::UnknownHookSnafu { name: name.clone() }.build())?;
        doc = hook(doc)?;
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hooks_run_in_order_and_thread_the_document() {
        let mut registry: HookRegistry = HashMap::new();
        registry.insert(
            "tag".to_string(),
            Arc::new(|doc: Document| {
                let mut map = doc.as_map().cloned().unwrap_or_default();
                let n = map.len();
                map.insert(format!("step_{n}"), Document::Scalar(sbomgrader_core::document::Scalar::Bool(true)));
                Ok(Document::Map(map))
            }),
        );
        let doc: Document = json!({}).into();
        let out = run_hooks(&["tag".to_string(), "tag".to_string()], &registry, doc).unwrap();
        assert!(out.has_field("step_0"));
        assert!(out.has_field("step_1"));
    }
}

//! Resolves named `${variable}` references against a document before
//! evaluation proper starts.
//!
//! A [`VariableDef`]'s own path expression may itself reference other
//! variables (`items[owner=${team}]`), so resolution has to happen in
//! dependency order. Unlike path syntax errors, a variable that can't be
//! resolved — because it has a cycle, or because a dependency it needs
//! failed first — is dropped from scope rather than surfaced to the
//! caller: grading continues with whatever scope resolved, and any query
//! elsewhere that references the dropped variable simply sees an empty
//! target set wherever it would have been used (see
//! [`crate::evaluate`]'s `comparison_matches`).

use crate::document::Document;
use crate::error::{CircularReferenceError, CycleSnafu, SelfReferenceSnafu};
use crate::path::{is_relative, parse_variable_ref, Path};
use fancy_regex::Regex;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static VAR_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("valid"));

/// Every `${name}` reference found anywhere inside `raw`, in first-seen order.
fn scan_refs(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for cap in VAR_REF.captures_iter(raw).flatten() {
        if let Some(m) = cap.get(1) {
            let name = m.as_str().to_string();
            if seen.insert(name.clone()) {
                out.push(name);
            }
        }
    }
    out
}

/// A named path expression, bound once and resolved into a set of matched
/// values before rule evaluation begins.
#[derive(Debug, Clone)]
pub struct VariableDef {
    pub name: String,
    pub raw_path: String,
}

impl VariableDef {
    #[must_use]
    pub fn new(name: impl Into<String>, raw_path: impl Into<String>) -> Self {
        VariableDef {
            name: name.into(),
            raw_path: raw_path.into(),
        }
    }

    #[must_use]
    pub fn is_relative(&self) -> bool {
        is_relative(&self.raw_path)
    }
}

/// The set of variables visible at a given point in evaluation: locally
/// resolved matches plus caller-supplied fallbacks (e.g. CLI bindings).
/// Lookups prefer locally resolved values; fallbacks fill in anything the
/// local pass didn't produce (spec.md §4.3 "fallback ⊕ resolved" union).
#[derive(Debug, Clone, Default)]
pub struct VariableScope {
    resolved: HashMap<String, Vec<Document>>,
    fallback: HashMap<String, Vec<Document>>,
}

impl VariableScope {
    #[must_use]
    pub fn with_fallback(fallback: HashMap<String, Vec<Document>>) -> Self {
        VariableScope {
            resolved: HashMap::new(),
            fallback,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Document]> {
        self.resolved
            .get(name)
            .or_else(|| self.fallback.get(name))
            .map(Vec::as_slice)
    }

    pub fn insert(&mut self, name: String, values: Vec<Document>) {
        self.resolved.insert(name, values);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolved.contains_key(name) || self.fallback.contains_key(name)
    }

    /// The locally resolved half of this scope, excluding `fallback`. Used
    /// by callers (e.g. `sbomgrader-grade`'s global-variable resolution)
    /// that need to hand a plain map on to a nested resolution pass.
    #[must_use]
    pub fn into_resolved(self) -> HashMap<String, Vec<Document>> {
        self.resolved
    }
}

/// Parses each definition's raw path once up front, returning them next to
/// their dependency set, so the resolver below never has to reparse.
struct PreparedVariable {
    def: VariableDef,
    path: Path,
    deps: Vec<String>,
}

fn prepare(defs: &[VariableDef]) -> Vec<PreparedVariable> {
    let known: HashSet<&str> = defs.iter().map(|d| d.name.as_str()).collect();
    defs.iter()
        .map(|def| {
            let deps = scan_refs(&def.raw_path)
                .into_iter()
                .filter(|d| known.contains(d.as_str()) && d != &def.name)
                .collect();
            let path = crate::path::parse(&def.raw_path, None).unwrap_or_else(|err| {
                tracing::warn!(variable = %def.name, %err, "variable path failed to parse");
                Path::default()
            });
            PreparedVariable {
                def: def.clone(),
                path,
                deps,
            }
        })
        .collect()
}

/// Detects every variable that is a member of a dependency cycle (including
/// a 1-cycle / self reference), via DFS over the dependency graph.
fn cyclic_members(prepared: &[PreparedVariable]) -> HashSet<String> {
    let graph: HashMap<&str, &[String]> = prepared
        .iter()
        .map(|p| (p.def.name.as_str(), p.deps.as_slice()))
        .collect();

    let mut cyclic = HashSet::new();
    for start in graph.keys() {
        let mut visiting = HashSet::new();
        let mut path_stack = Vec::new();
        fn dfs<'a>(
            node: &'a str,
            graph: &HashMap<&'a str, &'a [String]>,
            visiting: &mut HashSet<&'a str>,
            path_stack: &mut Vec<&'a str>,
            cyclic: &mut HashSet<String>,
        ) {
            if path_stack.contains(&node) {
                let start_idx = path_stack.iter().position(|n| *n == node).unwrap();
                for n in &path_stack[start_idx..] {
                    cyclic.insert((*n).to_string());
                }
                return;
            }
            if !visiting.insert(node) {
                return;
            }
            path_stack.push(node);
            if let Some(deps) = graph.get(node) {
                for dep in deps.iter() {
                    dfs(dep.as_str(), graph, visiting, path_stack, cyclic);
                }
            }
            path_stack.pop();
        }
        dfs(start, &graph, &mut visiting, &mut path_stack, &mut cyclic);
    }
    cyclic
}

/// Resolves every definition against `document`, in dependency order,
/// calling `resolve_one` to actually walk the document for a single
/// already-parsed path (kept as an injected closure so this module stays
/// decoupled from [`crate::evaluate`]).
///
/// Variables involved in a cycle, or whose dependency failed to resolve,
/// are dropped with a `tracing::warn!`/`tracing::error!` and simply absent
/// from the returned scope — never surfaced as an `Err` to the caller.
pub fn resolve<F>(
    defs: &[VariableDef],
    fallback: HashMap<String, Vec<Document>>,
    mut resolve_one: F,
) -> VariableScope
where
    F: FnMut(&Path, &VariableScope) -> Vec<Document>,
{
    let prepared = prepare(defs);
    let cyclic = cyclic_members(&prepared);

    for name in &cyclic {
        let err: CircularReferenceError = if prepared
            .iter()
            .find(|p| &p.def.name == name)
            .is_some_and(|p| p.deps.contains(name))
        {
            SelfReferenceSnafu { name: name.clone() }.build()
        } else {
            CycleSnafu { name: name.clone() }.build()
        };
        tracing::error!(variable = %name, error = %err, "dropping variable with circular dependency");
    }

    let mut order: Vec<&PreparedVariable> = prepared
        .iter()
        .filter(|p| !cyclic.contains(&p.def.name))
        .collect();
    order.sort_by(|a, b| a.deps.len().cmp(&b.deps.len()).then(a.def.name.cmp(&b.def.name)));

    let mut scope = VariableScope::with_fallback(fallback);
    let mut failed: HashSet<String> = HashSet::new();

    for var in order {
        if var.deps.iter().any(|d| failed.contains(d) || cyclic.contains(d)) {
            tracing::warn!(
                variable = %var.def.name,
                "dropping variable because a dependency failed to resolve"
            );
            failed.insert(var.def.name.clone());
            continue;
        }
        let values = resolve_one(&var.path, &scope);
        scope.insert(var.def.name.clone(), values);
    }

    scope
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Surfaces `resolve`'s `tracing::warn!`/`tracing::error!` events on
    /// `cargo test -- --nocapture` instead of silently dropping them.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    #[test]
    fn scans_all_refs_in_order_without_duplicates() {
        let refs = scan_refs("a[x=${foo}][y=${bar}][z=${foo}]");
        assert_eq!(refs, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn parse_variable_ref_requires_whole_string_match() {
        assert_eq!(parse_variable_ref("${x}"), Some("x".to_string()));
        assert_eq!(parse_variable_ref("a${x}b"), None);
    }

    #[test]
    fn resolves_in_dependency_order() {
        let defs = vec![
            VariableDef::new("b", "items[owner=${a}]"),
            VariableDef::new("a", "owners[&].name"),
        ];
        let mut seen_order = Vec::new();
        let scope = resolve(&defs, HashMap::new(), |_path, _scope| {
            seen_order.push(());
            Vec::new()
        });
        assert!(scope.contains("a"));
        assert!(scope.contains("b"));
    }

    #[test]
    fn drops_self_referencing_variable() {
        init_tracing();
        let defs = vec![VariableDef::new("a", "items[x=${a}]")];
        let scope = resolve(&defs, HashMap::new(), |_p, _s| Vec::new());
        assert!(!scope.contains("a"));
    }

    #[test]
    fn drops_mutual_cycle() {
        init_tracing();
        let defs = vec![
            VariableDef::new("a", "items[x=${b}]"),
            VariableDef::new("b", "items[x=${a}]"),
        ];
        let scope = resolve(&defs, HashMap::new(), |_p, _s| Vec::new());
        assert!(!scope.contains("a"));
        assert!(!scope.contains("b"));
    }

    #[test]
    fn dependency_of_dropped_variable_is_dropped_too() {
        let defs = vec![
            VariableDef::new("a", "items[x=${a}]"),
            VariableDef::new("b", "items[x=${a}]"),
        ];
        let scope = resolve(&defs, HashMap::new(), |_p, _s| Vec::new());
        assert!(!scope.contains("a"));
        assert!(!scope.contains("b"));
    }

    #[test]
    fn fallback_fills_in_missing_values() {
        let mut fallback = HashMap::new();
        fallback.insert("ext".to_string(), vec![Document::Scalar(crate::document::Scalar::Bool(true))]);
        let scope = VariableScope::with_fallback(fallback);
        assert!(scope.contains("ext"));
        assert_eq!(scope.get("ext").unwrap().len(), 1);
    }
}

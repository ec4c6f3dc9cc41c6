//! Walks a [`Document`] against a parsed [`Path`], applying query-block
//! filters and reporting failures through [`EvaluateError`].
//!
//! The walk is expressed with [`ControlFlow`] rather than early-return
//! exceptions: `Continue(())` means "this branch of the walk succeeded",
//! `Break(err)` means it failed. A strict (`Each`) query block stops at the
//! first `Break`; a tolerant (`Any`) block keeps trying every admitted
//! index and only turns into a `Break` once all of them have.

use crate::document::Document;
use crate::error::{
    AllFailedSnafu, AssertionFailedSnafu, BelowMinimumMatchesSnafu, EvaluateError,
    FieldNotPresentSnafu, IndexOutOfRangeSnafu, TypeMismatchSnafu,
};
use crate::path::{Operand, Path, Query, QueryOp, Step};
use crate::variable::VariableScope;
use std::collections::HashSet;
use std::ops::ControlFlow;

type Flow = ControlFlow<EvaluateError, ()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Tolerant,
}

/// Walks documents against parsed paths, resolving `${variable}` operands
/// against a [`VariableScope`] along the way.
pub struct Evaluator<'a> {
    scope: &'a VariableScope,
}

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(scope: &'a VariableScope) -> Self {
        Evaluator { scope }
    }

    /// Collects every [`Document`] matched by `path`.
    pub fn get_objects(&self, doc: &Document, path: &Path) -> Result<Vec<Document>, EvaluateError> {
        let mut matches = Vec::new();
        let flow = self.walk(doc, &path.steps, String::new(), &mut |d, _p| {
            matches.push(d.clone());
            ControlFlow::Continue(())
        });
        into_result(flow)?;
        Ok(matches)
    }

    /// Collects the textual path of every location matched by `path`.
    pub fn get_paths(&self, doc: &Document, path: &Path) -> Result<Vec<String>, EvaluateError> {
        let mut matches = Vec::new();
        let flow = self.walk(doc, &path.steps, String::new(), &mut |_d, p| {
            matches.push(p.to_string());
            ControlFlow::Continue(())
        });
        into_result(flow)?;
        Ok(matches)
    }

    /// Runs `checker` against every [`Document`] matched by `path`.
    ///
    /// `checker` returning `Ok(())` counts as a pass; `Err(detail)` counts
    /// as a failure for that one matched leaf (spec.md §9, checker return
    /// convention). When `min_matches` is `Some`, fewer admitted leaves than
    /// that is itself a failure, independent of whether each leaf passed.
    pub fn run_func<F>(
        &self,
        doc: &Document,
        path: &Path,
        min_matches: Option<usize>,
        mut checker: F,
    ) -> Result<(), EvaluateError>
    where
        F: FnMut(&Document) -> Result<(), String>,
    {
        let mut matched = 0usize;
        let flow = self.walk(doc, &path.steps, String::new(), &mut |d, p| {
            matched += 1;
            match checker(d) {
                Ok(()) => ControlFlow::Continue(()),
                Err(detail) => ControlFlow::Break(
                    AssertionFailedSnafu {
                        item_preview: d.preview(40, 40, 120),
                        path_tried: p.to_string(),
                        detail: format!(": {detail}"),
                    }
                    .build(),
                ),
            }
        });
        into_result(flow)?;
        if let Some(min) = min_matches {
            if matched < min {
                return BelowMinimumMatchesSnafu {
                    min_matches: min,
                    actual: matched,
                }
                .fail();
            }
        }
        Ok(())
    }

    /// Sets `value` at every location matched by `path`, creating missing
    /// intermediate maps/sequences along the way. Query blocks are
    /// supported only in their structural forms (`Each`/bare index) — a
    /// comparison filter can't identify where a *new* element belongs.
    pub fn insert_at_path(
        &self,
        doc: &mut Document,
        path: &Path,
        value: &Document,
    ) -> Result<(), EvaluateError> {
        self.insert(doc, &path.steps, String::new(), value)
    }

    fn walk(
        &self,
        doc: &Document,
        steps: &[Step],
        path_so_far: String,
        leaf: &mut dyn FnMut(&Document, &str) -> Flow,
    ) -> Flow {
        match steps {
            [] => leaf(doc, &path_so_far),
            [Step::Field(name), rest @ ..] => {
                let next = doc.get_field(name);
                if next.is_missing() {
                    return ControlFlow::Break(
                        FieldNotPresentSnafu {
                            path_tried: format!("{path_so_far}.{name}"),
                        }
                        .build(),
                    );
                }
                self.walk(&next, rest, format!("{path_so_far}.{name}"), leaf)
            }
            [Step::Optional, rest @ ..] => match rest {
                [Step::Field(name), after @ ..] => {
                    let next = doc.get_field(name);
                    if next.is_missing() {
                        ControlFlow::Continue(())
                    } else {
                        self.walk(&next, after, format!("{path_so_far}.{name}"), leaf)
                    }
                }
                _ => ControlFlow::Continue(()),
            },
            [Step::Index(i), rest @ ..] => match doc.as_seq() {
                Some(seq) => match seq.get(*i) {
                    Some(item) => self.walk(item, rest, format!("{path_so_far}[{i}]"), leaf),
                    None => ControlFlow::Break(
                        IndexOutOfRangeSnafu {
                            index: *i,
                            path_tried: path_so_far,
                        }
                        .build(),
                    ),
                },
                None => ControlFlow::Break(
                    TypeMismatchSnafu {
                        path_tried: path_so_far,
                        detail: "expected a sequence for index access".to_string(),
                    }
                    .build(),
                ),
            },
            [Step::Query(queries), rest @ ..] => {
                self.walk_query_block(doc, queries, rest, path_so_far, leaf)
            }
        }
    }

    fn walk_query_block(
        &self,
        doc: &Document,
        queries: &[Query],
        rest: &[Step],
        path_so_far: String,
        leaf: &mut dyn FnMut(&Document, &str) -> Flow,
    ) -> Flow {
        let (indices, mode) = match self.compute_admitted(doc, queries, &path_so_far) {
            Ok(v) => v,
            Err(e) => return ControlFlow::Break(e),
        };
        let seq = doc.as_seq().expect("compute_admitted already validated this is a sequence");

        match mode {
            Mode::Strict => {
                for i in indices {
                    let sub_path = format!("{path_so_far}[{i}]");
                    if let ControlFlow::Break(e) = self.walk(&seq[i], rest, sub_path, leaf) {
                        return ControlFlow::Break(e);
                    }
                }
                ControlFlow::Continue(())
            }
            Mode::Tolerant => {
                if indices.is_empty() {
                    return ControlFlow::Continue(());
                }
                let mut failures = Vec::new();
                let mut any_succeeded = false;
                for i in indices {
                    let sub_path = format!("{path_so_far}[{i}]");
                    match self.walk(&seq[i], rest, sub_path, leaf) {
                        ControlFlow::Continue(()) => any_succeeded = true,
                        ControlFlow::Break(e) => failures.push(e),
                    }
                }
                if any_succeeded {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(
                        AllFailedSnafu {
                            path_tried: path_so_far,
                            failures,
                        }
                        .build(),
                    )
                }
            }
        }
    }

    /// Resolves which indices of `doc` (a sequence) a query block admits,
    /// and whether the block is strict or tolerant.
    fn compute_admitted(
        &self,
        doc: &Document,
        queries: &[Query],
        path_so_far: &str,
    ) -> Result<(Vec<usize>, Mode), EvaluateError> {
        let seq = doc.as_seq().ok_or_else(|| {
            TypeMismatchSnafu {
                path_tried: path_so_far.to_string(),
                detail: "query block applied to a non-sequence".to_string(),
            }
            .build()
        })?;

        let mut admitted: Option<HashSet<usize>> = None;
        let mut mode = Mode::Strict;

        for query in queries {
            match query.op {
                QueryOp::Each => mode = Mode::Strict,
                QueryOp::Any => mode = Mode::Tolerant,
                QueryOp::Index => {
                    let set: HashSet<usize> = [query.index.expect("Index query carries an index")]
                        .into_iter()
                        .collect();
                    admitted = Some(intersect(admitted, set));
                }
                _ => {
                    let mut matched = HashSet::new();
                    for (idx, item) in seq.iter().enumerate() {
                        if self.comparison_matches(item, query)? {
                            matched.insert(idx);
                        }
                    }
                    admitted = Some(intersect(admitted, matched));
                }
            }
        }

        let mut indices: Vec<usize> = admitted
            .map(|s| s.into_iter().collect())
            .unwrap_or_else(|| (0..seq.len()).collect());
        // A literal `Index(i)` query isn't range-checked against `seq` when
        // its admitted set is built, since it doesn't probe the sequence at
        // all (unlike the comparison queries, which only ever admit indices
        // they've iterated). Drop any out-of-range survivor here so an
        // `Index` inside a query block silently skips an absent index
        // rather than panicking on `seq[i]` below (spec.md §4.2 point 3).
        indices.retain(|i| *i < seq.len());
        indices.sort_unstable();
        Ok((indices, mode))
    }

    fn comparison_matches(&self, item: &Document, query: &Query) -> Result<bool, EvaluateError> {
        let field_path = query
            .field_path
            .as_ref()
            .expect("comparison query always carries a field_path");
        let value_doc = if field_path.is_empty() {
            item.clone()
        } else {
            let mut found = None;
            let flow = self.walk(item, field_path, String::new(), &mut |d, _p| {
                found = Some(d.clone());
                ControlFlow::Continue(())
            });
            match (flow, found) {
                (ControlFlow::Continue(()), Some(d)) => d,
                _ => return Ok(false),
            }
        };
        let value = value_doc.to_string();

        let operand = query.operand.as_ref().expect("comparison query carries an operand");
        let targets: Vec<String> = match operand {
            Operand::Literal(l) => vec![l.clone()],
            Operand::Variable(name) => match self.scope.get(name) {
                Some(values) => values.iter().map(Document::to_string).collect(),
                // Dropped during resolution (cyclic, or depended on one
                // that was) — treat the set as empty rather than erroring,
                // so `Eq`/`Contains`/etc. never admit and `Neq`/
                // `NotContains`/etc. always do.
                None => Vec::new(),
            },
        };

        let any_match = targets.iter().any(|t| base_relation(query.op, &value, t));
        Ok(if is_negative(query.op) { !any_match } else { any_match })
    }

    fn insert(
        &self,
        doc: &mut Document,
        steps: &[Step],
        path_so_far: String,
        value: &Document,
    ) -> Result<(), EvaluateError> {
        match steps {
            [] => {
                // spec.md §4.6 insertion semantics: an empty path merges
                // `value`'s keys into the root mapping rather than
                // replacing it outright, when both sides are mappings.
                if let (Document::Map(existing), Document::Map(incoming)) = (&mut *doc, value) {
                    for (k, v) in incoming {
                        existing.insert(k.clone(), v.clone());
                    }
                } else {
                    *doc = value.clone();
                }
                Ok(())
            }
            [Step::Field(name), rest @ ..] => {
                if matches!(doc, Document::Missing) {
                    *doc = Document::map();
                }
                let map = doc.as_map_mut().ok_or_else(|| {
                    TypeMismatchSnafu {
                        path_tried: path_so_far.clone(),
                        detail: "expected a mapping for field insertion".to_string(),
                    }
                    .build()
                })?;
                let entry = map.entry(name.clone()).or_insert(Document::Missing);
                self.insert(entry, rest, format!("{path_so_far}.{name}"), value)
            }
            [Step::Optional, rest @ ..] => self.insert(doc, rest, path_so_far, value),
            [Step::Index(i), rest @ ..] => self.insert_at_index(doc, *i, rest, path_so_far, value),
            [Step::Query(queries), rest @ ..] => {
                self.insert_query_block(doc, queries, rest, path_so_far, value)
            }
        }
    }

    fn insert_at_index(
        &self,
        doc: &mut Document,
        i: usize,
        rest: &[Step],
        path_so_far: String,
        value: &Document,
    ) -> Result<(), EvaluateError> {
        if matches!(doc, Document::Missing) {
            *doc = Document::seq();
        }
        let seq = doc.as_seq_mut().ok_or_else(|| {
            TypeMismatchSnafu {
                path_tried: path_so_far.clone(),
                detail: "expected a sequence for index insertion".to_string(),
            }
            .build()
        })?;
        while seq.len() <= i {
            seq.push(Document::Missing);
        }
        self.insert(&mut seq[i], rest, format!("{path_so_far}[{i}]"), value)
    }

    fn insert_query_block(
        &self,
        doc: &mut Document,
        queries: &[Query],
        rest: &[Step],
        path_so_far: String,
        value: &Document,
    ) -> Result<(), EvaluateError> {
        if queries.len() == 1 && queries[0].op == QueryOp::Index {
            let i = queries[0].index.expect("Index query carries an index");
            return self.insert_at_index(doc, i, rest, path_so_far, value);
        }
        if rest.is_empty() {
            // A terminal query step names no existing element to descend
            // into, so it means "append here" (spec.md §4.6 insertion
            // semantics): extend by `value`'s elements if it's a sequence,
            // otherwise push it as one new element.
            if matches!(doc, Document::Missing) {
                *doc = Document::seq();
            }
            let seq = doc.as_seq_mut().ok_or_else(|| {
                TypeMismatchSnafu {
                    path_tried: path_so_far.clone(),
                    detail: "expected a sequence for query insertion".to_string(),
                }
                .build()
            })?;
            match value {
                Document::Seq(items) => seq.extend(items.iter().cloned()),
                other => seq.push(other.clone()),
            }
            return Ok(());
        }
        if queries.iter().any(|q| q.op == QueryOp::Each) {
            if matches!(doc, Document::Missing) {
                *doc = Document::seq();
            }
            let len = doc
                .as_seq()
                .ok_or_else(|| {
                    TypeMismatchSnafu {
                        path_tried: path_so_far.clone(),
                        detail: "expected a sequence for query insertion".to_string(),
                    }
                    .build()
                })?
                .len();
            for i in 0..len {
                let sub_path = format!("{path_so_far}[{i}]");
                let seq = doc.as_seq_mut().expect("validated above");
                self.insert(&mut seq[i], rest, sub_path, value)?;
            }
            return Ok(());
        }
        TypeMismatchSnafu {
            path_tried: path_so_far,
            detail: "insertion requires a concrete index or an `&` query block".to_string(),
        }
        .fail()
    }
}

fn intersect(current: Option<HashSet<usize>>, with: HashSet<usize>) -> HashSet<usize> {
    match current {
        Some(existing) => existing.intersection(&with).copied().collect(),
        None => with,
    }
}

fn base_relation(op: QueryOp, value: &str, target: &str) -> bool {
    match op {
        QueryOp::Eq | QueryOp::Neq => value == target,
        QueryOp::StartsWith => value.starts_with(target),
        QueryOp::EndsWith => value.ends_with(target),
        QueryOp::Contains | QueryOp::NotContains => value.contains(target),
        QueryOp::Each | QueryOp::Any | QueryOp::Index => false,
    }
}

fn is_negative(op: QueryOp) -> bool {
    matches!(op, QueryOp::Neq | QueryOp::NotContains)
}

fn into_result(flow: Flow) -> Result<(), EvaluateError> {
    match flow {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Scalar;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.into()
    }

    #[test]
    fn get_objects_returns_each_matched_leaf() {
        let d = doc(json!({"packages": [{"name": "a"}, {"name": "b"}]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("packages[&].name", None).unwrap();
        let ev = Evaluator::new(&scope);
        let out = ev.get_objects(&d, &path).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn comparison_filters_to_matching_index() {
        let d = doc(json!({"packages": [{"kind": "npm", "name": "a"}, {"kind": "pip", "name": "b"}]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("packages[kind=pip].name", None).unwrap();
        let ev = Evaluator::new(&scope);
        let out = ev.get_objects(&d, &path).unwrap();
        assert_eq!(out, vec![Document::Scalar(Scalar::String("b".to_string()))]);
    }

    #[test]
    fn any_block_passes_if_one_branch_passes() {
        let d = doc(json!({"packages": [{"name": "a"}, {"name": "b"}]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("packages[|].name", None).unwrap();
        let ev = Evaluator::new(&scope);
        let result = ev.run_func(&d, &path, None, |v| {
            if v.to_string() == "b" {
                Ok(())
            } else {
                Err("not b".to_string())
            }
        });
        assert!(result.is_ok());
    }

    #[test]
    fn each_block_fails_if_any_branch_fails() {
        let d = doc(json!({"packages": [{"name": "a"}, {"name": "b"}]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("packages[&].name", None).unwrap();
        let ev = Evaluator::new(&scope);
        let result = ev.run_func(&d, &path, None, |v| {
            if v.to_string() == "b" {
                Ok(())
            } else {
                Err("not b".to_string())
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn optional_field_absence_terminates_silently() {
        let d = doc(json!({"a": {}}));
        let scope = VariableScope::default();
        let path = crate::path::parse("a.?b.c", None).unwrap();
        let ev = Evaluator::new(&scope);
        assert_eq!(ev.get_objects(&d, &path).unwrap(), Vec::new());
    }

    #[test]
    fn variable_operand_resolves_membership() {
        let d = doc(json!({"packages": [{"kind": "npm"}, {"kind": "pip"}]}));
        let mut fallback = std::collections::HashMap::new();
        fallback.insert(
            "kinds".to_string(),
            vec![Document::Scalar(Scalar::String("pip".to_string()))],
        );
        let scope = VariableScope::with_fallback(fallback);
        let path = crate::path::parse("packages[kind=${kinds}].kind", None).unwrap();
        let ev = Evaluator::new(&scope);
        let out = ev.get_objects(&d, &path).unwrap();
        assert_eq!(out, vec![Document::Scalar(Scalar::String("pip".to_string()))]);
    }

    #[test]
    fn any_block_visits_every_admitted_index_not_just_the_first() {
        let d = doc(json!({"packages": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("packages[|].name", None).unwrap();
        let ev = Evaluator::new(&scope);
        let out = ev.get_objects(&d, &path).unwrap();
        assert_eq!(
            out,
            vec![
                Document::Scalar(Scalar::String("a".to_string())),
                Document::Scalar(Scalar::String("b".to_string())),
                Document::Scalar(Scalar::String("c".to_string())),
            ]
        );
    }

    #[test]
    fn any_block_min_matches_counts_every_admitted_index() {
        let d = doc(json!({"packages": [{"name": "a"}, {"name": "b"}]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("packages[|].name", None).unwrap();
        let ev = Evaluator::new(&scope);
        let result = ev.run_func(&d, &path, Some(2), |v| {
            if v.to_string() == "b" {
                Ok(())
            } else {
                Err("not b".to_string())
            }
        });
        assert!(result.is_ok());
    }

    #[test]
    fn comparison_against_a_variable_missing_from_scope_treats_it_as_an_empty_set() {
        let d = doc(json!({"packages": [{"kind": "npm"}, {"kind": "pip"}]}));
        let scope = VariableScope::default();
        let eq_path = crate::path::parse("packages[kind=${unresolved}]", None).unwrap();
        let ev = Evaluator::new(&scope);
        assert_eq!(ev.get_objects(&d, &eq_path).unwrap(), Vec::new());

        let neq_path = crate::path::parse("packages[kind!=${unresolved}].kind", None).unwrap();
        let out = ev.get_objects(&d, &neq_path).unwrap();
        assert_eq!(
            out,
            vec![
                Document::Scalar(Scalar::String("npm".to_string())),
                Document::Scalar(Scalar::String("pip".to_string())),
            ]
        );
    }

    #[test]
    fn insert_at_path_creates_missing_containers() {
        let mut d = Document::Missing;
        let scope = VariableScope::default();
        let path = crate::path::parse("a.b[0].c", None).unwrap();
        let ev = Evaluator::new(&scope);
        ev.insert_at_path(&mut d, &path, &Document::Scalar(Scalar::String("x".to_string())))
            .unwrap();
        let value: serde_json::Value = d.into();
        assert_eq!(value, json!({"a": {"b": [{"c": "x"}]}}));
    }

    #[test]
    fn insert_at_path_merges_keys_at_an_empty_path() {
        let mut d = doc(json!({"a": 1}));
        let scope = VariableScope::default();
        let path = Path::default();
        let ev = Evaluator::new(&scope);
        ev.insert_at_path(&mut d, &path, &doc(json!({"b": 2}))).unwrap();
        let value: serde_json::Value = d.into();
        assert_eq!(value, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn insert_at_path_appends_at_a_terminal_query_step() {
        let mut d = doc(json!({"packages": [{"name": "a"}]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("packages[&]", None).unwrap();
        let ev = Evaluator::new(&scope);
        ev.insert_at_path(&mut d, &path, &Document::Scalar(Scalar::String("b".to_string())))
            .unwrap();
        let value: serde_json::Value = d.into();
        assert_eq!(value, json!({"packages": [{"name": "a"}, "b"]}));
    }

    #[test]
    fn out_of_range_index_inside_a_query_block_is_silently_skipped() {
        let d = doc(json!({"items": [{"name": "a"}]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("items[5].name", None).unwrap();
        let ev = Evaluator::new(&scope);
        assert_eq!(ev.get_objects(&d, &path).unwrap(), Vec::new());
    }

    #[test]
    fn index_out_of_range_is_an_error_outside_a_query_block() {
        let d = doc(json!({"items": [1]}));
        let scope = VariableScope::default();
        let path = crate::path::parse("items[5]", None).unwrap();
        let ev = Evaluator::new(&scope);
        assert!(ev.get_objects(&d, &path).is_err());
    }
}

//! Logical errors that can occur while parsing paths, resolving variables,
//! and walking a [`Document`](crate::document::Document).

use snafu::{Backtrace, Snafu};

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                              PathSyntax                               ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// The path DSL failed to parse. Always raised at parse time, never while
/// walking a document.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PathSyntaxError {
    /// A query block (`[...]`) was empty.
    #[snafu(display("empty query block in path \"{raw}\""))]
    EmptyQueryBlock { raw: String, backtrace: Backtrace },

    /// Brackets were unbalanced.
    #[snafu(display("unbalanced brackets in path \"{raw}\""))]
    UnbalancedBrackets { raw: String, backtrace: Backtrace },

    /// An unrecognized query operator token was found.
    #[snafu(display("unrecognized query operator \"{op}\" in path \"{raw}\""))]
    UnknownOperator {
        op: String,
        raw: String,
        backtrace: Backtrace,
    },

    /// `?` appeared somewhere other than immediately before a field name.
    #[snafu(display("'?' must immediately precede a field name in path \"{raw}\""))]
    MisplacedOptional { raw: String, backtrace: Backtrace },

    /// A bare integer query (`[3]`) failed to parse as a non-negative index.
    #[snafu(display("invalid index \"{value}\" in path \"{raw}\""))]
    InvalidIndex {
        value: String,
        raw: String,
        backtrace: Backtrace,
    },

    /// `@`-relative path was used with no base path supplied.
    #[snafu(display("relative path \"{raw}\" used with no base path"))]
    MissingBase { raw: String, backtrace: Backtrace },
}

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                             EvaluateError                              ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// Raised while walking a [`Document`](crate::document::Document) against a
/// parsed path. This is the single error type the evaluator itself ever
/// produces; the rule engine (`sbomgrader-grade`) is the sole place that
/// classifies these into pass/fail/error outcomes, per the propagation
/// policy in the specification.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum EvaluateError {
    /// Descent hit [`Document::Missing`](crate::document::Document::Missing)
    /// with `accept_missing = false`.
    #[snafu(display("field not present: {path_tried}"))]
    FieldNotPresent {
        path_tried: String,
        backtrace: Backtrace,
    },

    /// A query was applied to something other than a sequence, or a field
    /// step was applied to something other than a mapping.
    #[snafu(display("type mismatch at {path_tried}: {detail}"))]
    TypeMismatch {
        path_tried: String,
        detail: String,
        backtrace: Backtrace,
    },

    /// A sequence index step was out of range (outside of a query block,
    /// where out-of-range indices are silently dropped instead).
    #[snafu(display("index {index} out of range at {path_tried}"))]
    IndexOutOfRange {
        index: usize,
        path_tried: String,
        backtrace: Backtrace,
    },

    /// The caller-supplied visitor returned `false` or raised, for a single
    /// matched leaf.
    #[snafu(display("check did not pass for item: {item_preview} at path: {path_tried}{detail}"))]
    AssertionFailed {
        item_preview: String,
        path_tried: String,
        detail: String,
        backtrace: Backtrace,
    },

    /// Every element admitted by a tolerant (`Any`) query block failed.
    #[snafu(display("check did not pass for any fields; path: {path_tried}"))]
    AllFailed {
        path_tried: String,
        failures: Vec<EvaluateError>,
        backtrace: Backtrace,
    },

    /// The resolved match count was below `min_matches`.
    #[snafu(display("no fields matched filter (need >= {min_matches}, got {actual})"))]
    BelowMinimumMatches {
        min_matches: usize,
        actual: usize,
        backtrace: Backtrace,
    },
}

impl EvaluateError {
    /// The textual path at which the failure occurred, if the variant
    /// tracks one (`BelowMinimumMatches` doesn't — it's a count, not a
    /// location).
    ///
    /// A query referencing a `${variable}` that was dropped during
    /// resolution (cyclic, or depending on one that was) is *not* an error
    /// here: it resolves against an empty target set, so equality-style
    /// operators simply never admit and inequality-style operators always
    /// do, per the resolver's "localized" recovery policy
    /// ([`crate::variable::resolve`]).
    #[must_use]
    pub fn path_tried(&self) -> Option<&str> {
        match self {
            EvaluateError::FieldNotPresent { path_tried, .. }
            | EvaluateError::TypeMismatch { path_tried, .. }
            | EvaluateError::IndexOutOfRange { path_tried, .. }
            | EvaluateError::AssertionFailed { path_tried, .. }
            | EvaluateError::AllFailed { path_tried, .. } => Some(path_tried),
            EvaluateError::BelowMinimumMatches { .. } => None,
        }
    }
}

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                          VariableResolveError                         ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// Raised by the dependency-ordering pass in [`crate::variable`]. Unlike
/// [`EvaluateError`], a `CircularReference` never reaches a caller directly:
/// the resolver catches it, drops the offending variable from scope, and
/// emits a `tracing::error!` event, per the specification's "localized"
/// recovery policy for variable resolution.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CircularReferenceError {
    #[snafu(display("self referencing variable \"{name}\""))]
    SelfReference { name: String, backtrace: Backtrace },

    #[snafu(display("circular variable reference found for variable \"{name}\""))]
    Cycle { name: String, backtrace: Backtrace },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_tried_extracts_from_known_variants() {
        let err = FieldNotPresentSnafu {
            path_tried: ".foo".to_string(),
        }
        .build();
        assert_eq!(err.path_tried(), Some(".foo"));
    }
}

//! Document model, path DSL, and field-path evaluator shared by the
//! grading and translation engines built on top of this crate.
//!
//! Three things live here, bottom-up:
//!
//! - [`document`] — a decoder-agnostic tree ([`document::Document`]) that
//!   JSON and (optionally) YAML documents both convert into.
//! - [`path`] — the path DSL: parsing (`path.with[a].query[block]`) into
//!   an immutable [`path::Path`] AST.
//! - [`variable`] and [`evaluate`] — resolving `${name}` references and
//!   walking a `Document` against a `Path`.
//!
//! Everything here is synchronous; there is no schema-compilation graph to
//! build or cache, only a single tree and a single pass over it.

pub mod document;
pub mod error;
pub mod evaluate;
pub mod path;
pub mod variable;

pub use document::{Document, Scalar};
pub use error::{CircularReferenceError, EvaluateError, PathSyntaxError};
pub use evaluate::Evaluator;
pub use path::Path;
pub use variable::{VariableDef, VariableScope};

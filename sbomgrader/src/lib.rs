//! SBOM grading and translation, built from three layered crates:
//!
//! - [`sbomgrader_core`] — the `Document` tree, the path DSL's parser, the
//!   [`Evaluator`], and variable resolution. No knowledge of rules or
//!   translation; everything else in this workspace is built on it.
//! - [`sbomgrader_grade`] — rules, rulesets, cookbooks, and the report
//!   renderer that turns a graded document into a [`Grade`].
//! - [`sbomgrader_translate`] — chunk-based conversion between two SBOM
//!   formats via a [`TranslationMap`], templated with `tera`.
//!
//! This crate re-exports all three so a host application depends on one
//! crate rather than three. Each submodule is a re-export of the
//! corresponding crate's top level; reach into `sbomgrader::core`,
//! `sbomgrader::grade`, or `sbomgrader::translate` for the full module
//! trees, or use the flattened re-exports below for the common types.

pub use sbomgrader_core as core;
pub use sbomgrader_grade as grade;
pub use sbomgrader_translate as translate;

pub use sbomgrader_core::{Document, Evaluator, Path, Scalar, VariableDef, VariableScope};

pub use sbomgrader_grade::{
    Checker, CheckerRegistry, Cookbook, CookbookBundle, CookbookBundleResult, CookbookResult,
    Format, Grade, Result as GradeResult, ResultDetail, ResultType, Rule, RuleForce, RuleSet,
};

pub use sbomgrader_translate::{Chunk, ConvertError, Hook, HookRegistry, Side, TemplateEngine, TranslationMap};

//! Errors surfaced while converting a document with a
//! [`crate::map::TranslationMap`]. Wraps [`sbomgrader_core`] errors
//! transparently rather than re-deriving them, per SPEC_FULL.md §7.

use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConvertError {
    #[snafu(transparent)]
    Path { source: sbomgrader_core::PathSyntaxError },

    #[snafu(transparent)]
    Evaluate { source: sbomgrader_core::EvaluateError },

    #[snafu(display("chunk \"{chunk}\" failed to render its {side} template: {source}"))]
    TemplateRender {
        chunk: String,
        side: String,
        source: tera::Error,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "chunk \"{chunk}\" rendered output could not be parsed back into a document: {source}"
    ))]
    TemplateParse {
        chunk: String,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("translation map does not cover format \"{format}\""))]
    UnknownFormat { format: String, backtrace: Backtrace },

    #[snafu(display("hook \"{name}\" has no entry in the supplied hook registry"))]
    UnknownHook { name: String, backtrace: Backtrace },
}

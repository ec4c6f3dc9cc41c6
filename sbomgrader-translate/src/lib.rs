//! Chunk-based document translation engine built on [`sbomgrader_core`].
//!
//! A [`map::TranslationMap`] owns a set of [`chunk::Chunk`]s, each pairing a
//! source-side and target-side `(path, template, variables)`. Converting a
//! document enumerates source occurrences with the evaluator, renders each
//! occurrence's target template with [`template::TemplateEngine`], and
//! writes the result back with the evaluator's insertion semantics.
//! Preprocessing/postprocessing is delegated to host-provided
//! [`hooks::Hook`]s looked up by name.

pub mod chunk;
pub mod config;
pub mod error;
pub mod hooks;
pub mod map;
pub mod template;

pub use chunk::{Chunk, Side};
pub use error::ConvertError;
pub use hooks::{Hook, HookRegistry};
pub use map::TranslationMap;
pub use template::TemplateEngine;

//! Rule, ruleset, and cookbook grading engine built on
//! [`sbomgrader_core`].
//!
//! Bottom-up: a [`checker::Checker`] is the compiled form of a rule file's
//! `{op: value}` mapping; a [`rule::Rule`] binds one to a path and a
//! failure message; a [`ruleset::RuleSet`] owns many rules across formats;
//! a [`cookbook::Cookbook`] projects a ruleset's rule names into
//! MUST/SHOULD/MAY tiers and derives a [`grade::Grade`]; a
//! [`bundle::CookbookBundle`] composes cookbooks into one overall grade.
//! [`report`] renders any of the above into markdown/JSON/YAML.

pub mod bundle;
pub mod checker;
pub mod config;
pub mod cookbook;
pub mod error;
pub mod grade;
pub mod report;
pub mod result;
pub mod rule;
pub mod ruleset;

pub use bundle::{CookbookBundle, CookbookBundleResult};
pub use checker::{Checker, CheckerRegistry};
pub use cookbook::{Cookbook, CookbookResult, RuleForce};
pub use error::RuleSetError;
pub use grade::Grade;
pub use result::{Result, ResultDetail, ResultType};
pub use rule::Rule;
pub use ruleset::{Format, RuleSet};

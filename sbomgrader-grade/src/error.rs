//! Errors surfaced while loading or combining rulesets. Per-rule failures
//! during grading are not represented as errors here — they become part of
//! a [`crate::result::Result`], never an `Err` (see `Rule::call`).

use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuleSetError {
    #[snafu(display("path syntax error loading rule \"{rule}\": {source}"))]
    Path {
        rule: String,
        source: sbomgrader_core::PathSyntaxError,
        backtrace: Backtrace,
    },

    #[snafu(display("unknown checker operation \"{op}\" for rule \"{rule}\""))]
    UnknownOperation {
        op: String,
        rule: String,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "rule \"{rule}\" implementation \"{implementation}\" uses func_name \"{func_name}\" \
         which has no entry in the supplied checker registry"
    ))]
    UnresolvedFuncName {
        rule: String,
        implementation: String,
        func_name: String,
        backtrace: Backtrace,
    },

    #[snafu(display("checker for rule \"{rule}\" carries no operand"))]
    MissingOperand { rule: String, backtrace: Backtrace },

    #[snafu(display(
        "checker for rule \"{rule}\" declares no operation (empty `checker` mapping)"
    ))]
    EmptyChecker { rule: String, backtrace: Backtrace },

    #[snafu(display("invalid regex \"{pattern}\" for rule \"{rule}\": {source}"))]
    InvalidRegex {
        rule: String,
        pattern: String,
        source: fancy_regex::Error,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "cookbook \"{cookbook}\" references ruleset \"{ruleset}\" which was not supplied"
    ))]
    UnknownRuleset {
        cookbook: String,
        ruleset: String,
        backtrace: Backtrace,
    },
}

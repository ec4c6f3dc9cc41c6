//! The parsed shape of a path DSL expression. See [`crate::path::parser`]
//! for the tokenizer/parser that produces these types.

use either::Either;
use std::fmt;

/// One step of a parsed [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Descend into a mapping key.
    Field(String),
    /// Marks the following `Field` step as optional: absence terminates the
    /// walk silently instead of yielding [`crate::document::Document::Missing`].
    Optional,
    /// Select one element of a sequence by literal index.
    Index(usize),
    /// A query block (`[...]`) applied to a sequence.
    Query(Vec<Query>),
}

/// The operator of a single query inside a query block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum QueryOp {
    /// `&` — select every index; all inner walks must succeed.
    #[strum(to_string = "&")]
    Each,
    /// `|` — select every index; succeeds if at least one inner walk does.
    #[strum(to_string = "|")]
    Any,
    /// A bare integer — select exactly that index.
    #[strum(to_string = "#")]
    Index,
    /// `=`
    #[strum(to_string = "=")]
    Eq,
    /// `!=`
    #[strum(to_string = "!=")]
    Neq,
    /// `%=`
    #[strum(to_string = "%=")]
    StartsWith,
    /// `=%`
    #[strum(to_string = "=%")]
    EndsWith,
    /// `~=` narrows to `Contains` (see DESIGN.md, Open Question 1).
    #[strum(to_string = "~=")]
    Contains,
    /// `!~=` narrows to `NotContains` (see DESIGN.md, Open Question 1).
    #[strum(to_string = "!~=")]
    NotContains,
}

/// The right-hand operand of a comparison query: either a literal string or
/// a reference to a variable, which expands the comparison into a
/// set-membership test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Literal(String),
    Variable(String),
}

impl Operand {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = parse_variable_ref(raw) {
            Operand::Variable(name)
        } else {
            Operand::Literal(raw.to_string())
        }
    }

    #[must_use]
    pub fn as_either(&self) -> Either<&str, &str> {
        match self {
            Operand::Literal(s) => Either::Left(s),
            Operand::Variable(s) => Either::Right(s),
        }
    }
}

/// Recognizes `${name}` and returns `name`.
#[must_use]
pub fn parse_variable_ref(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let inner = raw.strip_prefix("${")?.strip_suffix('}')?;
    if inner.is_empty() || !inner.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(inner.to_string())
}

/// A single filter inside a query block (`[...]`). Multiple queries in one
/// block are joined by intersection (spec.md §4.1 "Tie-breaks").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub op: QueryOp,
    /// `None` for `Each`/`Any`/`Index`.
    pub field_path: Option<Vec<Step>>,
    /// The literal index for `QueryOp::Index`.
    pub index: Option<usize>,
    /// `None` for `Each`/`Any`/`Index`.
    pub operand: Option<Operand>,
}

impl Query {
    #[must_use]
    pub fn each() -> Self {
        Query {
            op: QueryOp::Each,
            field_path: None,
            index: None,
            operand: None,
        }
    }

    #[must_use]
    pub fn any() -> Self {
        Query {
            op: QueryOp::Any,
            field_path: None,
            index: None,
            operand: None,
        }
    }

    #[must_use]
    pub fn index(i: usize) -> Self {
        Query {
            op: QueryOp::Index,
            field_path: None,
            index: Some(i),
            operand: None,
        }
    }

    #[must_use]
    pub fn comparison(op: QueryOp, field_path: Vec<Step>, operand: Operand) -> Self {
        Query {
            op,
            field_path: Some(field_path),
            index: None,
            operand: Some(operand),
        }
    }

    /// `true` if this query, alone in a block, makes the block "tolerant"
    /// (spec.md §4.2.5).
    #[must_use]
    pub fn is_tolerant(&self) -> bool {
        self.op == QueryOp::Any
    }

    #[must_use]
    pub fn admits_all(&self) -> bool {
        matches!(self.op, QueryOp::Each | QueryOp::Any)
    }
}

/// A fully parsed path expression: an ordered sequence of [`Step`]s.
///
/// Immutable after parsing (spec.md §3 Lifecycle). Cheaply `Clone`-able and
/// usable as a cache key (`Eq + Hash`) for the optional memoizing parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    pub steps: Vec<Step>,
}

impl Path {
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Path { steps }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                Step::Field(name) => write!(f, ".{name}")?,
                Step::Optional => write!(f, ".?")?,
                Step::Index(i) => write!(f, "[{i}]")?,
                Step::Query(_) => write!(f, "[...]")?,
            }
        }
        Ok(())
    }
}

//! Tokenizer and parser for the path DSL described in spec §4.1.
//!
//! The tokenizer tracks bracket depth the same way the reference
//! implementation's `PathParser`/`QueryParser` pair did: a `.` or `[`/`]`
//! outside of a bracket is structural, everything else accumulates into a
//! buffer that is flushed into a [`Segment`] whenever a structural
//! character is hit.

use super::ast::{Operand, Path, Query, QueryOp, Step};
use crate::error::{
    EmptyQueryBlockSnafu, InvalidIndexSnafu, MisplacedOptionalSnafu, MissingBaseSnafu,
    PathSyntaxError, UnbalancedBracketsSnafu, UnknownOperatorSnafu,
};
use snafu::ensure;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    QueryRaw(String),
}

/// Splits `raw` into top-level dot/bracket-delimited segments.
fn tokenize_segments(raw: &str) -> Result<Vec<Segment>, PathSyntaxError> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut depth: i32 = 0;
    let mut next_is_query = false;

    let mut flush = |buffer: &mut String, next_is_query: &mut bool, upcoming: bool| {
        let seg = if *next_is_query {
            Segment::QueryRaw(std::mem::take(buffer))
        } else {
            Segment::Field(std::mem::take(buffer).trim().to_string())
        };
        *next_is_query = upcoming;
        seg
    };

    for ch in raw.chars() {
        match ch {
            '[' => {
                if depth == 0 {
                    if !buffer.is_empty() {
                        segments.push(flush(&mut buffer, &mut next_is_query, true));
                    } else {
                        next_is_query = true;
                    }
                } else {
                    buffer.push(ch);
                }
                depth += 1;
            }
            ']' => {
                depth -= 1;
                ensure!(depth >= 0, UnbalancedBracketsSnafu { raw });
                if depth == 0 {
                    segments.push(flush(&mut buffer, &mut next_is_query, false));
                } else {
                    buffer.push(ch);
                }
            }
            '.' => {
                if depth == 0 {
                    if !buffer.is_empty() {
                        segments.push(flush(&mut buffer, &mut next_is_query, false));
                    }
                } else {
                    buffer.push(ch);
                }
            }
            _ => buffer.push(ch),
        }
    }
    ensure!(depth == 0, UnbalancedBracketsSnafu { raw });
    if !buffer.is_empty() {
        segments.push(flush(&mut buffer, &mut next_is_query, false));
    }
    Ok(segments)
}

/// Converts tokenized [`Segment`]s into [`Step`]s, expanding `?`-prefixed
/// field segments into `Optional, Field(..)` pairs.
fn segments_to_steps(segments: Vec<Segment>, raw: &str) -> Result<Vec<Step>, PathSyntaxError> {
    let mut steps = Vec::new();
    for seg in segments {
        match seg {
            Segment::Field(name) => {
                if let Some(rest) = name.strip_prefix('?') {
                    ensure!(
                        !rest.is_empty(),
                        MisplacedOptionalSnafu { raw: raw.to_string() }
                    );
                    steps.push(Step::Optional);
                    steps.push(Step::Field(rest.to_string()));
                } else {
                    steps.push(Step::Field(name));
                }
            }
            Segment::QueryRaw(raw_query) => {
                let queries = parse_query_block(&raw_query, raw)?;
                steps.push(Step::Query(queries));
            }
        }
    }
    Ok(steps)
}

const OPERATOR_CHARS: &[char] = &['!', '=', '%', '|', '&', '~'];

fn parse_query_block(raw_query: &str, full_raw: &str) -> Result<Vec<Query>, PathSyntaxError> {
    ensure!(
        !raw_query.trim().is_empty(),
        EmptyQueryBlockSnafu {
            raw: full_raw.to_string()
        }
    );

    let mut queries = Vec::new();
    let mut field_buffer = String::new();
    let mut op_buffer = String::new();
    let mut value_buffer = String::new();
    let mut depth: i32 = 0;
    let mut after_operation = false;

    let mut finalize =
        |field_buffer: &mut String, op_buffer: &mut String, value_buffer: &mut String| {
            let query = build_query(
                op_buffer.trim(),
                field_buffer.trim(),
                value_buffer.trim(),
                full_raw,
            );
            field_buffer.clear();
            op_buffer.clear();
            value_buffer.clear();
            query
        };

    for ch in raw_query.chars() {
        if ch.is_whitespace() && !after_operation {
            continue;
        }
        if OPERATOR_CHARS.contains(&ch) && depth == 0 {
            op_buffer.push(ch);
            after_operation = true;
        } else if after_operation && ch != ',' {
            value_buffer.push(ch);
        } else if ch == ',' && after_operation {
            queries.push(finalize(&mut field_buffer, &mut op_buffer, &mut value_buffer)?);
            after_operation = false;
        } else if ch == '[' {
            field_buffer.push(ch);
            depth += 1;
        } else if ch == ']' {
            depth -= 1;
            field_buffer.push(ch);
        } else {
            field_buffer.push(ch);
        }
    }
    if !field_buffer.is_empty() || !op_buffer.is_empty() || !value_buffer.is_empty() {
        queries.push(finalize(&mut field_buffer, &mut op_buffer, &mut value_buffer)?);
    }
    Ok(queries)
}

fn build_query(op: &str, field: &str, value: &str, full_raw: &str) -> Result<Query, PathSyntaxError> {
    if op.is_empty() {
        let index: usize = field
            .parse()
            .map_err(|_| InvalidIndexSnafu {
                value: field.to_string(),
                raw: full_raw.to_string(),
            }.build())?;
        return Ok(Query::index(index));
    }
    let query_op = match op {
        "&" => QueryOp::Each,
        "|" => QueryOp::Any,
        "=" => QueryOp::Eq,
        "!=" => QueryOp::Neq,
        "%=" => QueryOp::StartsWith,
        "=%" => QueryOp::EndsWith,
        "~=" => QueryOp::Contains,
        "!~=" => QueryOp::NotContains,
        other => {
            return UnknownOperatorSnafu {
                op: other.to_string(),
                raw: full_raw.to_string(),
            }
            .fail()
        }
    };
    match query_op {
        QueryOp::Each => Ok(Query::each()),
        QueryOp::Any => Ok(Query::any()),
        _ => {
            let field_path = if field.is_empty() {
                Vec::new()
            } else {
                let segments = tokenize_segments(field)?;
                segments_to_steps(segments, full_raw)?
            };
            let operand = Operand::parse(value);
            Ok(Query::comparison(query_op, field_path, operand))
        }
    }
}

/// Parses a path DSL expression, optionally splicing a caller-supplied
/// `base` path in for a leading `@.` anchor (resolved statically, at parse
/// time — see DESIGN.md, Open Question 2).
pub fn parse(raw: &str, base: Option<&str>) -> Result<Path, PathSyntaxError> {
    let spliced;
    let effective_raw: &str = if let Some(rest) = raw.strip_prefix("@.") {
        let base = base.ok_or_else(|| {
            MissingBaseSnafu {
                raw: raw.to_string(),
            }
            .build()
        })?;
        spliced = format!("{base}.{rest}");
        &spliced
    } else if raw == "@" {
        let base = base.ok_or_else(|| {
            MissingBaseSnafu {
                raw: raw.to_string(),
            }
            .build()
        })?;
        spliced = base.to_string();
        &spliced
    } else {
        raw
    };
    let segments = tokenize_segments(effective_raw)?;
    let steps = segments_to_steps(segments, raw)?;
    Ok(Path::new(steps))
}

/// `true` iff `raw_path` begins with `@.`/is exactly `@`, or contains the
/// literal marker `[@]` — the two forms of relative path recognized by
/// spec §3/§4.3. The `[@]` form is classification-only here; it is resolved
/// dynamically per source occurrence by the translation engine, not spliced
/// statically by this parser (see DESIGN.md).
#[must_use]
pub fn is_relative(raw_path: &str) -> bool {
    raw_path.starts_with("@.") || raw_path == "@" || raw_path.contains("[@]")
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// A bare field name: letters/digits/underscore, never starting with a
    /// digit, so it can never be misread as a bracket index.
    fn field_name() -> impl Strategy<Value = String> {
        "[a-zA-Z_][a-zA-Z0-9_]{0,8}"
    }

    proptest! {
        /// spec.md §8 "parse determinism": parsing the same raw path twice
        /// yields equal ASTs, for any dot-joined run of field names.
        #[test]
        fn parse_is_deterministic_over_generated_field_paths(segments in prop::collection::vec(field_name(), 1..6)) {
            let raw = segments.join(".");
            prop_assert_eq!(parse(&raw, None).unwrap(), parse(&raw, None).unwrap());
        }

        /// A dot-joined run of bare field names always parses to exactly
        /// one `Step::Field` per segment, in order, with no `Query` or
        /// `Optional` steps — there's nothing in such a path that could
        /// introduce one.
        #[test]
        fn bare_field_path_round_trips_to_matching_field_steps(segments in prop::collection::vec(field_name(), 1..6)) {
            let raw = segments.join(".");
            let path = parse(&raw, None).unwrap();
            let fields: Vec<String> = path
                .steps
                .iter()
                .map(|s| match s {
                    Step::Field(name) => name.clone(),
                    other => panic!("unexpected step {other:?} in a bare field path"),
                })
                .collect();
            prop_assert_eq!(fields, segments);
        }
    }
}

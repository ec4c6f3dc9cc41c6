//! The document tree walked by the [`Evaluator`](crate::evaluate::Evaluator).
//!
//! A [`Document`] is deliberately decoupled from any particular decoder:
//! callers hand in a tree produced by a JSON decoder (`serde_json::Value`)
//! or, with the `yaml` feature, a YAML decoder (`serde_yaml::Value`), and
//! the rest of the crate never again cares which.

use indexmap::IndexMap;
use serde_json::Number;
use std::fmt;

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{s}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Null => write!(f, "null"),
        }
    }
}

/// An opaque tree of mappings, sequences, scalars, and the [`Document::Missing`]
/// sentinel.
///
/// `Missing` is distinct from `Scalar(Scalar::Null)`: it means "no such
/// field", not "field present with a null value", and it propagates through
/// further field/index access rather than erroring (see
/// [`Document::get_field`] and [`Document::get_index`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Map(IndexMap<String, Document>),
    Seq(Vec<Document>),
    Scalar(Scalar),
    Missing,
}

impl Document {
    #[must_use]
    pub fn map() -> Self {
        Document::Map(IndexMap::new())
    }

    #[must_use]
    pub fn seq() -> Self {
        Document::Seq(Vec::new())
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Document::Missing)
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, Document>> {
        match self {
            Document::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, Document>> {
        match self {
            Document::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq(&self) -> Option<&[Document]> {
        match self {
            Document::Seq(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq_mut(&mut self) -> Option<&mut Vec<Document>> {
        match self {
            Document::Seq(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Document::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Field access that propagates [`Document::Missing`] instead of panicking.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Document {
        match self {
            Document::Map(m) => m.get(name).cloned().unwrap_or(Document::Missing),
            _ => Document::Missing,
        }
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        matches!(self, Document::Map(m) if m.contains_key(name))
    }

    /// A short preview used in diagnostic messages: the full value if short,
    /// otherwise the first `start` and last `end` characters joined by an
    /// ellipsis.
    #[must_use]
    pub fn preview(&self, start: usize, end: usize, max_len: usize) -> String {
        let full = self.to_string();
        if full.len() <= max_len {
            return full;
        }
        let head: String = full.chars().take(start).collect();
        let tail: String = full
            .chars()
            .rev()
            .take(end)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Missing => write!(f, "MISSING"),
            Document::Scalar(s) => write!(f, "{s}"),
            Document::Map(_) | Document::Seq(_) => {
                let value: serde_json::Value = self.clone().into();
                write!(f, "{value}")
            }
        }
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Document::Scalar(Scalar::Null),
            serde_json::Value::Bool(b) => Document::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Document::Scalar(Scalar::Number(n)),
            serde_json::Value::String(s) => Document::Scalar(Scalar::String(s)),
            serde_json::Value::Array(a) => Document::Seq(a.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(o) => {
                Document::Map(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        match doc {
            Document::Missing => serde_json::Value::Null,
            Document::Scalar(Scalar::Null) => serde_json::Value::Null,
            Document::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(b),
            Document::Scalar(Scalar::Number(n)) => serde_json::Value::Number(n),
            Document::Scalar(Scalar::String(s)) => serde_json::Value::String(s),
            Document::Seq(s) => serde_json::Value::Array(s.into_iter().map(Into::into).collect()),
            Document::Map(m) => {
                serde_json::Value::Object(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[cfg(feature = "yaml")]
impl From<serde_yaml::Value> for Document {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Document::Scalar(Scalar::Null),
            serde_yaml::Value::Bool(b) => Document::Scalar(Scalar::Bool(b)),
            serde_yaml::Value::Number(n) => {
                let number = if let Some(i) = n.as_i64() {
                    Number::from(i)
                } else if let Some(u) = n.as_u64() {
                    Number::from(u)
                } else {
                    Number::from_f64(n.as_f64().unwrap_or_default()).unwrap_or_else(|| 0.into())
                };
                Document::Scalar(Scalar::Number(number))
            }
            serde_yaml::Value::String(s) => Document::Scalar(Scalar::String(s)),
            serde_yaml::Value::Sequence(s) => {
                Document::Seq(s.into_iter().map(Into::into).collect())
            }
            serde_yaml::Value::Mapping(m) => Document::Map(
                m.into_iter()
                    .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.into())))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(t) => t.value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_propagates_through_field_access() {
        let doc = Document::Missing;
        assert!(doc.get_field("anything").is_missing());
    }

    #[test]
    fn missing_is_distinct_from_null() {
        let null = Document::Scalar(Scalar::Null);
        assert_ne!(null, Document::Missing);
    }

    #[test]
    fn round_trips_through_serde_json() {
        let value = serde_json::json!({"a": [1, 2, {"b": "c"}], "d": null});
        let doc: Document = value.clone().into();
        let back: serde_json::Value = doc.into();
        assert_eq!(value, back);
    }

    #[test]
    fn preview_truncates_long_values() {
        let doc = Document::Scalar(Scalar::String("x".repeat(100)));
        let preview = doc.preview(5, 5, 20);
        assert!(preview.contains("..."));
        assert!(preview.len() < 100);
    }
}

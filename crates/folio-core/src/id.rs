//! Typed document identifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display};
use uuid::Uuid;

/// A strongly-typed wrapper for document IDs.
///
/// An ID keeps the JSON type it has inside the document, so an integer id
/// filters as an integer. Values produced by [`DocumentId::new`] are UUID
/// v7 strings, so they sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Str(String),
}

impl DocumentId {
    /// Creates a new time-ordered document ID.
    #[must_use]
    pub fn new() -> Self {
        Self::Str(Uuid::now_v7().to_string())
    }

    /// Wraps an existing string identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self::Str(id.into())
    }

    /// Extracts an ID from a JSON value, accepting strings and integers.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int),
            _ => None,
        }
    }

    /// Returns the identifier as a string slice, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Returns the identifier as the JSON value stored in documents.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Str(s) => Value::String(s.clone()),
        }
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_ids_are_unique() {
        let first = DocumentId::new();
        let second = DocumentId::new();
        assert_ne!(first, second);
        assert_eq!(first.as_str().map(str::len), Some(36));
    }

    #[test]
    fn test_from_value_keeps_json_type() {
        assert_eq!(DocumentId::from_value(&json!("abc")), Some(DocumentId::from("abc")));
        assert_eq!(DocumentId::from_value(&json!(42)), Some(DocumentId::Int(42)));
        assert_eq!(DocumentId::from_value(&json!(1.5)), None);
        assert_eq!(DocumentId::from_value(&json!(null)), None);
    }

    #[test]
    fn test_to_value_round_trips() {
        for value in [json!(7), json!("doc-7")] {
            let id = DocumentId::from_value(&value).unwrap();
            assert_eq!(id.to_value(), value);
        }
        assert_eq!(DocumentId::from(7).to_string(), "7");
    }

    #[test]
    fn test_serializes_transparently() {
        assert_eq!(serde_json::to_value(DocumentId::from("doc-1")).unwrap(), json!("doc-1"));
        assert_eq!(serde_json::to_value(DocumentId::from(3)).unwrap(), json!(3));
        let back: DocumentId = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(back, DocumentId::Int(3));
    }
}

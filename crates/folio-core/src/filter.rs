//! Typed query filters.

use crate::document::{compare_values, field_or_null, get_path, values_equal, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A filter over documents.
///
/// Filters are a closed vocabulary that every query executor must be able
/// to translate. They serialize to JSON so that cache keys can fingerprint
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field differs from value.
    Ne { field: String, value: Value },
    /// Field strictly greater than value.
    Gt { field: String, value: Value },
    /// Field greater than or equal to value.
    Gte { field: String, value: Value },
    /// Field strictly less than value.
    Lt { field: String, value: Value },
    /// Field less than or equal to value.
    Lte { field: String, value: Value },
    /// Field equals one of the values.
    In { field: String, values: Vec<Value> },
    /// Field presence check.
    Exists { field: String, exists: bool },
    /// Every sub-filter matches.
    And(Vec<Filter>),
    /// At least one sub-filter matches.
    Or(Vec<Filter>),
}

impl Filter {
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In { field: field.into(), values }
    }

    #[must_use]
    pub fn exists(field: impl Into<String>, exists: bool) -> Self {
        Self::Exists { field: field.into(), exists }
    }

    /// Conjunction of filters. `All` operands are dropped and nested
    /// conjunctions are flattened.
    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut flat = Vec::new();
        for filter in filters {
            match filter {
                Self::All => {}
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::All,
            1 => flat.remove(0),
            _ => Self::And(flat),
        }
    }

    /// Disjunction of filters. A single operand is returned unwrapped.
    #[must_use]
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut flat: Vec<Filter> = filters.into_iter().collect();
        if flat.iter().any(|f| matches!(f, Self::All)) {
            return Self::All;
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        Self::Or(flat)
    }

    /// Combines this filter with another under a conjunction.
    #[must_use]
    pub fn and_also(self, other: Filter) -> Self {
        Self::and([self, other])
    }

    /// Returns true if the filter places no constraint on documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::All => true,
            Self::And(inner) => inner.iter().all(Self::is_empty),
            _ => false,
        }
    }

    /// Evaluates the filter against a document.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => values_equal(&field_or_null(doc, field), value),
            Self::Ne { field, value } => !values_equal(&field_or_null(doc, field), value),
            Self::Gt { field, value } => cmp_field(doc, field, value) == Ordering::Greater,
            Self::Gte { field, value } => cmp_field(doc, field, value) != Ordering::Less,
            Self::Lt { field, value } => cmp_field(doc, field, value) == Ordering::Less,
            Self::Lte { field, value } => cmp_field(doc, field, value) != Ordering::Greater,
            Self::In { field, values } => {
                let actual = field_or_null(doc, field);
                values.iter().any(|v| values_equal(&actual, v))
            }
            Self::Exists { field, exists } => get_path(doc, field).is_some() == *exists,
            Self::And(inner) => inner.iter().all(|f| f.matches(doc)),
            Self::Or(inner) => inner.iter().any(|f| f.matches(doc)),
        }
    }
}

fn cmp_field(doc: &Document, field: &str, value: &Value) -> Ordering {
    compare_values(&field_or_null(doc, field), value)
}

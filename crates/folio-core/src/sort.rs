//! Sort specifications.

use crate::document::{compare_values, field_or_null, Document};
use crate::{FolioError, FolioResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Direction of a sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns `1` for ascending and `-1` for descending.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }

    /// Applies the direction to an ascending comparison result.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// A single field of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// An ordered list of sort fields; earlier fields take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    fields: Vec<SortField>,
}

impl SortSpec {
    /// Creates an empty sort specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ascending field.
    #[must_use]
    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.fields.push(SortField::new(field, SortDirection::Asc));
        self
    }

    /// Appends a descending field.
    #[must_use]
    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.fields.push(SortField::new(field, SortDirection::Desc));
        self
    }

    /// Builds a specification from already-ordered fields.
    #[must_use]
    pub fn from_fields(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    /// Parses the `-createdAt,name` shorthand.
    ///
    /// Fields may be separated by commas or whitespace. A leading `-`
    /// means descending, a leading `+` or no prefix means ascending.
    pub fn parse(input: &str) -> FolioResult<Self> {
        let mut spec = Self::new();
        for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            let (direction, name) = match token.as_bytes()[0] {
                b'-' => (SortDirection::Desc, &token[1..]),
                b'+' => (SortDirection::Asc, &token[1..]),
                _ => (SortDirection::Asc, token),
            };
            if name.is_empty() {
                return Err(FolioError::invalid_sort(format!("empty field name in '{}'", input)));
            }
            spec.fields.push(SortField::new(name, direction));
        }
        Ok(spec)
    }

    #[must_use]
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns the first (most significant) field.
    #[must_use]
    pub fn primary(&self) -> Option<&SortField> {
        self.fields.first()
    }

    /// Returns the direction a field is sorted in, if present.
    #[must_use]
    pub fn direction_of(&self, field: &str) -> Option<SortDirection> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.direction)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.direction_of(field).is_some()
    }

    /// Compares two documents under this specification.
    #[must_use]
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for sort in &self.fields {
            let ord = compare_values(&field_or_null(a, &sort.field), &field_or_null(b, &sort.field));
            if ord != Ordering::Equal {
                return sort.direction.apply(ord);
            }
        }
        Ordering::Equal
    }

    /// Iterates over field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.as_str())
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|s| match s.direction {
                SortDirection::Asc => s.field.clone(),
                SortDirection::Desc => format!("-{}", s.field),
            })
            .collect();
        f.write_str(&parts.join(","))
    }
}

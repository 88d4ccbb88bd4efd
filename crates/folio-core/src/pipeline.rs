//! Projections and aggregate pipeline stages.

use crate::document::{get_path, set_path, Document};
use crate::{Filter, SortSpec};
use serde::{Deserialize, Serialize};

/// An inclusion projection. The identifier field is always kept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    #[must_use]
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut projection = Self::default();
        for field in fields {
            projection.add(field);
        }
        projection
    }

    /// Adds a field if it is not already included.
    pub fn add(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Applies the projection to a document.
    #[must_use]
    pub fn apply(&self, doc: &Document, id_field: &str) -> Document {
        if self.fields.is_empty() {
            return doc.clone();
        }
        let mut out = Document::new();
        if let Some(id) = doc.get(id_field) {
            out.insert(id_field.to_string(), id.clone());
        }
        for field in &self.fields {
            if let Some(value) = get_path(doc, field) {
                set_path(&mut out, field, value.clone());
            }
        }
        out
    }
}

/// Accumulators available in a [`Stage::Group`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "field")]
pub enum Accumulator {
    /// Number of documents in the group.
    Count,
    /// Sum of a numeric field.
    Sum(String),
    /// Mean of a numeric field.
    Avg(String),
    /// Smallest value of a field.
    Min(String),
    /// Largest value of a field.
    Max(String),
    /// Value of a field in the first document of the group.
    First(String),
}

/// A stage of an aggregate pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Keeps documents matching the filter.
    Match(Filter),
    /// Orders documents.
    Sort(SortSpec),
    /// Drops the first `n` documents.
    Skip(u64),
    /// Keeps at most `n` documents.
    Limit(u64),
    /// Reshapes documents.
    Project(Projection),
    /// Groups documents by a field (or all together when `by` is `None`).
    /// Output documents carry the group key under `_id`.
    Group {
        by: Option<String>,
        accumulators: Vec<(String, Accumulator)>,
    },
    /// Replaces the stream with a single `{ <name>: count }` document.
    /// Produces nothing when the input is empty.
    Count(String),
    /// Runs named sub-pipelines over the same input and emits one document
    /// holding each sub-pipeline's output array under its name.
    Facet(Vec<(String, Vec<Stage>)>),
}

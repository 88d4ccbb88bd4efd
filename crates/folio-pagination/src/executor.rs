//! Contracts the pagination engine and repository expect from a document
//! store.

use async_trait::async_trait;
use folio_core::{Document, Filter, FolioResult, Projection, SortSpec, Stage};
use serde::{Deserialize, Serialize};

/// A `find` request: filter, sort, skip, limit, projection and populate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: SortSpec,
    pub skip: u64,
    pub limit: Option<u64>,
    pub projection: Option<Projection>,
    /// Relations to resolve. Stores without relations ignore it.
    pub populate: Vec<String>,
}

impl FindQuery {
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

/// Read side of a collection-scoped document store.
///
/// Implementations translate the typed query vocabulary to their native
/// query language. Errors are reported as [`folio_core::FolioError::Store`]
/// and are propagated to callers unchanged.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs a find with sort, skip, limit and projection.
    async fn find(&self, query: &FindQuery) -> FolioResult<Vec<Document>>;

    /// Returns the first document matching the query, honoring its sort.
    async fn find_one(&self, query: &FindQuery) -> FolioResult<Option<Document>>;

    /// Exact count of documents matching `filter`.
    async fn count_documents(&self, filter: &Filter) -> FolioResult<u64>;

    /// Constant-time estimate of the collection size.
    async fn estimated_document_count(&self) -> FolioResult<u64>;

    /// Executes an aggregate pipeline, including `Stage::Facet`.
    async fn aggregate(&self, pipeline: &[Stage]) -> FolioResult<Vec<Document>>;
}

/// Write side of a collection-scoped document store.
///
/// Patches are field-level sets: every key of the patch (dotted paths
/// allowed) replaces the stored value.
#[async_trait]
pub trait DocumentStore: QueryExecutor {
    /// Inserts a document and returns it as stored.
    async fn insert_one(&self, doc: Document) -> FolioResult<Document>;

    /// Inserts documents and returns them as stored.
    async fn insert_many(&self, docs: Vec<Document>) -> FolioResult<Vec<Document>>;

    /// Patches the first matching document and returns its new state.
    async fn update_one(&self, filter: &Filter, patch: &Document) -> FolioResult<Option<Document>>;

    /// Patches every matching document and returns how many changed.
    async fn update_many(&self, filter: &Filter, patch: &Document) -> FolioResult<u64>;

    /// Deletes the first matching document.
    async fn delete_one(&self, filter: &Filter) -> FolioResult<bool>;

    /// Deletes every matching document and returns how many were removed.
    async fn delete_many(&self, filter: &Filter) -> FolioResult<u64>;
}

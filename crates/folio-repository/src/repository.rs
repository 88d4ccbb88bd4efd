//! Collection-scoped repository.

use crate::hooks::{AfterEvent, BeforeEvent, HookBus, HookContext, HookResult};
use crate::query::{ListMode, ListQuery, ReadOptions};
use chrono::{SecondsFormat, Utc};
use folio_config::PaginationConfig;
use folio_core::{
    Document, DocumentId, Filter, FolioError, FolioResult, KeysetPage, ListResult, OffsetPage,
};
use folio_pagination::{
    AggregateOptions, DocumentStore, FindQuery, KeysetOptions, OffsetOptions, PaginationEngine,
    QueryExecutor,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Reads and writes one collection, emitting lifecycle events around every
/// operation.
pub struct Repository {
    collection: String,
    store: Arc<dyn DocumentStore>,
    engine: PaginationEngine,
    hooks: HookBus,
    id_field: String,
    timestamps: bool,
}

impl Repository {
    /// Creates a repository over `store`.
    pub fn new<S>(collection: impl Into<String>, store: Arc<S>, config: PaginationConfig) -> Self
    where
        S: DocumentStore + 'static,
    {
        let executor: Arc<dyn QueryExecutor> = store.clone();
        let id_field = config.id_field.clone();
        Self {
            collection: collection.into(),
            store,
            engine: PaginationEngine::new(executor, config),
            hooks: HookBus::new(),
            id_field,
            timestamps: true,
        }
    }

    /// Enables or disables `createdAt`/`updatedAt` stamping.
    #[must_use]
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    #[must_use]
    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    #[must_use]
    pub fn engine(&self) -> &PaginationEngine {
        &self.engine
    }

    fn id_filter(&self, id: &DocumentId) -> Filter {
        Filter::eq(self.id_field.clone(), id.to_value())
    }

    fn now() -> Value {
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    fn prepare_new(&self, mut doc: Document) -> Document {
        if doc.get(&self.id_field).map_or(true, Value::is_null) {
            doc.insert(self.id_field.clone(), DocumentId::new().to_value());
        }
        if self.timestamps {
            let now = Self::now();
            doc.entry(CREATED_AT.to_string()).or_insert_with(|| now.clone());
            doc.insert(UPDATED_AT.to_string(), now);
        }
        doc
    }

    fn prepare_patch(&self, patch: &Document) -> Document {
        let mut patch = patch.clone();
        patch.remove(&self.id_field);
        if self.timestamps {
            patch.insert(UPDATED_AT.to_string(), Self::now());
        }
        patch
    }

    #[instrument(skip(self, options), fields(collection = %self.collection))]
    pub async fn get_by_id(&self, id: &DocumentId, options: &ReadOptions) -> FolioResult<Option<Document>> {
        let mut ctx = HookContext::new(options.skip_cache);
        self.hooks
            .emit_before(&BeforeEvent::GetById { id, options }, &mut ctx)
            .await?;

        let result = match served_document(&mut ctx) {
            Some(doc) => Some(doc),
            None => {
                let query = FindQuery {
                    projection: options.projection.clone(),
                    populate: options.populate.clone(),
                    ..FindQuery::new(self.id_filter(id))
                };
                self.store.find_one(&query).await?
            }
        };

        self.hooks
            .emit_after(
                &AfterEvent::GetById {
                    id,
                    options,
                    result: result.as_ref(),
                },
                &mut ctx,
            )
            .await?;
        Ok(result)
    }

    /// Like [`Repository::get_by_id`] but fails with `NotFound`.
    pub async fn require_by_id(&self, id: &DocumentId, options: &ReadOptions) -> FolioResult<Document> {
        self.get_by_id(id, options)
            .await?
            .ok_or_else(|| FolioError::not_found("Document", id))
    }

    #[instrument(skip(self, filter, options), fields(collection = %self.collection))]
    pub async fn get_by_query(&self, filter: &Filter, options: &ReadOptions) -> FolioResult<Option<Document>> {
        let mut ctx = HookContext::new(options.skip_cache);
        self.hooks
            .emit_before(&BeforeEvent::GetByQuery { filter, options }, &mut ctx)
            .await?;

        let result = match served_document(&mut ctx) {
            Some(doc) => Some(doc),
            None => {
                let query = FindQuery {
                    projection: options.projection.clone(),
                    populate: options.populate.clone(),
                    ..FindQuery::new(filter.clone())
                };
                self.store.find_one(&query).await?
            }
        };

        self.hooks
            .emit_after(
                &AfterEvent::GetByQuery {
                    filter,
                    options,
                    result: result.as_ref(),
                },
                &mut ctx,
            )
            .await?;
        Ok(result)
    }

    /// Lists documents with offset or keyset pagination.
    #[instrument(skip(self, query), fields(collection = %self.collection))]
    pub async fn get_all(&self, query: &ListQuery) -> FolioResult<ListResult> {
        let mut ctx = HookContext::new(query.skip_cache);
        self.hooks
            .emit_before(&BeforeEvent::GetAll { query }, &mut ctx)
            .await?;

        let served = match ctx.take_served() {
            Some(HookResult::List(list)) if same_method(&list, &query.mode) => Some(list),
            Some(_) => {
                warn!(collection = %self.collection, "Ignoring served result of the wrong shape");
                None
            }
            None => None,
        };

        let result = match served {
            Some(list) => list,
            None => match &query.mode {
                ListMode::Offset(options) => ListResult::Offset(self.engine.paginate(options).await?),
                ListMode::Keyset(options) => ListResult::Keyset(self.engine.stream(options).await?),
            },
        };

        self.hooks
            .emit_after(&AfterEvent::GetAll { query, result: &result }, &mut ctx)
            .await?;
        Ok(result)
    }

    /// Offset pagination through the hooked list path.
    pub async fn paginate(&self, options: OffsetOptions) -> FolioResult<OffsetPage> {
        match self.get_all(&ListQuery::offset(options)).await? {
            ListResult::Offset(page) => Ok(page),
            _ => Err(FolioError::internal("offset read produced a different result shape")),
        }
    }

    /// Keyset pagination through the hooked list path.
    pub async fn stream(&self, options: KeysetOptions) -> FolioResult<KeysetPage> {
        match self.get_all(&ListQuery::keyset(options)).await? {
            ListResult::Keyset(page) => Ok(page),
            _ => Err(FolioError::internal("keyset read produced a different result shape")),
        }
    }

    /// Aggregate pagination. Not hooked.
    pub async fn aggregate_paginate(&self, options: &AggregateOptions) -> FolioResult<OffsetPage> {
        self.engine.aggregate_paginate(options).await
    }

    #[instrument(skip(self, doc), fields(collection = %self.collection))]
    pub async fn create(&self, doc: Document) -> FolioResult<Document> {
        let doc = self.prepare_new(doc);
        let mut ctx = HookContext::default();
        self.hooks
            .emit_before(&BeforeEvent::Create { doc: &doc }, &mut ctx)
            .await?;

        let created = self.store.insert_one(doc).await?;
        debug!(id = ?created.get(&self.id_field), "Document created");

        self.hooks
            .emit_after(&AfterEvent::Create { doc: &created }, &mut ctx)
            .await?;
        Ok(created)
    }

    #[instrument(skip(self, docs), fields(collection = %self.collection, count = docs.len()))]
    pub async fn create_many(&self, docs: Vec<Document>) -> FolioResult<Vec<Document>> {
        let docs: Vec<Document> = docs.into_iter().map(|d| self.prepare_new(d)).collect();
        let mut ctx = HookContext::default();
        self.hooks
            .emit_before(&BeforeEvent::CreateMany { docs: &docs }, &mut ctx)
            .await?;

        let created = self.store.insert_many(docs).await?;

        self.hooks
            .emit_after(&AfterEvent::CreateMany { docs: &created }, &mut ctx)
            .await?;
        Ok(created)
    }

    /// Applies a field-level patch. The id field cannot be changed.
    #[instrument(skip(self, patch), fields(collection = %self.collection))]
    pub async fn update(&self, id: &DocumentId, patch: &Document) -> FolioResult<Option<Document>> {
        let patch = self.prepare_patch(patch);
        let mut ctx = HookContext::default();
        self.hooks
            .emit_before(&BeforeEvent::Update { id, patch: &patch }, &mut ctx)
            .await?;

        let updated = self.store.update_one(&self.id_filter(id), &patch).await?;

        self.hooks
            .emit_after(
                &AfterEvent::Update {
                    id,
                    result: updated.as_ref(),
                },
                &mut ctx,
            )
            .await?;
        Ok(updated)
    }

    #[instrument(skip(self, filter, patch), fields(collection = %self.collection))]
    pub async fn update_many(&self, filter: &Filter, patch: &Document) -> FolioResult<u64> {
        let patch = self.prepare_patch(patch);
        let mut ctx = HookContext::default();
        self.hooks
            .emit_before(&BeforeEvent::UpdateMany { filter, patch: &patch }, &mut ctx)
            .await?;

        let modified = self.store.update_many(filter, &patch).await?;

        self.hooks
            .emit_after(&AfterEvent::UpdateMany { filter, modified }, &mut ctx)
            .await?;
        Ok(modified)
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn delete(&self, id: &DocumentId) -> FolioResult<bool> {
        let mut ctx = HookContext::default();
        self.hooks
            .emit_before(&BeforeEvent::Delete { id }, &mut ctx)
            .await?;

        let deleted = self.store.delete_one(&self.id_filter(id)).await?;

        self.hooks
            .emit_after(&AfterEvent::Delete { id, deleted }, &mut ctx)
            .await?;
        Ok(deleted)
    }

    #[instrument(skip(self, filter), fields(collection = %self.collection))]
    pub async fn delete_many(&self, filter: &Filter) -> FolioResult<u64> {
        let mut ctx = HookContext::default();
        self.hooks
            .emit_before(&BeforeEvent::DeleteMany { filter }, &mut ctx)
            .await?;

        let deleted = self.store.delete_many(filter).await?;

        self.hooks
            .emit_after(&AfterEvent::DeleteMany { filter, deleted }, &mut ctx)
            .await?;
        Ok(deleted)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &self.collection)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

fn served_document(ctx: &mut HookContext) -> Option<Document> {
    match ctx.take_served() {
        Some(HookResult::Document(doc)) => Some(doc),
        Some(HookResult::List(_)) => {
            warn!("Ignoring a list served for a single-document read");
            None
        }
        None => None,
    }
}

fn same_method(result: &ListResult, mode: &ListMode) -> bool {
    matches!(
        (result, mode),
        (ListResult::Offset(_), ListMode::Offset(_)) | (ListResult::Keyset(_), ListMode::Keyset(_))
    )
}

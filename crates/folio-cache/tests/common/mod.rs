//! Common fixtures for cache-aside integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use folio_cache::{CacheAdapter, CachedRepository, MemoryCacheAdapter};
use folio_config::AppConfig;
use folio_core::{Document, Filter, FolioError, FolioResult, Stage};
use folio_pagination::{DocumentStore, FindQuery, MemoryStore, QueryExecutor};
use folio_repository::Repository;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A [`MemoryStore`] that counts the reads reaching it.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    finds: AtomicU64,
}

impl CountingStore {
    /// Store reads (`find` and `find_one`) served so far.
    pub fn reads(&self) -> u64 {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for CountingStore {
    async fn find(&self, query: &FindQuery) -> FolioResult<Vec<Document>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(query).await
    }

    async fn find_one(&self, query: &FindQuery) -> FolioResult<Option<Document>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_one(query).await
    }

    async fn count_documents(&self, filter: &Filter) -> FolioResult<u64> {
        self.inner.count_documents(filter).await
    }

    async fn estimated_document_count(&self) -> FolioResult<u64> {
        self.inner.estimated_document_count().await
    }

    async fn aggregate(&self, pipeline: &[Stage]) -> FolioResult<Vec<Document>> {
        self.inner.aggregate(pipeline).await
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn insert_one(&self, doc: Document) -> FolioResult<Document> {
        self.inner.insert_one(doc).await
    }

    async fn insert_many(&self, docs: Vec<Document>) -> FolioResult<Vec<Document>> {
        self.inner.insert_many(docs).await
    }

    async fn update_one(&self, filter: &Filter, patch: &Document) -> FolioResult<Option<Document>> {
        self.inner.update_one(filter, patch).await
    }

    async fn update_many(&self, filter: &Filter, patch: &Document) -> FolioResult<u64> {
        self.inner.update_many(filter, patch).await
    }

    async fn delete_one(&self, filter: &Filter) -> FolioResult<bool> {
        self.inner.delete_one(filter).await
    }

    async fn delete_many(&self, filter: &Filter) -> FolioResult<u64> {
        self.inner.delete_many(filter).await
    }
}

/// An adapter whose every operation fails, as an unreachable Redis would.
#[derive(Default)]
pub struct FailingAdapter {
    calls: AtomicU64,
}

impl FailingAdapter {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> FolioResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FolioError::cache("connection refused"))
    }
}

#[async_trait]
impl CacheAdapter for FailingAdapter {
    async fn get_raw(&self, _key: &str) -> FolioResult<Option<String>> {
        self.fail()
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl: Duration) -> FolioResult<()> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> FolioResult<bool> {
        self.fail()
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// A cached `products` repository over a counting in-memory store.
pub struct TestCatalog {
    pub store: Arc<CountingStore>,
    pub adapter: Arc<dyn CacheAdapter>,
    pub products: CachedRepository,
}

impl TestCatalog {
    /// Catalog over a fresh in-memory adapter.
    pub async fn new() -> Self {
        Self::with_adapter(Arc::new(MemoryCacheAdapter::default())).await
    }

    pub async fn with_adapter(adapter: Arc<dyn CacheAdapter>) -> Self {
        let store = Arc::new(CountingStore::default());
        Self::over(store, adapter).await
    }

    /// Catalog over existing store and adapter, as a restarted process
    /// would see them.
    pub async fn over(store: Arc<CountingStore>, adapter: Arc<dyn CacheAdapter>) -> Self {
        let config = AppConfig::default();
        // Only the first call installs a subscriber; later ones fail harmlessly.
        let _ = folio_core::telemetry::init_telemetry(&config.observability.telemetry());
        let repository = Arc::new(Repository::new(
            "products",
            store.clone(),
            config.pagination.clone(),
        ));
        let products = CachedRepository::with_adapter(repository, adapter.clone(), &config)
            .await
            .expect("collection name is cache-safe");
        Self {
            store,
            adapter,
            products,
        }
    }

    /// Inserts `count` products directly into the store, bypassing hooks.
    pub async fn seed(&self, count: usize) {
        for n in 0..count {
            self.store
                .insert_one(product(n))
                .await
                .expect("seed product");
        }
    }
}

/// Product `n`: id `p{n:02}`, price `n * 10`.
pub fn product(n: usize) -> Document {
    doc(json!({
        "_id": format!("p{:02}", n),
        "name": format!("Product {}", n),
        "price": n * 10,
    }))
}

pub fn doc(value: Value) -> Document {
    value
        .as_object()
        .cloned()
        .expect("fixture must be a JSON object")
}

//! Common fixtures for pagination integration tests.

#![allow(dead_code)]

use folio_config::PaginationConfig;
use folio_core::Document;
use folio_pagination::{MemoryStore, PaginationEngine};
use serde_json::{json, Value};
use std::sync::Arc;

/// An in-memory collection with an engine bound to it.
pub struct TestCollection {
    store: Arc<MemoryStore>,
    engine: PaginationEngine,
}

impl TestCollection {
    /// Creates a collection pre-loaded with `docs`.
    pub fn new(docs: Vec<Document>) -> Self {
        Self::with_config(docs, PaginationConfig::default())
    }

    pub fn with_config(docs: Vec<Document>, config: PaginationConfig) -> Self {
        let store = Arc::new(MemoryStore::with_documents(config.id_field.clone(), docs));
        let engine = PaginationEngine::new(store.clone(), config);
        Self { store, engine }
    }

    /// `count` articles with distinct, increasing `createdAt` values.
    pub fn articles(count: usize) -> Self {
        Self::new((0..count).map(article).collect())
    }

    pub fn engine(&self) -> &PaginationEngine {
        &self.engine
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }
}

/// Builds a document from a JSON object literal.
pub fn doc(value: Value) -> Document {
    value
        .as_object()
        .cloned()
        .expect("fixture must be a JSON object")
}

/// Article `n`: id `a{n:02}`, `createdAt` one minute apart.
pub fn article(n: usize) -> Document {
    doc(json!({
        "_id": format!("a{:02}", n),
        "title": format!("Article {}", n),
        "createdAt": format!("2024-01-01T00:{:02}:00Z", n),
        "category": if n % 2 == 0 { "even" } else { "odd" },
    }))
}

/// Ids of a page, in order.
pub fn ids(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .map(|d| d.get("_id").and_then(Value::as_str).unwrap_or_default().to_string())
        .collect()
}

//! Cache key generators for consistent key naming.
//!
//! ```text
//! {prefix}:{collection}:id:{id}
//! {prefix}:{collection}:query:{fingerprint}
//! {prefix}:{collection}:list:v{version}:{fingerprint}
//! {prefix}:{collection}:version
//! ```

use folio_core::{DocumentId, Filter, FolioError, FolioResult};
use folio_repository::{ListMode, ReadOptions};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

/// Stable hash of a serializable value.
///
/// Object keys are sorted before hashing, so two values that are equal as
/// JSON always share a fingerprint.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> FolioResult<String> {
    let canonical = canonicalize(serde_json::to_value(value)?);
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    Ok(hex::encode(&digest[..16]))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Key namespace of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
    collection: String,
}

/// Characters Redis `SCAN MATCH` and [`CacheKeys::pattern`] treat as glob syntax.
const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '\\'];

impl CacheKeys {
    /// Fails if `prefix` contains glob characters, or if `collection` is
    /// empty or contains glob characters or `:`. Either would let
    /// [`CacheKeys::pattern`] match keys of another collection.
    pub fn new(prefix: impl Into<String>, collection: impl Into<String>) -> FolioResult<Self> {
        let prefix = prefix.into();
        let collection = collection.into();
        if prefix.contains(GLOB_CHARS) {
            return Err(FolioError::Configuration(format!(
                "cache key prefix '{}' contains glob characters",
                prefix
            )));
        }
        if collection.is_empty() || collection.contains(GLOB_CHARS) || collection.contains(':') {
            return Err(FolioError::validation(format!(
                "collection name '{}' cannot be used in cache keys",
                collection
            )));
        }
        Ok(Self { prefix, collection })
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Key of a single document. Contains no version so that writes can
    /// delete it by exact key.
    #[must_use]
    pub fn by_id(&self, id: &DocumentId) -> String {
        format!("{}:{}:id:{}", self.prefix, self.collection, id)
    }

    /// Key of a find-one-by-filter read.
    pub fn by_query(&self, filter: &Filter, options: &ReadOptions) -> FolioResult<String> {
        let hash = fingerprint(&json!({
            "filter": filter,
            "projection": options.projection,
            "populate": options.populate,
        }))?;
        Ok(format!("{}:{}:query:{}", self.prefix, self.collection, hash))
    }

    /// Key of a list read under collection `version`.
    pub fn list(&self, version: u64, mode: &ListMode) -> FolioResult<String> {
        let hash = fingerprint(mode)?;
        Ok(format!("{}:{}:list:v{}:{}", self.prefix, self.collection, version, hash))
    }

    /// Key under which the collection version is persisted.
    #[must_use]
    pub fn version(&self) -> String {
        format!("{}:{}:version", self.prefix, self.collection)
    }

    /// Pattern matching every key of the collection.
    #[must_use]
    pub fn pattern(&self) -> String {
        format!("{}:{}:*", self.prefix, self.collection)
    }
}

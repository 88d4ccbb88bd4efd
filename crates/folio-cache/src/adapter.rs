//! Cache adapter contract.

use async_trait::async_trait;
use folio_core::{FolioError, FolioResult};
use shaku::Interface;
use std::time::Duration;

/// Key-value store with per-entry TTL.
///
/// Values are JSON strings so the trait stays dyn-compatible; [`CacheExt`]
/// adds typed access on top.
#[async_trait]
pub trait CacheAdapter: Interface + Send + Sync {
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> FolioResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> FolioResult<()>;

    /// Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> FolioResult<bool>;

    /// Whether [`CacheAdapter::clear`] is available.
    fn supports_clear(&self) -> bool {
        false
    }

    /// Deletes every key matching a glob pattern (`*` and `?`).
    async fn clear(&self, pattern: &str) -> FolioResult<u64> {
        Err(FolioError::cache(format!(
            "pattern delete of '{}' is not supported by this adapter",
            pattern
        )))
    }

    fn is_enabled(&self) -> bool;
}

/// Typed get/set for any [`CacheAdapter`].
#[async_trait]
pub trait CacheExt: CacheAdapter {
    /// Returns `Ok(None)` on a miss. A stored value that does not
    /// deserialize as `T` is an error.
    async fn get<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> FolioResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| FolioError::cache(format!("corrupt entry '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    async fn set<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> FolioResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, ttl).await
    }
}

impl<T: CacheAdapter + ?Sized> CacheExt for T {}

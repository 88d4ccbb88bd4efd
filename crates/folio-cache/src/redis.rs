//! Redis-based cache adapter.

use crate::adapter::CacheAdapter;
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Pool};
use folio_core::{FolioError, FolioResult};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Keys fetched per `SCAN` round trip.
const SCAN_BATCH: usize = 500;

/// Redis adapter over a `deadpool-redis` pool.
#[derive(Component)]
#[shaku(interface = CacheAdapter)]
pub struct RedisCacheAdapter {
    /// Redis connection pool; `None` disables the adapter.
    #[shaku(default)]
    pool: Option<Arc<Pool>>,
}

impl RedisCacheAdapter {
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// A no-op adapter, used when caching is disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    async fn get_conn(&self) -> FolioResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool
                .get()
                .await
                .map_err(|e| FolioError::cache(format!("Failed to get Redis connection: {}", e))),
            None => Err(FolioError::cache("Cache is disabled")),
        }
    }
}

#[async_trait]
impl CacheAdapter for RedisCacheAdapter {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> FolioResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| FolioError::cache(format!("Failed to get key '{}': {}", key, e)))?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> FolioResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| FolioError::cache(format!("Failed to set key '{}': {}", key, e)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> FolioResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| FolioError::cache(format!("Failed to delete key '{}': {}", key, e)))?;
        Ok(deleted > 0)
    }

    fn supports_clear(&self) -> bool {
        self.is_enabled()
    }

    async fn clear(&self, pattern: &str) -> FolioResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| FolioError::cache(format!("Failed to scan keys: {}", e)))?;

            if !keys.is_empty() {
                let deleted: i64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| FolioError::cache(format!("Failed to delete keys: {}", e)))?;
                removed += deleted.max(0) as u64;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Deleted {} keys matching pattern '{}'", removed, pattern);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_adapter_is_a_no_op() {
        let cache = RedisCacheAdapter::disabled();
        assert!(!cache.is_enabled());
        assert!(!cache.supports_clear());
        assert!(cache.get_raw("k").await.unwrap().is_none());
        cache.set_raw("k", "v", Duration::from_secs(1)).await.unwrap();
        assert!(!cache.delete("k").await.unwrap());
        assert_eq!(cache.clear("*").await.unwrap(), 0);
    }
}

//! Adapter construction from configuration.

use crate::adapter::CacheAdapter;
use crate::memory::MemoryCacheAdapter;
use crate::redis::{RedisCacheAdapter, RedisCacheAdapterParameters};
use deadpool_redis::{Config, Pool, Runtime};
use folio_config::{CacheBackend, CacheConfig, RedisConfig};
use folio_core::{FolioError, FolioResult};
use shaku::{module, HasComponent};
use std::sync::Arc;
use tracing::info;

module! {
    pub CacheModule {
        components = [RedisCacheAdapter],
        providers = []
    }
}

/// Create a Redis connection pool and check it with `PING`.
pub async fn create_pool(config: &RedisConfig) -> FolioResult<Pool> {
    info!("Creating Redis connection pool for cache...");

    let pool = Config::from_url(config.url.clone())
        .builder()
        .map_err(|e| FolioError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| FolioError::Configuration(format!("Failed to create pool: {}", e)))?;

    let mut conn = pool
        .get()
        .await
        .map_err(|e| FolioError::cache(format!("Failed to get Redis connection: {}", e)))?;
    let _: String = deadpool_redis::redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| FolioError::cache(format!("Redis PING failed: {}", e)))?;

    info!("Redis connection pool created successfully");
    Ok(pool)
}

/// Builds the adapter selected by `cache.backend`.
///
/// A disabled cache yields a no-op adapter.
pub async fn build_adapter(cache: &CacheConfig, redis: &RedisConfig) -> FolioResult<Arc<dyn CacheAdapter>> {
    if !cache.enabled {
        info!("Cache disabled; using no-op adapter");
        return Ok(Arc::new(RedisCacheAdapter::disabled()));
    }

    match cache.backend {
        CacheBackend::Memory => {
            info!(max_entries = cache.memory_max_entries, "Using in-memory cache adapter");
            Ok(Arc::new(MemoryCacheAdapter::new(cache.memory_max_entries)))
        }
        CacheBackend::Redis => {
            let pool = create_pool(redis).await?;
            let module = CacheModule::builder()
                .with_component_parameters::<RedisCacheAdapter>(RedisCacheAdapterParameters {
                    pool: Some(Arc::new(pool)),
                })
                .build();
            let adapter: Arc<dyn CacheAdapter> = module.resolve();
            Ok(adapter)
        }
    }
}

//! Cache control capability and the cache-aware repository.

use crate::adapter::CacheAdapter;
use crate::di::build_adapter;
use crate::metrics::register_metrics;
use crate::plugin::CacheAsidePlugin;
use crate::stats::CacheStatsSnapshot;
use async_trait::async_trait;
use folio_config::AppConfig;
use folio_core::{DocumentId, FolioResult};
use folio_repository::Repository;
use std::ops::Deref;
use std::sync::Arc;
use tracing::info;

/// Manual cache control, e.g. after writes made outside the repository.
///
/// None of these fail: adapter errors are logged and counted.
#[async_trait]
pub trait Cacheable: Send + Sync {
    /// Removes one document's entry. Returns whether an entry existed.
    async fn invalidate_cache(&self, id: &DocumentId) -> bool;

    /// Orphans every cached list of the collection. Returns the new version.
    async fn invalidate_list_cache(&self) -> u64;

    /// Removes every entry of the collection, or bumps the list version
    /// when the adapter cannot delete by pattern. Returns the number of
    /// keys removed.
    async fn invalidate_all_cache(&self) -> u64;

    fn cache_stats(&self) -> CacheStatsSnapshot;
}

/// A [`Repository`] with a [`CacheAsidePlugin`] attached.
///
/// Dereferences to the repository, so reads and writes are called on it
/// directly.
#[derive(Debug, Clone)]
pub struct CachedRepository {
    repository: Arc<Repository>,
    plugin: Arc<CacheAsidePlugin>,
}

impl CachedRepository {
    /// Bootstraps `plugin` and attaches it to `repository`.
    pub async fn attach(repository: Arc<Repository>, plugin: CacheAsidePlugin) -> Self {
        let plugin = Arc::new(plugin);
        plugin.bootstrap().await;
        repository.hooks().on(plugin.clone());
        info!(collection = %repository.collection(), "Cache-aside attached");
        Self { repository, plugin }
    }

    /// Attaches a plugin over `adapter` configured from `config.cache`.
    pub async fn with_adapter(
        repository: Arc<Repository>,
        adapter: Arc<dyn CacheAdapter>,
        config: &AppConfig,
    ) -> FolioResult<Self> {
        if config.observability.metrics_enabled {
            register_metrics();
        }
        let plugin = CacheAsidePlugin::new(repository.collection(), adapter, &config.cache)?
            .with_metrics(config.observability.metrics_enabled);
        Ok(Self::attach(repository, plugin).await)
    }

    /// Builds the configured adapter and attaches a plugin over it.
    pub async fn from_config(repository: Arc<Repository>, config: &AppConfig) -> FolioResult<Self> {
        let adapter = build_adapter(&config.cache, &config.redis).await?;
        Self::with_adapter(repository, adapter, config).await
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<Repository> {
        &self.repository
    }

    #[must_use]
    pub fn plugin(&self) -> &Arc<CacheAsidePlugin> {
        &self.plugin
    }
}

impl Deref for CachedRepository {
    type Target = Repository;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

#[async_trait]
impl Cacheable for CachedRepository {
    async fn invalidate_cache(&self, id: &DocumentId) -> bool {
        self.plugin.invalidate_cache(id).await
    }

    async fn invalidate_list_cache(&self) -> u64 {
        self.plugin.invalidate_list_cache().await
    }

    async fn invalidate_all_cache(&self) -> u64 {
        self.plugin.invalidate_all_cache().await
    }

    fn cache_stats(&self) -> CacheStatsSnapshot {
        self.plugin.cache_stats()
    }
}

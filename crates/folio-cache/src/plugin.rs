//! Cache-aside lifecycle hook.

use crate::adapter::{CacheAdapter, CacheExt};
use crate::cacheable::Cacheable;
use crate::keys::CacheKeys;
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::version::CollectionVersion;
use async_trait::async_trait;
use folio_config::CacheConfig;
use folio_core::{Document, DocumentId, FolioResult, ListResult};
use folio_repository::{AfterEvent, BeforeEvent, HookContext, HookResult, LifecycleHook};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Serves reads from a [`CacheAdapter`] and invalidates on writes.
///
/// - single-document reads are cached under an id-only key that `update`
///   and `delete` remove directly;
/// - list reads are cached under a key embedding the collection version,
///   which every write bumps;
/// - adapter failures are logged and treated as a miss or no-op.
pub struct CacheAsidePlugin {
    keys: CacheKeys,
    adapter: Arc<dyn CacheAdapter>,
    version: Arc<CollectionVersion>,
    stats: CacheStats,
    config: CacheConfig,
}

impl CacheAsidePlugin {
    /// Fails if `collection` cannot be used in cache keys.
    pub fn new(
        collection: impl Into<String>,
        adapter: Arc<dyn CacheAdapter>,
        config: &CacheConfig,
    ) -> FolioResult<Self> {
        let collection = collection.into();
        Ok(Self {
            keys: CacheKeys::new(config.key_prefix.clone(), collection.clone())?,
            adapter,
            version: Arc::new(CollectionVersion::default()),
            stats: CacheStats::new(collection, false),
            config: config.clone(),
        })
    }

    /// Uses a caller-owned version cell instead of a private one.
    #[must_use]
    pub fn with_version(mut self, version: Arc<CollectionVersion>) -> Self {
        self.version = version;
        self
    }

    /// Mirrors counters to the `metrics` facade.
    #[must_use]
    pub fn with_metrics(mut self, publish: bool) -> Self {
        self.stats = CacheStats::new(self.keys.collection().to_string(), publish);
        self
    }

    #[must_use]
    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    #[must_use]
    pub fn version(&self) -> &Arc<CollectionVersion> {
        &self.version
    }

    /// Seeds the version cell from the adapter. A missing or unreadable
    /// value leaves the cell unchanged.
    pub async fn bootstrap(&self) -> u64 {
        let key = self.keys.version();
        let seen = match self.adapter.get_raw(&key).await {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(seen) => Some(seen),
                Err(e) => {
                    warn!(key = %key, "Ignoring unparsable collection version: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.stats.record_error("bootstrap");
                warn!(key = %key, "Failed to read collection version: {}", e);
                None
            }
        };

        let version = match seen {
            Some(seen) => self.version.observe(seen),
            None => self.version.current(),
        };
        info!(collection = %self.keys.collection(), version, "Cache-aside plugin bootstrapped");
        version
    }

    async fn lookup<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match self.adapter.get::<T>(key).await {
            Ok(Some(value)) => {
                self.stats.record_hit();
                debug!("Cache hit for key '{}'", key);
                Some(value)
            }
            Ok(None) => {
                self.stats.record_miss();
                debug!("Cache miss for key '{}'", key);
                None
            }
            Err(e) => {
                self.stats.record_error("get");
                self.stats.record_miss();
                warn!("Cache read of '{}' failed, querying the store: {}", key, e);
                None
            }
        }
    }

    async fn store<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) {
        match self.adapter.set(key, value, ttl).await {
            Ok(()) => {
                self.stats.record_set();
                debug!("Cached key '{}' with TTL {}s", key, ttl.as_secs());
            }
            Err(e) => {
                self.stats.record_error("set");
                warn!("Cache write of '{}' failed: {}", key, e);
            }
        }
    }

    async fn persist_version(&self, version: u64) {
        let key = self.keys.version();
        let result = self
            .adapter
            .set_raw(&key, &version.to_string(), self.config.version_ttl())
            .await;
        if let Err(e) = result {
            self.stats.record_error("persist_version");
            warn!(key = %key, version, "Failed to persist collection version: {}", e);
        }
    }

    async fn bump_version(&self) -> u64 {
        let version = self.version.bump();
        self.stats.record_invalidation("version");
        debug!(collection = %self.keys.collection(), version, "List cache version bumped");
        self.persist_version(version).await;
        version
    }

    async fn drop_by_id(&self, id: &DocumentId) -> bool {
        let key = self.keys.by_id(id);
        match self.adapter.delete(&key).await {
            Ok(existed) => {
                self.stats.record_invalidation("entry");
                existed
            }
            Err(e) => {
                self.stats.record_error("delete");
                warn!("Failed to delete cache key '{}': {}", key, e);
                false
            }
        }
    }

    fn bypassed(&self, ctx: &HookContext) -> bool {
        !self.config.enabled || ctx.skip_cache
    }
}

#[async_trait]
impl LifecycleHook for CacheAsidePlugin {
    fn name(&self) -> &str {
        "cache-aside"
    }

    async fn before(&self, event: &BeforeEvent<'_>, ctx: &mut HookContext) -> FolioResult<()> {
        if self.bypassed(ctx) {
            return Ok(());
        }

        match *event {
            BeforeEvent::GetById { id, options } => {
                if options.is_shaped() {
                    return Ok(());
                }
                let key = self.keys.by_id(id);
                if let Some(doc) = self.lookup::<Document>(&key).await {
                    ctx.serve_from_cache(HookResult::Document(doc));
                }
                ctx.cache_key = Some(key);
            }
            BeforeEvent::GetByQuery { filter, options } => {
                let key = match self.keys.by_query(filter, options) {
                    Ok(key) => key,
                    Err(e) => {
                        warn!("Cannot build query cache key, bypassing cache: {}", e);
                        return Ok(());
                    }
                };
                if let Some(doc) = self.lookup::<Document>(&key).await {
                    ctx.serve_from_cache(HookResult::Document(doc));
                }
                ctx.cache_key = Some(key);
            }
            BeforeEvent::GetAll { query } => {
                if let Some(limit) = query.requested_limit() {
                    if limit > self.config.max_list_limit {
                        debug!(limit, max = self.config.max_list_limit, "List limit above cache ceiling");
                        return Ok(());
                    }
                }
                let key = match self.keys.list(self.version.current(), &query.mode) {
                    Ok(key) => key,
                    Err(e) => {
                        warn!("Cannot build list cache key, bypassing cache: {}", e);
                        return Ok(());
                    }
                };
                if let Some(list) = self.lookup::<ListResult>(&key).await {
                    ctx.serve_from_cache(HookResult::List(list));
                }
                ctx.cache_key = Some(key);
            }
            _ => {}
        }
        Ok(())
    }

    async fn after(&self, event: &AfterEvent<'_>, ctx: &mut HookContext) -> FolioResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        match *event {
            AfterEvent::GetById { result, .. } | AfterEvent::GetByQuery { result, .. } => {
                if ctx.served_from_cache() {
                    return Ok(());
                }
                let ttl = if matches!(event, AfterEvent::GetById { .. }) {
                    self.config.by_id_ttl()
                } else {
                    self.config.query_ttl()
                };
                if let (Some(key), Some(doc)) = (ctx.cache_key.as_deref(), result) {
                    self.store(key, doc, ttl).await;
                }
            }
            AfterEvent::GetAll { result, .. } => {
                if ctx.served_from_cache() {
                    return Ok(());
                }
                if let Some(key) = ctx.cache_key.as_deref() {
                    self.store(key, result, self.config.list_ttl()).await;
                }
            }
            AfterEvent::Create { .. }
            | AfterEvent::CreateMany { .. }
            | AfterEvent::UpdateMany { .. }
            | AfterEvent::DeleteMany { .. } => {
                self.bump_version().await;
            }
            AfterEvent::Update { id, .. } | AfterEvent::Delete { id, .. } => {
                self.drop_by_id(id).await;
                self.bump_version().await;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Cacheable for CacheAsidePlugin {
    async fn invalidate_cache(&self, id: &DocumentId) -> bool {
        let existed = self.drop_by_id(id).await;
        info!(collection = %self.keys.collection(), id = %id, existed, "Document cache invalidated");
        existed
    }

    async fn invalidate_list_cache(&self) -> u64 {
        let version = self.bump_version().await;
        info!(collection = %self.keys.collection(), version, "List cache invalidated");
        version
    }

    async fn invalidate_all_cache(&self) -> u64 {
        if self.adapter.supports_clear() {
            match self.adapter.clear(&self.keys.pattern()).await {
                Ok(removed) => {
                    self.stats.record_invalidation("clear");
                    // The wipe removed the persisted version too.
                    self.persist_version(self.version.current()).await;
                    info!(collection = %self.keys.collection(), removed, "Collection cache wiped");
                    return removed;
                }
                Err(e) => {
                    self.stats.record_error("clear");
                    warn!("Pattern delete failed, falling back to a version bump: {}", e);
                }
            }
        }
        let version = self.bump_version().await;
        info!(
            collection = %self.keys.collection(),
            version,
            "Collection cache invalidated by version bump"
        );
        0
    }

    fn cache_stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.version.current())
    }
}

impl std::fmt::Debug for CacheAsidePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAsidePlugin")
            .field("keys", &self.keys)
            .field("version", &self.version.current())
            .field("enabled", &self.config.enabled)
            .finish_non_exhaustive()
    }
}

//! # Folio Cache
//!
//! Cache-aside for [`folio_repository::Repository`]:
//!
//! ```text
//! before:getById / getByQuery / getAll ──→ CacheAdapter::get   (hit → served)
//! after:getById / getByQuery / getAll  ──→ CacheAdapter::set   (miss → stored)
//! after:create / *Many                 ──→ CollectionVersion::bump
//! after:update / delete                ──→ delete by-id key + bump
//! ```
//!
//! List keys embed the collection version, so one increment orphans every
//! cached list of the collection. Orphaned entries are never deleted; they
//! expire through their TTL.
//!
//! The cache never fails a caller: adapter errors are logged, counted and
//! handled as a miss or a no-op.

pub mod adapter;
pub mod cacheable;
pub mod di;
pub mod keys;
pub mod memory;
pub mod metrics;
pub mod plugin;
pub mod redis;
pub mod stats;
pub mod version;

pub use adapter::{CacheAdapter, CacheExt};
pub use cacheable::{Cacheable, CachedRepository};
pub use di::{build_adapter, create_pool, CacheModule};
pub use keys::{fingerprint, CacheKeys};
pub use memory::MemoryCacheAdapter;
pub use self::metrics::{register_metrics, CacheMetrics};
pub use plugin::CacheAsidePlugin;
pub use redis::{RedisCacheAdapter, RedisCacheAdapterParameters};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use version::CollectionVersion;

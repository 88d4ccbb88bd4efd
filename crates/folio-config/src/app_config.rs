//! Application configuration structures.

use folio_core::telemetry::{LogFormat, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Pagination engine configuration.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Cache-aside configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Redis configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "folio".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Pagination engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the caller does not pass one.
    pub default_limit: u64,
    /// Largest page size a caller may request.
    pub max_limit: u64,
    /// Offset pages beyond this number carry a keyset advisory.
    pub deep_page_threshold: u64,
    /// Cursor format version stamped into and required from cursors.
    pub cursor_version: u32,
    /// Name of the unique identifier field used as keyset tiebreaker.
    pub id_field: String,
    /// Use the store's estimated count for unfiltered offset queries.
    pub estimated_count_when_unfiltered: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            deep_page_threshold: 100,
            cursor_version: 1,
            id_field: "_id".to_string(),
            estimated_count_when_unfiltered: false,
        }
    }
}

/// Cache backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

/// Cache-aside configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the cache-aside plugin.
    pub enabled: bool,
    /// Which adapter stores entries.
    pub backend: CacheBackend,
    /// Namespace prefix for every key.
    pub key_prefix: String,
    /// TTL of single-document entries in seconds.
    pub by_id_ttl_secs: u64,
    /// TTL of find-one-by-filter entries in seconds.
    pub query_ttl_secs: u64,
    /// TTL of list entries in seconds.
    pub list_ttl_secs: u64,
    /// TTL of the persisted collection version in seconds.
    pub version_ttl_secs: u64,
    /// List requests with a larger limit bypass the cache.
    pub max_list_limit: u64,
    /// Capacity of the in-memory adapter.
    pub memory_max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Memory,
            key_prefix: "folio:cache".to_string(),
            by_id_ttl_secs: 300,       // 5 minutes
            query_ttl_secs: 60,        // 1 minute
            list_ttl_secs: 120,        // 2 minutes
            version_ttl_secs: 2_592_000, // 30 days
            max_list_limit: 100,
            memory_max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    /// Returns the single-document TTL as a Duration.
    #[must_use]
    pub const fn by_id_ttl(&self) -> Duration {
        Duration::from_secs(self.by_id_ttl_secs)
    }

    /// Returns the find-one TTL as a Duration.
    #[must_use]
    pub const fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_secs)
    }

    /// Returns the list TTL as a Duration.
    #[must_use]
    pub const fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }

    /// Returns the version TTL as a Duration.
    #[must_use]
    pub const fn version_ttl(&self) -> Duration {
        Duration::from_secs(self.version_ttl_secs)
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL.
    pub url: String,
    /// Connection pool size.
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: LogFormat,
    /// Publish cache counters through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

impl ObservabilityConfig {
    /// Returns the settings used to install the tracing subscriber.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

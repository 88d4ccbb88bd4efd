//! Cumulative cache counters.

use crate::metrics::CacheMetrics;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process counters of one plugin, optionally mirrored to `metrics`.
#[derive(Debug)]
pub struct CacheStats {
    collection: String,
    publish: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    invalidations: AtomicU64,
    errors: AtomicU64,
}

impl CacheStats {
    #[must_use]
    pub fn new(collection: impl Into<String>, publish: bool) -> Self {
        Self {
            collection: collection.into(),
            publish,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if self.publish {
            CacheMetrics::hit(&self.collection);
        }
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        if self.publish {
            CacheMetrics::miss(&self.collection);
        }
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        if self.publish {
            CacheMetrics::set(&self.collection);
        }
    }

    pub fn record_invalidation(&self, kind: &'static str) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        if self.publish {
            CacheMetrics::invalidation(&self.collection, kind);
        }
    }

    pub fn record_error(&self, operation: &'static str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        if self.publish {
            CacheMetrics::error(&self.collection, operation);
        }
    }

    #[must_use]
    pub fn snapshot(&self, version: u64) -> CacheStatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let reads = hits + misses;
        CacheStatsSnapshot {
            collection: self.collection.clone(),
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            version,
            hit_rate: if reads == 0 { 0.0 } else { hits as f64 / reads as f64 },
        }
    }
}

/// Point-in-time view of [`CacheStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsSnapshot {
    pub collection: String,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub errors: u64,
    /// Current list version of the collection.
    pub version: u64,
    /// `hits / (hits + misses)`, or 0 before the first read.
    pub hit_rate: f64,
}

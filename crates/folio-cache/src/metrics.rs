//! Cache metrics published through the `metrics` facade.

use metrics::{counter, describe_counter};

/// Metric names for the cache-aside layer.
pub mod names {
    /// Reads served from the cache.
    pub const HITS_TOTAL: &str = "folio_cache_hits_total";
    /// Reads that fell through to the store.
    pub const MISSES_TOTAL: &str = "folio_cache_misses_total";
    /// Entries written.
    pub const SETS_TOTAL: &str = "folio_cache_sets_total";
    /// By-id deletions, version bumps and wipes.
    pub const INVALIDATIONS_TOTAL: &str = "folio_cache_invalidations_total";
    /// Adapter failures that were swallowed.
    pub const ERRORS_TOTAL: &str = "folio_cache_errors_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::HITS_TOTAL, "Total number of reads served from the cache");
    describe_counter!(names::MISSES_TOTAL, "Total number of reads that missed the cache");
    describe_counter!(names::SETS_TOTAL, "Total number of cache entries written");
    describe_counter!(
        names::INVALIDATIONS_TOTAL,
        "Total number of cache invalidations (entry deletes and version bumps)"
    );
    describe_counter!(
        names::ERRORS_TOTAL,
        "Total number of cache adapter errors handled as a miss or no-op"
    );
}

/// Cache metrics recorder.
#[derive(Clone)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn hit(collection: &str) {
        counter!(names::HITS_TOTAL, "collection" => collection.to_string()).increment(1);
    }

    pub fn miss(collection: &str) {
        counter!(names::MISSES_TOTAL, "collection" => collection.to_string()).increment(1);
    }

    pub fn set(collection: &str) {
        counter!(names::SETS_TOTAL, "collection" => collection.to_string()).increment(1);
    }

    pub fn invalidation(collection: &str, kind: &'static str) {
        counter!(
            names::INVALIDATIONS_TOTAL,
            "collection" => collection.to_string(),
            "kind" => kind
        )
        .increment(1);
    }

    pub fn error(collection: &str, operation: &'static str) {
        counter!(
            names::ERRORS_TOTAL,
            "collection" => collection.to_string(),
            "operation" => operation
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_a_no_op() {
        register_metrics();
        CacheMetrics::hit("products");
        CacheMetrics::miss("products");
        CacheMetrics::set("products");
        CacheMetrics::invalidation("products", "version");
        CacheMetrics::error("products", "get");
    }
}

//! Per-collection list version.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter embedded in list cache keys.
///
/// Each collection owns one cell. Bumping it makes every list key built
/// under the previous value unreachable. The in-process value is
/// authoritative once bootstrapped; the adapter copy only seeds new
/// processes, so a crash between a bump and its persist can move the
/// version backwards on restart. That costs a burst of misses, never a
/// wrong read.
#[derive(Debug, Default)]
pub struct CollectionVersion {
    value: AtomicU64,
}

impl CollectionVersion {
    #[must_use]
    pub const fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
        }
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Increments the version and returns the new value.
    pub fn bump(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Raises the version to `seen` if it is ahead. Never lowers it.
    pub fn observe(&self, seen: u64) -> u64 {
        self.value.fetch_max(seen, Ordering::AcqRel).max(seen)
    }

    /// Sets the version to zero.
    pub fn reset(&self) {
        self.value.store(0, Ordering::Release);
    }
}

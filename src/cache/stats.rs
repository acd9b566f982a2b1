//! Cache Statistics Module
//!
//! Per-instance counters for hits, misses, writes, deletes and absorbed errors.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of an instance's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that found a value
    pub hits: u64,
    /// Reads that found nothing (missing, expired or undecodable)
    pub misses: u64,
    /// Confirmed writes (a batched write counts once per entry)
    pub sets: u64,
    /// Keys actually removed by `del`
    pub deletes: u64,
    /// Backing-store or factory failures absorbed by the facade
    pub errors: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by clones of one facade instance.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sets(&self, count: u64) {
        self.sets.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter into a snapshot.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StatsRecorder::new().snapshot();
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let recorder = StatsRecorder::new();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_hit();
        assert_eq!(recorder.snapshot().hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let recorder = StatsRecorder::new();
        recorder.record_hit();
        recorder.record_miss();
        assert_eq!(recorder.snapshot().hit_rate(), 0.5);
    }

    #[test]
    fn test_write_counters() {
        let recorder = StatsRecorder::new();
        recorder.record_sets(3);
        recorder.record_delete();
        recorder.record_error();
        recorder.record_error();

        let stats = recorder.snapshot();
        assert_eq!(stats.sets, 3);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.errors, 2);
    }
}

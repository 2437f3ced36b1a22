//! Cache statistics tracking and reporting.

use std::path::PathBuf;
use std::time::Instant;

use super::eviction::CleaningReport;
use crate::config::format_size;

/// Cache statistics for monitoring and debugging.
#[derive(Debug, Clone)]
pub struct CacheStats {
    // Lookup metrics
    pub hits: u64,
    pub misses: u64,

    // Render metrics
    pub renders: u64,
    pub render_failures: u64,

    // Write metrics
    pub persistent_writes: u64,
    pub scratch_writes: u64,
    pub bytes_written: u64,

    // Cleaning metrics
    pub cleaning_passes: u64,
    pub rate_limited_passes: u64,
    pub files_evicted: u64,

    // Current state, filled in when a snapshot is taken
    pub current_size_bytes: u64,
    pub max_size_bytes: u64,
    pub cache_enabled: bool,
    pub persistent_root: PathBuf,

    // Timing
    pub created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            hits: 0,
            misses: 0,
            renders: 0,
            render_failures: 0,
            persistent_writes: 0,
            scratch_writes: 0,
            bytes_written: 0,
            cleaning_passes: 0,
            rate_limited_passes: 0,
            files_evicted: 0,
            current_size_bytes: 0,
            max_size_bytes: 0,
            cache_enabled: false,
            persistent_root: PathBuf::new(),
            created_at: Instant::now(),
        }
    }

    /// Calculate the lookup hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get the uptime duration since statistics started.
    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_render(&mut self) {
        self.renders += 1;
    }

    pub fn record_render_failure(&mut self) {
        self.render_failures += 1;
    }

    /// Record a persistent write of `bytes`.
    pub fn record_persistent_write(&mut self, bytes: u64) {
        self.persistent_writes += 1;
        self.bytes_written += bytes;
    }

    /// Record a scratch write of `bytes`.
    pub fn record_scratch_write(&mut self, bytes: u64) {
        self.scratch_writes += 1;
        self.bytes_written += bytes;
    }

    /// Fold a cleaning pass into the totals.
    pub fn record_cleaning(&mut self, report: &CleaningReport) {
        self.cleaning_passes += 1;
        if report.rate_limited {
            self.rate_limited_passes += 1;
        }
        self.files_evicted += report.files_deleted;
    }

    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            r#"Tile Cache Statistics
Root: {}

LOOKUPS
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%

RENDERS
  Total:       {}
  Failures:    {}

WRITES
  Persistent:  {}
  Scratch:     {}
  Bytes:       {}

SIZE
  Current:     {}
  Maximum:     {}
  Caching:     {}

CLEANING
  Passes:      {}
  Rate-limited: {}
  Evicted:     {}
  Uptime:      {}s
"#,
            self.persistent_root.display(),
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.renders,
            self.render_failures,
            self.persistent_writes,
            self.scratch_writes,
            format_size(self.bytes_written),
            format_size(self.current_size_bytes),
            format_size(self.max_size_bytes),
            if self.cache_enabled { "enabled" } else { "disabled" },
            self.cleaning_passes,
            self.rate_limited_passes,
            self.files_evicted,
            self.uptime().as_secs(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.hits = 75;
        stats.misses = 25;

        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_writes() {
        let mut stats = CacheStats::new();
        stats.record_persistent_write(40_960);
        stats.record_scratch_write(100);

        assert_eq!(stats.persistent_writes, 1);
        assert_eq!(stats.scratch_writes, 1);
        assert_eq!(stats.bytes_written, 41_060);
    }

    #[test]
    fn test_record_cleaning() {
        let mut stats = CacheStats::new();
        stats.record_cleaning(&CleaningReport {
            files_deleted: 3,
            ..CleaningReport::default()
        });
        stats.record_cleaning(&CleaningReport {
            rate_limited: true,
            ..CleaningReport::default()
        });

        assert_eq!(stats.cleaning_passes, 2);
        assert_eq!(stats.rate_limited_passes, 1);
        assert_eq!(stats.files_evicted, 3);
    }

    #[test]
    fn test_format_mentions_root_and_hit_rate() {
        let mut stats = CacheStats::new();
        stats.hits = 9;
        stats.misses = 1;
        stats.persistent_root = PathBuf::from("/cache/mapcache");

        let text = stats.format();
        assert!(text.contains("/cache/mapcache"));
        assert!(text.contains("90.0%"));
    }
}

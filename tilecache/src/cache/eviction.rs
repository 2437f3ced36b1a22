//! Size accounting and cleaning passes.
//!
//! # Design
//!
//! The persistent root is bounded by two triggers evaluated after every
//! persistent write and whenever the root is (re)created:
//!
//! - The availability check suspends caching when usable space is at or
//!   below the clean trigger, and shrinks the cap when the medium cannot hold
//!   what remains of it.
//! - The size check runs a cleaning pass when the cache reached its cap or
//!   usable space is at or below the clean trigger.
//!
//! A cleaning pass sweeps files by modification time, which lookups refresh,
//! so the sweep approximates LRU. Passes closer together than
//! [`CLEANING_COOLDOWN_MS`] do not sweep; they grow the cap by
//! [`CAP_GROWTH_BYTES`] instead. Writes are never refused ahead of time: a
//! write may overshoot the cap and the next check corrects it.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::storage::StorageLocationResolver;
use super::walk::{self, SweepResult};
use crate::config::{CacheConfiguration, CAP_GROWTH_BYTES, CLEANING_COOLDOWN_MS};
use crate::time::Clock;

/// Mutable bookkeeping shared by the store and the eviction engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheState {
    /// Running total of persistent file sizes; resynced from disk after every pass
    pub current_size_bytes: u64,
    /// When the last cleaning pass ran, in epoch milliseconds
    pub last_cleaning_millis: Option<u64>,
    /// Caching is suspended by the engine (low space or a pass in progress)
    pub suspended: bool,
}

/// Result of a cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    /// The pass ran inside the cooldown and grew the cap instead of sweeping
    pub rate_limited: bool,
    /// Files deleted by the age sweep
    pub files_deleted: u64,
    /// Bytes freed by the age sweep
    pub bytes_freed: u64,
    /// Directories the sweep left empty and removed
    pub dirs_removed: u64,
    /// Counter value before the pass
    pub size_before: u64,
    /// Counter value after the rescan
    pub size_after: u64,
    /// Cap after the pass (grown when rate-limited, possibly shrunk to fit the medium)
    pub max_size_after: u64,
    /// Files removed from the scratch root
    pub scratch_files_purged: u64,
    /// Duration of the pass in milliseconds
    pub duration_ms: u64,
}

/// Decides when to clean and performs cleaning passes.
pub struct EvictionEngine {
    clock: Arc<dyn Clock>,
}

impl EvictionEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Adapt to the space physically left on the medium.
    ///
    /// Suspends caching when `usable <= clean trigger`. Shrinks the cap to
    /// `usable + current` when the remaining budget exceeds `usable`.
    pub fn check_cache_availability(
        &self,
        config: &mut CacheConfiguration,
        state: &mut CacheState,
        usable: u64,
    ) {
        if usable <= config.clean_cache_trigger_bytes() {
            if !state.suspended {
                warn!(
                    usable_bytes = usable,
                    clean_trigger_bytes = config.clean_cache_trigger_bytes(),
                    "Not enough free space, caching disabled"
                );
            }
            state.suspended = true;
        }

        let remaining = config
            .max_cache_size_bytes()
            .saturating_sub(state.current_size_bytes);
        if remaining > usable {
            let shrunk = usable.saturating_add(state.current_size_bytes);
            warn!(
                max_size_bytes = config.max_cache_size_bytes(),
                new_max_size_bytes = shrunk,
                usable_bytes = usable,
                "Cache cap exceeds free space, shrinking cap"
            );
            config.set_max_cache_size(shrunk);
        }
    }

    /// Run a cleaning pass if the cache reached its cap or the medium is
    /// nearly full.
    pub fn check_cache_size(
        &self,
        config: &mut CacheConfiguration,
        state: &mut CacheState,
        resolver: &StorageLocationResolver,
    ) -> Option<CleaningReport> {
        let usable = resolver.usable_space();
        let over_cap = state.current_size_bytes >= config.max_cache_size_bytes();
        let low_space = usable <= config.clean_cache_trigger_bytes();

        if !over_cap && !low_space {
            debug!(
                current_size_bytes = state.current_size_bytes,
                max_size_bytes = config.max_cache_size_bytes(),
                "Cache under limit, no cleaning needed"
            );
            return None;
        }

        info!(
            current_size_bytes = state.current_size_bytes,
            max_size_bytes = config.max_cache_size_bytes(),
            usable_bytes = usable,
            over_cap,
            low_space,
            "Starting cleaning pass"
        );
        Some(self.run_cleaning_pass(config, state, resolver))
    }

    /// Suspend caching, clean, resync the counter from disk, resume caching
    /// and empty the scratch root.
    pub fn run_cleaning_pass(
        &self,
        config: &mut CacheConfiguration,
        state: &mut CacheState,
        resolver: &StorageLocationResolver,
    ) -> CleaningReport {
        let start = Instant::now();
        let size_before = state.current_size_bytes;

        state.suspended = true;
        let (rate_limited, sweep) = self.clean_cache(config, state, resolver);
        state.current_size_bytes = walk::directory_size(resolver.persistent_root());
        state.suspended = false;

        let purge = walk::purge_contents(&resolver.scratch_root());

        let report = CleaningReport {
            rate_limited,
            files_deleted: sweep.files_deleted,
            bytes_freed: sweep.bytes_freed,
            dirs_removed: sweep.dirs_removed,
            size_before,
            size_after: state.current_size_bytes,
            max_size_after: config.max_cache_size_bytes(),
            scratch_files_purged: purge.files_removed,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        log_report(&report);
        report
    }

    /// Age sweep with rate limiting.
    ///
    /// Within the cooldown of the previous pass the cap grows by
    /// [`CAP_GROWTH_BYTES`], the availability check re-runs and no file is
    /// swept. Otherwise every file older than `now - max_tile_age` is
    /// deleted. The pass time is recorded either way.
    fn clean_cache(
        &self,
        config: &mut CacheConfiguration,
        state: &mut CacheState,
        resolver: &StorageLocationResolver,
    ) -> (bool, SweepResult) {
        let now = self.clock.now_millis();
        let rate_limited = state
            .last_cleaning_millis
            .is_some_and(|last| now.saturating_sub(last) <= CLEANING_COOLDOWN_MS);

        let sweep = if rate_limited {
            let grown = config
                .max_cache_size_bytes()
                .saturating_add(CAP_GROWTH_BYTES);
            warn!(
                max_size_bytes = config.max_cache_size_bytes(),
                new_max_size_bytes = grown,
                cooldown_ms = CLEANING_COOLDOWN_MS,
                "Cleaning requested again within cooldown, growing cap instead of sweeping"
            );
            config.set_max_cache_size(grown);
            self.check_cache_availability(config, state, resolver.usable_space());
            SweepResult::default()
        } else {
            let cutoff = now.saturating_sub(config.max_tile_age_ms());
            sweep_root(resolver.persistent_root(), cutoff)
        };

        state.last_cleaning_millis = Some(now);
        (rate_limited, sweep)
    }
}

impl std::fmt::Debug for EvictionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvictionEngine")
            .field("now_millis", &self.clock.now_millis())
            .finish()
    }
}

fn sweep_root(root: &Path, cutoff_millis: u64) -> SweepResult {
    debug!(root = %root.display(), cutoff_millis, "Sweeping stale tiles");
    walk::sweep_older_than(root, cutoff_millis)
}

fn log_report(report: &CleaningReport) {
    info!(
        rate_limited = report.rate_limited,
        files_deleted = report.files_deleted,
        bytes_freed = report.bytes_freed,
        size_before = report.size_before,
        size_after = report.size_after,
        max_size_bytes = report.max_size_after,
        scratch_files_purged = report.scratch_files_purged,
        duration_ms = report.duration_ms,
        "Cleaning pass complete"
    );
}

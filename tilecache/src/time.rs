//! Time sources and conversions.
//!
//! The cache measures everything in milliseconds since the Unix epoch so the
//! cleaning cooldown, the age sweep and the freshness markers written to disk
//! all share one timeline. [`Clock`] is the seam that lets tests pin that
//! timeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use filetime::FileTime;

/// Source of "now" for the cache.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        system_time_to_millis(SystemTime::now())
    }
}

/// A clock that only moves when told to.
///
/// Useful for hosts that replay recorded sessions and for tests of the
/// cleaning cooldown.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tilecache::time::{Clock, ManualClock};
///
/// let clock = ManualClock::new(10_000);
/// clock.advance(Duration::from_millis(500));
/// assert_eq!(clock.now_millis(), 10_500);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `start_millis`.
    pub fn new(start_millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(start_millis),
        }
    }

    /// Create a clock reading the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now_millis())
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Set the clock to an absolute reading.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Convert a `SystemTime` to milliseconds since the Unix epoch.
///
/// Times before the epoch map to 0.
pub fn system_time_to_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Convert epoch milliseconds to a `FileTime` for use as a file mtime.
pub fn millis_to_file_time(millis: u64) -> FileTime {
    let secs = (millis / 1000) as i64;
    let nanos = ((millis % 1000) * 1_000_000) as u32;
    FileTime::from_unix_time(secs, nanos)
}

//! Shared fixtures for the tile cache integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::UNIX_EPOCH;

use tempfile::TempDir;

use tilecache::cache::FixedSpaceMedium;
use tilecache::config::{CacheConfiguration, MB};
use tilecache::render::{RenderError, RenderRequest, TileRenderer};
use tilecache::service::TileCache;
use tilecache::time::{millis_to_file_time, ManualClock};

/// Usable space large enough that the availability check never intervenes.
pub const PLENTY_OF_SPACE: u64 = 64 * 1024 * MB;

/// Renderer returning `size` bytes per call and recording every request.
///
/// Each call fills the buffer with the call number so successive renders of
/// the same tile are distinguishable.
#[derive(Clone)]
pub struct RecordingRenderer {
    size: usize,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RenderRequest>>>,
}

impl RecordingRenderer {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RenderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl TileRenderer for RecordingRenderer {
    fn render(&mut self, request: &RenderRequest) -> Result<Option<Vec<u8>>, RenderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        Ok(Some(vec![call as u8; self.size]))
    }

    fn extension(&self) -> &str {
        "png"
    }
}

/// Renderer that always reports an engine failure.
pub struct FailingRenderer;

impl TileRenderer for FailingRenderer {
    fn render(&mut self, _request: &RenderRequest) -> Result<Option<Vec<u8>>, RenderError> {
        Err(RenderError::Failed("map database closed".to_string()))
    }

    fn extension(&self) -> &str {
        "png"
    }
}

/// Renderer that never produces an image.
pub struct EmptyRenderer;

impl TileRenderer for EmptyRenderer {
    fn render(&mut self, _request: &RenderRequest) -> Result<Option<Vec<u8>>, RenderError> {
        Ok(None)
    }

    fn extension(&self) -> &str {
        "png"
    }
}

/// A cache on a temporary medium with a manual clock.
pub struct Harness {
    pub temp: TempDir,
    pub medium: Arc<FixedSpaceMedium>,
    pub clock: Arc<ManualClock>,
    pub cache: TileCache,
}

impl Harness {
    pub fn new(config: CacheConfiguration, renderer: impl TileRenderer + 'static) -> Self {
        Self::with_space(config, renderer, PLENTY_OF_SPACE)
    }

    pub fn with_space(
        config: CacheConfiguration,
        renderer: impl TileRenderer + 'static,
        usable_bytes: u64,
    ) -> Self {
        let temp = TempDir::new().unwrap();
        let medium = Arc::new(FixedSpaceMedium::new(temp.path(), usable_bytes));
        let clock = Arc::new(ManualClock::starting_now());
        let cache = TileCache::builder(config)
            .medium(medium.clone())
            .clock(clock.clone())
            .build(renderer)
            .unwrap();

        Self {
            temp,
            medium,
            clock,
            cache,
        }
    }

    pub fn now(&self) -> u64 {
        use tilecache::time::Clock;
        self.clock.now_millis()
    }
}

/// Set a file's modification time to `millis` since the epoch.
pub fn set_mtime(path: &Path, millis: u64) {
    filetime::set_file_mtime(path, millis_to_file_time(millis)).unwrap();
}

/// A file's modification time in milliseconds since the epoch.
pub fn mtime_millis(path: &Path) -> u64 {
    let modified = fs::metadata(path).unwrap().modified().unwrap();
    modified.duration_since(UNIX_EPOCH).unwrap().as_millis() as u64
}

/// Number of regular files below `root`.
pub fn file_count(root: &Path) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}

//! Tile renderer seam.
//!
//! The cache hands a [`RenderRequest`] to a [`TileRenderer`] on every miss
//! and stores whatever bytes come back. It never looks inside the image.
//!
//! # Example
//!
//! ```
//! use tilecache::coord::TileKey;
//! use tilecache::render::{PlaceholderRenderer, RenderRequest, TileRenderer};
//!
//! let mut renderer = PlaceholderRenderer::new();
//! let request = RenderRequest::new(TileKey::new(1, 2, 3)).with_tile_size(64);
//! let png = renderer.render(&request).unwrap().unwrap();
//!
//! assert_eq!(renderer.extension(), "png");
//! assert_eq!(&png[1..4], b"PNG");
//! ```

mod placeholder;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{DEFAULT_OVERDRAW_FACTOR, DEFAULT_SCREEN_RATIO, DEFAULT_TILE_SIZE};
use crate::coord::TileKey;

pub use placeholder::PlaceholderRenderer;

/// Everything a renderer needs to draw one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub key: TileKey,
    /// Render theme, if one is configured
    pub theme: Option<PathBuf>,
    /// Map data source, if one is configured
    pub map_file: Option<PathBuf>,
    /// Tile edge length in pixels
    pub tile_size: u32,
    pub overdraw_factor: f32,
    pub screen_ratio: f32,
}

impl RenderRequest {
    /// Request for `key` with default display parameters and no theme.
    pub fn new(key: TileKey) -> Self {
        Self {
            key,
            theme: None,
            map_file: None,
            tile_size: DEFAULT_TILE_SIZE,
            overdraw_factor: DEFAULT_OVERDRAW_FACTOR,
            screen_ratio: DEFAULT_SCREEN_RATIO,
        }
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_screen_ratio(mut self, screen_ratio: f32) -> Self {
        self.screen_ratio = screen_ratio;
        self
    }
}

/// Errors a renderer may report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The rendering engine failed
    #[error("Render failed: {0}")]
    Failed(String),

    /// The rendered image could not be encoded
    #[error("Failed to encode tile image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Produces image bytes for a tile.
///
/// Renderers are assumed non-reentrant; the cache calls them from behind its
/// lock, one request at a time, hence `&mut self` and no `Sync` bound.
pub trait TileRenderer: Send {
    /// Render one tile.
    ///
    /// `Ok(None)` means the renderer produced no image; the cache reports it
    /// as a failed lookup.
    fn render(&mut self, request: &RenderRequest) -> Result<Option<Vec<u8>>, RenderError>;

    /// File extension of the produced images, without the leading dot.
    fn extension(&self) -> &str;
}

impl<T: TileRenderer + ?Sized> TileRenderer for Box<T> {
    fn render(&mut self, request: &RenderRequest) -> Result<Option<Vec<u8>>, RenderError> {
        (**self).render(request)
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }
}

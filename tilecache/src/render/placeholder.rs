//! Solid-colour PNG renderer.
//!
//! Stands in for a map rendering engine. Each tile is filled with a colour
//! derived from its key and framed with a one-pixel border, so neighbouring
//! tiles are distinguishable when a host displays them.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use super::{RenderError, RenderRequest, TileRenderer};
use crate::coord::TileKey;

const BORDER: Rgba<u8> = Rgba([64, 64, 64, 255]);

/// Renders solid-colour PNG tiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Edge length in pixels: tile size scaled by the screen ratio, at least 1.
    pub fn edge_pixels(request: &RenderRequest) -> u32 {
        let scaled = (request.tile_size as f32 * request.screen_ratio).round();
        if scaled.is_finite() && scaled >= 1.0 {
            scaled as u32
        } else {
            1
        }
    }
}

fn fill_colour(key: &TileKey) -> Rgba<u8> {
    let r = (key.x.wrapping_mul(37).wrapping_add(key.zoom as u32 * 11) % 256) as u8;
    let g = (key.y.wrapping_mul(53).wrapping_add(key.zoom as u32 * 7) % 256) as u8;
    let b = (key.x ^ key.y).wrapping_mul(29) as u8;
    Rgba([r, g, b, 255])
}

impl TileRenderer for PlaceholderRenderer {
    fn render(&mut self, request: &RenderRequest) -> Result<Option<Vec<u8>>, RenderError> {
        let edge = Self::edge_pixels(request);
        let fill = fill_colour(&request.key);
        let last = edge - 1;

        let image = RgbaImage::from_fn(edge, edge, |x, y| {
            if x == 0 || y == 0 || x == last || y == last {
                BORDER
            } else {
                fill
            }
        });

        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;

        debug!(
            x = request.key.x,
            y = request.key.y,
            zoom = request.key.zoom,
            edge,
            bytes = buffer.len(),
            "Placeholder tile rendered"
        );
        Ok(Some(buffer))
    }

    fn extension(&self) -> &str {
        "png"
    }
}

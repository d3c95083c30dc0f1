//! Screen projection used by order target hints.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, TilePos, TileSize};

/// A position on screen, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPos {
    /// Horizontal pixel.
    pub x: i32,
    /// Vertical pixel.
    pub y: i32,
}

impl ScreenPos {
    /// Create a screen position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The part of one map layer currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Layer being displayed.
    pub map_layer: usize,
    /// Top-left visible tile.
    pub origin: TilePos,
    /// Edge length of a tile at zoom 1.
    pub tile_pixels: i32,
    /// Zoom factor.
    #[serde(with = "fixed_serde")]
    pub zoom: Fixed,
}

impl Viewport {
    /// Unzoomed viewport on `map_layer` starting at `origin`.
    #[must_use]
    pub fn new(map_layer: usize, origin: TilePos, tile_pixels: i32) -> Self {
        Self {
            map_layer,
            origin,
            tile_pixels,
            zoom: Fixed::ONE,
        }
    }

    /// Screen position of the center of a tile.
    #[must_use]
    pub fn tile_center(&self, tile: TilePos) -> ScreenPos {
        self.rect_center(tile, TileSize::ONE)
    }

    /// Screen position of the center of a tile rectangle.
    #[must_use]
    pub fn rect_center(&self, tile: TilePos, size: TileSize) -> ScreenPos {
        let offset = tile - self.origin;
        let size = TileSize::new(size.w.max(1), size.h.max(1));
        let x = offset.x * self.tile_pixels + size.w as i32 * self.tile_pixels / 2;
        let y = offset.y * self.tile_pixels + size.h as i32 * self.tile_pixels / 2;
        ScreenPos::new(self.scale(x), self.scale(y))
    }

    fn scale(&self, pixels: i32) -> i32 {
        (Fixed::from_num(pixels) * self.zoom).to_num::<i32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_center() {
        let viewport = Viewport::new(0, TilePos::new(2, 1), 32);
        assert_eq!(viewport.tile_center(TilePos::new(2, 1)), ScreenPos::new(16, 16));
        assert_eq!(viewport.tile_center(TilePos::new(4, 2)), ScreenPos::new(80, 48));
    }

    #[test]
    fn test_rect_center_and_zoom() {
        let mut viewport = Viewport::new(0, TilePos::ZERO, 32);
        assert_eq!(viewport.rect_center(TilePos::new(1, 1), TileSize::new(2, 2)), ScreenPos::new(64, 64));

        viewport.zoom = Fixed::from_num(0.5);
        assert_eq!(viewport.rect_center(TilePos::new(1, 1), TileSize::new(2, 2)), ScreenPos::new(32, 32));
    }
}

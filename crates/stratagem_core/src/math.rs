//! Tile and fixed-point math utilities.
//!
//! The simulation works on integer tile coordinates. Fixed-point numbers
//! only appear where fractional scaling is unavoidable (viewport zoom) so
//! that no floating-point value ever feeds back into game state.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Integer tile coordinate on a map layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Create a new tile position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The origin tile.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Offset by a tile size's half extent, rounding down.
    ///
    /// This is the tile a multi-tile unit is considered to be "at" when
    /// its last known position is recorded.
    #[must_use]
    pub const fn plus_half(self, size: TileSize) -> Self {
        Self {
            x: self.x + (size.w as i32 - 1) / 2,
            y: self.y + (size.h as i32 - 1) / 2,
        }
    }

    /// Chebyshev distance between two tiles.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl std::ops::Add for TilePos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for TilePos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Footprint of a unit in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileSize {
    /// Width in tiles.
    pub w: u32,
    /// Height in tiles.
    pub h: u32,
}

impl TileSize {
    /// Create a new footprint.
    #[must_use]
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// A single tile.
    pub const ONE: Self = Self { w: 1, h: 1 };

    /// A zero-sized footprint, used for plain positional goals.
    pub const ZERO: Self = Self { w: 0, h: 0 };
}

impl Default for TileSize {
    fn default() -> Self {
        Self::ONE
    }
}

/// Integer square root (floor).
#[must_use]
pub fn isqrt(value: u64) -> u64 {
    if value < 2 {
        return value;
    }

    // Newton iteration, starting from an over-estimate
    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

/// Distance between two tile rectangles.
///
/// Uses the rounded-down euclidean distance of the gaps between the
/// rectangles; adjacent rectangles are at distance 1, overlapping ones at 0.
#[must_use]
pub fn rect_distance(a: TilePos, a_size: TileSize, b: TilePos, b_size: TileSize) -> u32 {
    let dx = gap_between(a.x, a_size.w, b.x, b_size.w);
    let dy = gap_between(a.y, a_size.h, b.y, b_size.h);
    u32::try_from(isqrt(dx * dx + dy * dy)).unwrap_or(u32::MAX)
}

/// Gap between two 1D intervals `[a, a+len_a)` and `[b, b+len_b)`.
fn gap_between(a: i32, len_a: u32, b: i32, len_b: u32) -> u64 {
    let a_end = a + len_a.max(1) as i32 - 1;
    let b_end = b + len_b.max(1) as i32 - 1;
    if a_end < b {
        u64::from(b.abs_diff(a_end))
    } else if b_end < a {
        u64::from(a.abs_diff(b_end))
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(99), 9);
        assert_eq!(isqrt(100), 10);
    }

    #[test]
    fn test_rect_distance_single_tiles() {
        let a = TilePos::new(0, 0);
        assert_eq!(rect_distance(a, TileSize::ONE, TilePos::new(0, 0), TileSize::ONE), 0);
        assert_eq!(rect_distance(a, TileSize::ONE, TilePos::new(1, 0), TileSize::ONE), 1);
        assert_eq!(rect_distance(a, TileSize::ONE, TilePos::new(1, 1), TileSize::ONE), 1);
        assert_eq!(rect_distance(a, TileSize::ONE, TilePos::new(3, 4), TileSize::ONE), 5);
    }

    #[test]
    fn test_rect_distance_large_target() {
        // 3x3 building at (5, 5) covers 5..=7
        let building = TilePos::new(5, 5);
        let size = TileSize::new(3, 3);
        assert_eq!(rect_distance(TilePos::new(4, 6), TileSize::ONE, building, size), 1);
        assert_eq!(rect_distance(TilePos::new(8, 8), TileSize::ONE, building, size), 1);
        assert_eq!(rect_distance(TilePos::new(6, 6), TileSize::ONE, building, size), 0);
        assert_eq!(rect_distance(TilePos::new(10, 6), TileSize::ONE, building, size), 3);
    }

    #[test]
    fn test_rect_distance_symmetric() {
        let a = TilePos::new(2, 9);
        let b = TilePos::new(7, 1);
        let size = TileSize::new(2, 2);
        assert_eq!(
            rect_distance(a, TileSize::ONE, b, size),
            rect_distance(b, size, a, TileSize::ONE)
        );
    }

    #[test]
    fn test_plus_half() {
        let pos = TilePos::new(4, 4);
        assert_eq!(pos.plus_half(TileSize::ONE), pos);
        assert_eq!(pos.plus_half(TileSize::new(3, 3)), TilePos::new(5, 5));
        assert_eq!(pos.plus_half(TileSize::new(2, 2)), TilePos::new(4, 4));
    }

    #[test]
    fn test_chebyshev() {
        assert_eq!(TilePos::new(0, 0).chebyshev(TilePos::new(3, 7)), 7);
        assert_eq!(TilePos::new(-2, 0).chebyshev(TilePos::new(2, 1)), 4);
    }
}

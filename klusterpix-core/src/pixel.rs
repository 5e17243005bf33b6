//! Pixel coordinates, linear pixel keys and the 8-neighbourhood.
//!
//! A pixel key is `cols * y + x` for a frame of fixed `rows x cols`.
//! Neighbour lookup never wraps around the frame boundary.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Linear pixel key (`cols * y + x`).
pub type PixelKey = u32;

/// Side length of the standard Timepix frame.
pub const DEFAULT_FRAME_SIZE: u16 = 256;

/// Largest supported frame side length.
pub const MAX_FRAME_SIZE: u16 = 1024;

/// Neighbour offsets `(dx, dy)`, indexed by [`Direction::index`].
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// One of the eight neighbour directions, starting at west and going clockwise.
///
/// `d` and `d.opposite()` are always four steps apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    West,
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
}

impl Direction {
    /// All directions in table order.
    pub const ALL: [Direction; 8] = [
        Direction::West,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
    ];

    /// Position of this direction in [`NEIGHBOR_OFFSETS`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The `(dx, dy)` step for this direction.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        NEIGHBOR_OFFSETS[self.index()]
    }

    /// The direction pointing back the other way.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Direction {
        Direction::ALL[(self.index() + 4) % 8]
    }
}

/// Pixel coordinate on the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelCoord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl PixelCoord {
    /// Creates a new pixel coordinate.
    #[inline]
    #[must_use]
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Dimensions of a frame, used to convert between keys and coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameGeometry {
    rows: u16,
    cols: u16,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::timepix()
    }
}

impl FrameGeometry {
    /// Creates a geometry of `rows x cols` pixels.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] unless both sides are in `1..=1024`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32, cols: u32) -> Result<Self> {
        let valid = 1..=u32::from(MAX_FRAME_SIZE);
        if !valid.contains(&rows) || !valid.contains(&cols) {
            return Err(Error::InvalidGeometry { rows, cols });
        }
        Ok(Self {
            rows: rows as u16,
            cols: cols as u16,
        })
    }

    /// The standard 256x256 Timepix geometry.
    #[must_use]
    pub const fn timepix() -> Self {
        Self {
            rows: DEFAULT_FRAME_SIZE,
            cols: DEFAULT_FRAME_SIZE,
        }
    }

    /// Number of rows (frame height).
    #[inline]
    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Number of columns (frame width).
    #[inline]
    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Total number of pixels in the frame.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        usize::from(self.rows) * usize::from(self.cols)
    }

    /// Returns true if `(x, y)` lies inside the frame.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        (0..i64::from(self.cols)).contains(&x) && (0..i64::from(self.rows)).contains(&y)
    }

    /// Returns true if `key` addresses a pixel inside the frame.
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: PixelKey) -> bool {
        (key as usize) < self.pixel_count()
    }

    /// Linear key for an in-frame coordinate.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCoordinate`] if `(x, y)` is outside the frame.
    pub fn key(&self, x: u32, y: u32) -> Result<PixelKey> {
        if !self.contains(i64::from(x), i64::from(y)) {
            return Err(Error::InvalidCoordinate { x, y });
        }
        Ok(u32::from(self.cols) * y + x)
    }

    /// Decodes a key into its coordinate. The key must be in frame.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn coord(&self, key: PixelKey) -> PixelCoord {
        let cols = u32::from(self.cols);
        PixelCoord::new((key % cols) as u16, (key / cols) as u16)
    }

    /// Key of the neighbour of `key` in `direction`, if it is inside the frame.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn neighbor(&self, key: PixelKey, direction: Direction) -> Option<PixelKey> {
        let coord = self.coord(key);
        let (dx, dy) = direction.offset();
        let nx = i64::from(coord.x) + i64::from(dx);
        let ny = i64::from(coord.y) + i64::from(dy);
        if !self.contains(nx, ny) {
            return None;
        }
        Some((ny * i64::from(self.cols) + nx) as PixelKey)
    }

    /// All in-frame neighbours of `key`, in direction order.
    pub fn neighbors(&self, key: PixelKey) -> impl Iterator<Item = (Direction, PixelKey)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.neighbor(key, direction).map(|n| (direction, n)))
    }
}

//! Hit maps and pixel masks for a single frame.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::pixel::{FrameGeometry, PixelCoord, PixelKey};

/// Sparse per-frame hit data: pixel key to recorded count.
///
/// Keys are kept ordered so that iteration, and therefore cluster
/// discovery, is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HitMap {
    geometry: FrameGeometry,
    counts: BTreeMap<PixelKey, u32>,
}

impl HitMap {
    /// Creates an empty hit map for the given frame geometry.
    #[must_use]
    pub fn new(geometry: FrameGeometry) -> Self {
        Self {
            geometry,
            counts: BTreeMap::new(),
        }
    }

    /// Builds a hit map from `(key, count)` pairs. Later duplicates win.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCoordinate`] for a key outside the frame.
    pub fn from_counts<I>(geometry: FrameGeometry, counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (PixelKey, u32)>,
    {
        let mut map = Self::new(geometry);
        for (key, count) in counts {
            map.insert(key, count)?;
        }
        Ok(map)
    }

    /// Sets the count for `key`, returning the previous count if any.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCoordinate`] for a key outside the frame.
    pub fn insert(&mut self, key: PixelKey, count: u32) -> Result<Option<u32>> {
        if !self.geometry.contains_key(key) {
            let cols = u32::from(self.geometry.cols());
            return Err(Error::InvalidCoordinate {
                x: key % cols,
                y: key / cols,
            });
        }
        Ok(self.counts.insert(key, count))
    }

    /// Sets the count for the pixel at `(x, y)`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCoordinate`] if `(x, y)` is outside the frame.
    pub fn insert_xy(&mut self, x: u32, y: u32, count: u32) -> Result<Option<u32>> {
        let key = self.geometry.key(x, y)?;
        Ok(self.counts.insert(key, count))
    }

    /// Frame geometry this map belongs to.
    #[must_use]
    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Number of hit pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no pixel was hit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count recorded for `key`.
    #[must_use]
    pub fn get(&self, key: PixelKey) -> Option<u32> {
        self.counts.get(&key).copied()
    }

    /// Returns true if `key` was hit.
    #[must_use]
    pub fn contains(&self, key: PixelKey) -> bool {
        self.counts.contains_key(&key)
    }

    /// Hit keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = PixelKey> + '_ {
        self.counts.keys().copied()
    }

    /// `(key, count)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (PixelKey, u32)> + '_ {
        self.counts.iter().map(|(&key, &count)| (key, count))
    }

    /// `(coordinate, count)` pairs in ascending key order.
    pub fn pixels(&self) -> impl Iterator<Item = (PixelCoord, u32)> + '_ {
        self.iter()
            .map(|(key, count)| (self.geometry.coord(key), count))
    }

    /// Number of hit pixels that the mask would remove.
    #[must_use]
    pub fn masked_count(&self, mask: &Mask) -> usize {
        mask.iter().filter(|&key| self.contains(key)).count()
    }

    /// Returns a private copy of this map with every masked key removed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMaskReference`] if the mask names a key
    /// outside the frame.
    pub fn without_masked(&self, mask: &Mask) -> Result<HitMap> {
        mask.validate(self.geometry)?;
        let mut working = self.clone();
        for key in mask.iter() {
            working.counts.remove(&key);
        }
        Ok(working)
    }
}

impl<'a> IntoIterator for &'a HitMap {
    type Item = (&'a PixelKey, &'a u32);
    type IntoIter = std::collections::btree_map::Iter<'a, PixelKey, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}

/// A set of pixel keys excluded from clustering (e.g. known noisy pixels).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mask {
    keys: BTreeSet<PixelKey>,
}

impl Mask {
    /// Creates an empty mask.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mask from `(x, y)` coordinates.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCoordinate`] for a coordinate outside the frame.
    pub fn from_coords<I>(geometry: FrameGeometry, coords: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        coords
            .into_iter()
            .map(|(x, y)| geometry.key(x, y))
            .collect::<Result<BTreeSet<_>>>()
            .map(|keys| Self { keys })
    }

    /// Adds a key, returning false if it was already masked.
    pub fn insert(&mut self, key: PixelKey) -> bool {
        self.keys.insert(key)
    }

    /// Returns true if `key` is masked.
    #[must_use]
    pub fn contains(&self, key: PixelKey) -> bool {
        self.keys.contains(&key)
    }

    /// Number of masked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if nothing is masked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Masked keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PixelKey> + '_ {
        self.keys.iter().copied()
    }

    /// Checks that every masked key lies inside `geometry`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMaskReference`] naming the first offending key.
    pub fn validate(&self, geometry: FrameGeometry) -> Result<()> {
        match self.keys.iter().find(|&&key| !geometry.contains_key(key)) {
            Some(&key) => Err(Error::InvalidMaskReference {
                key,
                rows: geometry.rows(),
                cols: geometry.cols(),
            }),
            None => Ok(()),
        }
    }
}

impl FromIterator<PixelKey> for Mask {
    fn from_iter<I: IntoIterator<Item = PixelKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

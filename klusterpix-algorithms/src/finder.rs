//! Connected-component cluster finder.
//!
//! Surviving hit pixels (hit map minus mask) are grouped under
//! 8-connectivity with a breadth-first traversal. Neighbours are computed
//! on demand from pixel-key arithmetic; no adjacency graph is stored.

use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};

use klusterpix_core::{
    ClusteringStatistics, Direction, FinderConfig, GammaCounts, HitMap, Kluster, Mask, PixelKey,
    Result,
};

/// Hit neighbours of `key` in direction order.
///
/// The relation is symmetric: if `b` is returned for `a` in direction `d`,
/// `a` is returned for `b` in `d.opposite()`.
pub fn hit_neighbors(
    hits: &HitMap,
    key: PixelKey,
) -> impl Iterator<Item = (Direction, PixelKey)> + '_ {
    let geometry = hits.geometry();
    Direction::ALL.into_iter().filter_map(move |direction| {
        geometry
            .neighbor(key, direction)
            .filter(|&neighbor| hits.contains(neighbor))
            .map(|neighbor| (direction, neighbor))
    })
}

/// The processed clusters of one frame, largest first.
#[derive(Debug, Clone)]
pub struct FrameKlusters {
    klusters: Vec<Kluster>,
    statistics: ClusteringStatistics,
}

impl FrameKlusters {
    /// Clusters sorted by pixel count, descending.
    #[must_use]
    pub fn klusters(&self) -> &[Kluster] {
        &self.klusters
    }

    /// Consumes the result, returning the sorted clusters.
    #[must_use]
    pub fn into_klusters(self) -> Vec<Kluster> {
        self.klusters
    }

    /// Statistics for the run.
    #[must_use]
    pub fn statistics(&self) -> &ClusteringStatistics {
        &self.statistics
    }

    /// Gamma candidate breakdown.
    #[must_use]
    pub fn gammas(&self) -> &GammaCounts {
        &self.statistics.gammas
    }

    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.klusters.len()
    }

    /// Returns true if the frame had no surviving hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.klusters.is_empty()
    }

    /// Iterates over the clusters, largest first.
    pub fn iter(&self) -> impl Iterator<Item = &Kluster> {
        self.klusters.iter()
    }
}

/// Finds 8-connected clusters in a single frame.
///
/// The finder holds no per-frame state, so one instance can serve many
/// frames, including from several threads.
#[derive(Debug, Clone, Default)]
pub struct KlusterFinder {
    config: FinderConfig,
}

impl KlusterFinder {
    /// Creates a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Algorithm name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        "KlusterFinder"
    }

    /// Removes masked pixels, extracts the connected components, processes
    /// each cluster and sorts them by size (descending).
    ///
    /// Clusters of equal size keep their discovery order; discovery starts
    /// from the lowest unvisited pixel key. `hits` is not modified.
    ///
    /// # Errors
    /// Returns [`klusterpix_core::Error::InvalidMaskReference`] if the mask
    /// names a pixel outside the frame. Errors from processing a cluster
    /// abort the frame.
    pub fn find(&self, hits: &HitMap, mask: &Mask) -> Result<FrameKlusters> {
        let working = hits.without_masked(mask)?;

        let mut klusters = connected_components(&working, self.config.is_simulated);

        let mut gammas = GammaCounts::default();
        for kluster in &mut klusters {
            kluster.process(&working)?;
            gammas.record(kluster.len(), kluster.radius()?);
        }

        // Stable: ties keep discovery order.
        klusters.sort_by_key(|kluster| Reverse(kluster.len()));

        let statistics = ClusteringStatistics {
            frame_pixels: hits.geometry().pixel_count(),
            raw_pixels: hits.len(),
            masked_pixels: hits.len() - working.len(),
            unmasked_pixels: working.len(),
            klusters_found: klusters.len(),
            gammas,
        };

        log::debug!(
            "{}: {} hit(s), {} masked, {} cluster(s), {} gamma candidate(s)",
            self.name(),
            statistics.raw_pixels,
            statistics.masked_pixels,
            statistics.klusters_found,
            gammas.total()
        );

        Ok(FrameKlusters {
            klusters,
            statistics,
        })
    }
}

/// Partitions the keys of `hits` into unprocessed clusters, in discovery order.
fn connected_components(hits: &HitMap, is_simulated: bool) -> Vec<Kluster> {
    let geometry = hits.geometry();
    let mut visited: HashSet<PixelKey> = HashSet::with_capacity(hits.len());
    let mut frontier: VecDeque<(PixelKey, u32)> = VecDeque::new();
    let mut klusters = Vec::new();

    for (seed, count) in hits.iter() {
        if !visited.insert(seed) {
            continue;
        }

        let mut kluster = Kluster::new(geometry, is_simulated);
        frontier.push_back((seed, count));

        while let Some((key, count)) = frontier.pop_front() {
            kluster.insert(key, count);
            for (_, neighbor) in hit_neighbors(hits, key) {
                if visited.insert(neighbor) {
                    if let Some(neighbor_count) = hits.get(neighbor) {
                        frontier.push_back((neighbor, neighbor_count));
                    }
                }
            }
        }

        log::trace!("cluster seeded at {seed}: {} pixel(s)", kluster.len());
        klusters.push(kluster);
    }

    klusters
}

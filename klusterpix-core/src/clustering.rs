//! Cluster finder configuration and per-frame statistics.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gamma::GammaCounts;

/// Configuration for the cluster finder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FinderConfig {
    /// Provenance flag copied onto every cluster; not used algorithmically.
    pub is_simulated: bool,
}

impl FinderConfig {
    /// Creates a configuration for real detector data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the frames as coming from simulation.
    #[must_use]
    pub fn with_simulated(mut self, is_simulated: bool) -> Self {
        self.is_simulated = is_simulated;
        self
    }
}

/// Statistics gathered during one cluster finder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Pixels in the frame (`rows * cols`).
    pub frame_pixels: usize,
    /// Hit pixels before masking.
    pub raw_pixels: usize,
    /// Hit pixels removed by the mask.
    pub masked_pixels: usize,
    /// Hit pixels that took part in clustering.
    pub unmasked_pixels: usize,
    /// Number of clusters found.
    pub klusters_found: usize,
    /// Gamma candidate breakdown.
    pub gammas: GammaCounts,
}

impl ClusteringStatistics {
    /// Frame occupancy: the number of hit pixels before masking.
    #[must_use]
    pub fn occupancy(&self) -> usize {
        self.raw_pixels
    }

    /// Occupancy as a fraction of the frame area.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn occupancy_fraction(&self) -> f64 {
        if self.frame_pixels == 0 {
            return 0.0;
        }
        self.raw_pixels as f64 / self.frame_pixels as f64
    }

    /// Clusters that are not gamma candidates.
    #[must_use]
    pub fn non_gammas(&self) -> usize {
        self.klusters_found.saturating_sub(self.gammas.total())
    }

    /// Accumulates another run into this one.
    pub fn merge(&mut self, other: &ClusteringStatistics) {
        self.frame_pixels += other.frame_pixels;
        self.raw_pixels += other.raw_pixels;
        self.masked_pixels += other.masked_pixels;
        self.unmasked_pixels += other.unmasked_pixels;
        self.klusters_found += other.klusters_found;
        self.gammas.merge(&other.gammas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finder_config() {
        let config = FinderConfig::new();
        assert!(!config.is_simulated);
        assert!(config.with_simulated(true).is_simulated);
    }

    #[test]
    fn test_statistics() {
        let mut gammas = GammaCounts::default();
        gammas.record(1, 0.0);
        gammas.record(2, 0.5);

        let stats = ClusteringStatistics {
            frame_pixels: 65_536,
            raw_pixels: 86,
            masked_pixels: 29,
            unmasked_pixels: 57,
            klusters_found: 9,
            gammas,
        };
        assert_eq!(stats.occupancy(), 86);
        assert!((stats.occupancy_fraction() - 86.0 / 65_536.0).abs() < f64::EPSILON);
        assert_eq!(stats.non_gammas(), 7);

        let mut total = ClusteringStatistics::default();
        assert!(total.occupancy_fraction().abs() < f64::EPSILON);
        total.merge(&stats);
        total.merge(&stats);
        assert_eq!(total.klusters_found, 18);
        assert_eq!(total.gammas.total(), 4);
        assert_eq!(total.non_gammas(), 14);
    }
}

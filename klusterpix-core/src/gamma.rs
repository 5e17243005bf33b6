//! Gamma candidate classification.
//!
//! Small, compact clusters are consistent with a single localised photon
//! interaction. The thresholds are fixed detector constants.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A three-pixel cluster is a gamma candidate below this radius.
pub const TRIPIXEL_RADIUS: f64 = 0.75;

/// A four-pixel cluster is a gamma candidate below this radius.
pub const TETRAPIXEL_RADIUS: f64 = 0.71;

/// Which gamma class a cluster falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GammaCategory {
    Monopixel,
    Bipixel,
    TripixelGamma,
    TetrapixelGamma,
}

/// Classifies a cluster from its pixel count and unweighted radius.
#[must_use]
pub fn classify(size: usize, radius: f64) -> Option<GammaCategory> {
    match size {
        1 => Some(GammaCategory::Monopixel),
        2 => Some(GammaCategory::Bipixel),
        3 if radius < TRIPIXEL_RADIUS => Some(GammaCategory::TripixelGamma),
        4 if radius < TETRAPIXEL_RADIUS => Some(GammaCategory::TetrapixelGamma),
        _ => None,
    }
}

/// Returns true if a cluster of `size` pixels and `radius` is a gamma candidate.
#[inline]
#[must_use]
pub fn is_gamma_candidate(size: usize, radius: f64) -> bool {
    classify(size, radius).is_some()
}

/// Gamma candidate counts for one frame, broken down by cluster size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GammaCounts {
    /// Single-pixel clusters.
    pub monopixels: usize,
    /// Two-pixel clusters.
    pub bipixels: usize,
    /// Compact three-pixel clusters.
    pub tripixel_gammas: usize,
    /// Compact four-pixel clusters.
    pub tetrapixel_gammas: usize,
}

impl GammaCounts {
    /// Classifies one cluster and records it if it is a gamma candidate.
    pub fn record(&mut self, size: usize, radius: f64) -> Option<GammaCategory> {
        let category = classify(size, radius)?;
        match category {
            GammaCategory::Monopixel => self.monopixels += 1,
            GammaCategory::Bipixel => self.bipixels += 1,
            GammaCategory::TripixelGamma => self.tripixel_gammas += 1,
            GammaCategory::TetrapixelGamma => self.tetrapixel_gammas += 1,
        }
        Some(category)
    }

    /// Total number of gamma candidates.
    #[must_use]
    pub fn total(&self) -> usize {
        self.monopixels + self.bipixels + self.tripixel_gammas + self.tetrapixel_gammas
    }

    /// Adds another frame's counts to this one.
    pub fn merge(&mut self, other: &GammaCounts) {
        self.monopixels += other.monopixels;
        self.bipixels += other.bipixels;
        self.tripixel_gammas += other.tripixel_gammas;
        self.tetrapixel_gammas += other.tetrapixel_gammas;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_clusters_always_gamma() {
        assert_eq!(classify(1, 0.0), Some(GammaCategory::Monopixel));
        assert_eq!(classify(2, 10.0), Some(GammaCategory::Bipixel));
    }

    #[test]
    fn test_tripixel_boundary() {
        assert!(is_gamma_candidate(3, 0.7499));
        assert!(!is_gamma_candidate(3, 0.75));
        assert!(!is_gamma_candidate(3, 0.9));
    }

    #[test]
    fn test_tetrapixel_boundary() {
        assert!(is_gamma_candidate(4, 0.7099));
        assert!(!is_gamma_candidate(4, 0.71));
        // A 2x2 square has radius sqrt(0.5) ~ 0.7071.
        assert!(is_gamma_candidate(4, 0.5_f64.sqrt()));
    }

    #[test]
    fn test_large_clusters_never_gamma() {
        assert_eq!(classify(0, 0.0), None);
        assert_eq!(classify(5, 0.1), None);
        assert_eq!(classify(25, 0.0), None);
    }

    #[test]
    fn test_gamma_counts() {
        let mut counts = GammaCounts::default();
        counts.record(1, 0.0);
        counts.record(3, 0.6);
        counts.record(3, 0.8);
        counts.record(4, 0.7);
        counts.record(7, 1.5);

        assert_eq!(counts.monopixels, 1);
        assert_eq!(counts.bipixels, 0);
        assert_eq!(counts.tripixel_gammas, 1);
        assert_eq!(counts.tetrapixel_gammas, 1);
        assert_eq!(counts.total(), 3);

        let mut sum = GammaCounts::default();
        sum.merge(&counts);
        sum.merge(&counts);
        assert_eq!(sum.total(), 6);
    }
}

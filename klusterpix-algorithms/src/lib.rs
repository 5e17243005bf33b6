//! klusterpix-algorithms: 8-connected cluster finding for Timepix frames.
//!
//! - [`KlusterFinder`] groups the unmasked hits of one frame into processed,
//!   size-sorted clusters.
//! - [`cluster_frames`] and [`cluster_frames_par`] run the finder over
//!   many frames, sequentially or with rayon.
//!
#![warn(missing_docs)]

mod finder;
mod processing;

pub use finder::{hit_neighbors, FrameKlusters, KlusterFinder};
pub use processing::{cluster_frames, cluster_frames_iter, cluster_frames_par, summarize};

// Re-export core configuration and statistics
pub use klusterpix_core::clustering::{ClusteringStatistics, FinderConfig};

//! Multi-frame helpers built on [`KlusterFinder`].
//!
//! Frames are independent, so a batch can be clustered sequentially or
//! spread over the rayon thread pool with identical results.

use rayon::prelude::*;

use crate::finder::{FrameKlusters, KlusterFinder};
use klusterpix_core::clustering::ClusteringStatistics;
use klusterpix_core::error::Result;
use klusterpix_core::frame::{HitMap, Mask};

/// Clusters each frame in turn with a shared mask.
///
/// # Errors
/// Stops at the first frame that fails.
pub fn cluster_frames(
    finder: &KlusterFinder,
    frames: &[HitMap],
    mask: &Mask,
) -> Result<Vec<FrameKlusters>> {
    frames.iter().map(|hits| finder.find(hits, mask)).collect()
}

/// Clusters frames on the rayon thread pool.
///
/// Output order matches `frames`.
///
/// # Errors
/// Returns an error if any frame fails.
pub fn cluster_frames_par(
    finder: &KlusterFinder,
    frames: &[HitMap],
    mask: &Mask,
) -> Result<Vec<FrameKlusters>> {
    log::debug!("clustering {} frame(s) in parallel", frames.len());
    frames
        .par_iter()
        .map(|hits| finder.find(hits, mask))
        .collect()
}

/// Clusters frames from an iterator, yielding one result per frame.
pub fn cluster_frames_iter<'a, I>(
    finder: &'a KlusterFinder,
    frames: I,
    mask: &'a Mask,
) -> impl Iterator<Item = Result<FrameKlusters>> + 'a
where
    I: IntoIterator<Item = HitMap>,
    I::IntoIter: 'a,
{
    frames.into_iter().map(move |hits| finder.find(&hits, mask))
}

/// Sums the statistics of several frames.
#[must_use]
pub fn summarize(results: &[FrameKlusters]) -> ClusteringStatistics {
    results
        .iter()
        .fold(ClusteringStatistics::default(), |mut total, frame| {
            total.merge(frame.statistics());
            total
        })
}

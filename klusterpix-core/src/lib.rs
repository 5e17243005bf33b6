//! klusterpix-core: Core types for Timepix cluster analysis.
//!
//! This crate provides pixel indexing, sparse hit maps and masks, and the
//! per-cluster characterisation (geometry, counts, linearity, edge pixels,
//! gamma classification) used by the cluster finder.
//!

pub mod clustering;
pub mod error;
pub mod frame;
pub mod gamma;
pub mod kluster;
pub mod linearity;
pub mod pixel;

pub use clustering::{ClusteringStatistics, FinderConfig};
pub use error::{Error, Result};
pub use frame::{HitMap, Mask};
pub use gamma::{
    classify, is_gamma_candidate, GammaCategory, GammaCounts, TETRAPIXEL_RADIUS, TRIPIXEL_RADIUS,
};
pub use kluster::{Kluster, KlusterProperties, PixelHit, ACTIVE_AREA_FIRST, ACTIVE_AREA_LAST};
pub use linearity::{fit_line, LineFit, VERTICAL_LINE_SENTINEL};
pub use pixel::{
    Direction, FrameGeometry, PixelCoord, PixelKey, DEFAULT_FRAME_SIZE, MAX_FRAME_SIZE,
    NEIGHBOR_OFFSETS,
};

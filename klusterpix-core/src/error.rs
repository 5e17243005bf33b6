//! Error types for klusterpix-core.

use thiserror::Error;

use crate::pixel::PixelKey;

/// Result type alias for klusterpix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for klusterpix operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A derived property was queried before `process()` ran.
    #[error("cluster has not been processed")]
    UnprocessedCluster,

    /// `process()` was called on a cluster with no members.
    #[error("cannot process an empty cluster")]
    EmptyCluster,

    /// `process()` was called a second time.
    #[error("cluster has already been processed")]
    AlreadyProcessed,

    /// The mask names a pixel outside the frame.
    #[error("mask references pixel key {key} outside the {cols}x{rows} frame")]
    InvalidMaskReference { key: PixelKey, rows: u16, cols: u16 },

    /// Invalid pixel coordinate.
    #[error("invalid pixel coordinate: ({x}, {y})")]
    InvalidCoordinate { x: u32, y: u32 },

    /// Frame dimensions outside the supported detector range.
    #[error("invalid frame geometry: {rows} rows x {cols} columns")]
    InvalidGeometry { rows: u32, cols: u32 },

    /// A cluster member is absent from the hit map it is processed against.
    #[error("pixel key {0} is not present in the hit map")]
    MissingPixel(PixelKey),
}

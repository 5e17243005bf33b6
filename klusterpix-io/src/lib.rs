//! klusterpix-io: Frame file readers and JSON writers for klusterpix.
//!
//! This crate reads Pixelman ASCII frames and mask files into
//! [`klusterpix_core::HitMap`] and [`klusterpix_core::Mask`], and writes
//! processed clusters and per-frame summaries as JSON.
//!

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{
    parse_frame, parse_mask, read_frame, read_mask, AsciiFrameReader, FrameFormat,
};
pub use writer::{
    kluster_records, write_frame_summaries_json, write_klusters_json, FrameSummary, KlusterRecord,
};

//! JSON writers for cluster descriptors and frame summaries.

use crate::Result;
use klusterpix_core::{ClusteringStatistics, FrameGeometry, Kluster, KlusterProperties, PixelHit};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One cluster as written to disk.
///
/// The property fields are flattened next to `id` and `pixels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlusterRecord {
    /// Position in the size-sorted cluster list.
    pub id: usize,
    /// Member pixels in discovery order.
    pub pixels: Vec<PixelHit>,
    #[serde(flatten)]
    pub properties: KlusterProperties,
}

impl KlusterRecord {
    /// Builds a record for a processed cluster.
    ///
    /// # Errors
    /// Returns an error if the cluster has not been processed.
    pub fn from_kluster(id: usize, kluster: &Kluster) -> Result<Self> {
        Ok(Self {
            id,
            pixels: kluster.pixels()?.to_vec(),
            properties: kluster.properties()?.clone(),
        })
    }
}

/// Builds records for a sorted cluster list.
///
/// # Errors
/// Returns an error if any cluster has not been processed.
pub fn kluster_records(klusters: &[Kluster]) -> Result<Vec<KlusterRecord>> {
    klusters
        .iter()
        .enumerate()
        .map(|(id, kluster)| KlusterRecord::from_kluster(id, kluster))
        .collect()
}

/// Writes processed clusters as a JSON array.
///
/// # Errors
/// Returns an error if a cluster is unprocessed or the file cannot be written.
pub fn write_klusters_json<P: AsRef<Path>>(path: P, klusters: &[Kluster]) -> Result<()> {
    let records = kluster_records(klusters)?;
    write_json(path.as_ref(), &records)?;
    log::debug!(
        "wrote {} cluster(s) to {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Per-frame summary line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Frame name, usually the file stem.
    #[serde(rename = "id")]
    pub name: String,
    pub width: u16,
    pub height: u16,
    /// Hits before masking.
    #[serde(rename = "n_raw_pixel")]
    pub raw_pixels: usize,
    /// Hits removed by the mask.
    #[serde(rename = "n_masked_pixel")]
    pub masked_pixels: usize,
    /// Hits that were clustered.
    #[serde(rename = "n_pixel")]
    pub unmasked_pixels: usize,
    #[serde(rename = "occ")]
    pub occupancy: usize,
    #[serde(rename = "occ_pc")]
    pub occupancy_fraction: f64,
    #[serde(rename = "n_kluster")]
    pub klusters: usize,
    #[serde(rename = "n_gamma")]
    pub gammas: usize,
    #[serde(rename = "n_monopixel")]
    pub monopixels: usize,
    #[serde(rename = "n_bipixel")]
    pub bipixels: usize,
    #[serde(rename = "n_tripixel_gamma")]
    pub tripixel_gammas: usize,
    #[serde(rename = "n_tetrapixel_gamma")]
    pub tetrapixel_gammas: usize,
    #[serde(rename = "n_non_gamma")]
    pub non_gammas: usize,
    #[serde(rename = "ismc")]
    pub is_simulated: bool,
}

impl FrameSummary {
    /// Summarises one clustering run.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        geometry: FrameGeometry,
        statistics: &ClusteringStatistics,
        is_simulated: bool,
    ) -> Self {
        let gammas = &statistics.gammas;
        Self {
            name: name.into(),
            width: geometry.cols(),
            height: geometry.rows(),
            raw_pixels: statistics.raw_pixels,
            masked_pixels: statistics.masked_pixels,
            unmasked_pixels: statistics.unmasked_pixels,
            occupancy: statistics.occupancy(),
            occupancy_fraction: statistics.occupancy_fraction(),
            klusters: statistics.klusters_found,
            gammas: gammas.total(),
            monopixels: gammas.monopixels,
            bipixels: gammas.bipixels,
            tripixel_gammas: gammas.tripixel_gammas,
            tetrapixel_gammas: gammas.tetrapixel_gammas,
            non_gammas: statistics.non_gammas(),
            is_simulated,
        }
    }
}

/// Writes frame summaries as a JSON array.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_frame_summaries_json<P: AsRef<Path>>(
    path: P,
    summaries: &[FrameSummary],
) -> Result<()> {
    write_json(path.as_ref(), summaries)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use klusterpix_core::{GammaCounts, HitMap};
    use tempfile::NamedTempFile;

    fn processed_pair() -> Kluster {
        let geometry = FrameGeometry::timepix();
        let mut hits = HitMap::new(geometry);
        hits.insert_xy(10, 10, 40).unwrap();
        hits.insert_xy(11, 10, 7).unwrap();

        let mut kluster = Kluster::new(geometry, false);
        for (key, count) in hits.iter() {
            kluster.insert(key, count);
        }
        kluster.process(&hits).unwrap();
        kluster
    }

    #[test]
    fn test_record_field_names() {
        let record = KlusterRecord::from_kluster(0, &processed_pair()).unwrap();
        let value = serde_json::to_value(&record).unwrap();

        for key in [
            "id",
            "pixels",
            "size",
            "xmin",
            "xmax",
            "ymin",
            "ymax",
            "width",
            "height",
            "x_uw",
            "y_uw",
            "radius_uw",
            "density_uw",
            "totalcounts",
            "maxcounts",
            "lin_m",
            "lin_c",
            "lin_sumofres",
            "lin_linearity",
            "n_edgepixels",
            "edgefrac",
            "innerfrac",
            "ismc",
            "isedgekluster",
            "totalenergy",
            "maxenergy",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["totalcounts"], 47);
        assert_eq!(value["pixels"][1]["c"], 7);
    }

    #[test]
    fn test_unprocessed_cluster_is_an_error() {
        let kluster = Kluster::new(FrameGeometry::timepix(), false);
        assert!(KlusterRecord::from_kluster(0, &kluster).is_err());
    }

    #[test]
    fn test_write_and_read_back() {
        let file = NamedTempFile::new().unwrap();
        let klusters = vec![processed_pair()];
        write_klusters_json(file.path(), &klusters).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let records: Vec<KlusterRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].properties.size, 2);
        assert_eq!(records[0].pixels.len(), 2);
    }

    #[test]
    fn test_frame_summary() {
        let mut gammas = GammaCounts::default();
        gammas.record(1, 0.0);
        let stats = ClusteringStatistics {
            frame_pixels: 65_536,
            raw_pixels: 6,
            masked_pixels: 1,
            unmasked_pixels: 5,
            klusters_found: 2,
            gammas,
        };
        let summary = FrameSummary::new("frame_0001", FrameGeometry::timepix(), &stats, true);
        assert_eq!(summary.gammas, 1);
        assert_eq!(summary.non_gammas, 1);
        assert_eq!(summary.width, 256);

        let file = NamedTempFile::new().unwrap();
        write_frame_summaries_json(file.path(), &[summary]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(value[0]["id"], "frame_0001");
        assert_eq!(value[0]["n_pixel"], 5);
        assert_eq!(value[0]["occ"], 6);
        assert_eq!(value[0]["ismc"], true);
    }
}

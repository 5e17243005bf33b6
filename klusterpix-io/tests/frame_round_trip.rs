use approx::assert_abs_diff_eq;
use klusterpix_algorithms::KlusterFinder;
use klusterpix_core::FrameGeometry;
use klusterpix_io::{
    read_frame, read_mask, write_frame_summaries_json, write_klusters_json, FrameSummary,
    KlusterRecord,
};
use std::fmt::Write as _;
use tempfile::tempdir;

fn frame_text() -> String {
    let mut text = String::new();
    // 2x2 square, a diagonal pair and a hot pixel.
    for (x, y, c) in [
        (40, 40, 12),
        (41, 40, 9),
        (40, 41, 30),
        (41, 41, 4),
        (100, 7, 3),
        (101, 8, 3),
        (230, 230, 11_810),
    ] {
        writeln!(text, "{x}\t{y}\t{c}").unwrap();
    }
    text
}

#[test]
fn test_file_to_json() {
    let dir = tempdir().unwrap();
    let frame_path = dir.path().join("frame_0001.txt");
    let mask_path = dir.path().join("mask.txt");
    std::fs::write(&frame_path, frame_text()).unwrap();
    std::fs::write(&mask_path, "230\t230\n").unwrap();

    let geometry = FrameGeometry::timepix();
    let hits = read_frame(&frame_path, geometry).unwrap();
    let mask = read_mask(&mask_path, geometry).unwrap();
    assert_eq!(hits.len(), 7);

    let result = KlusterFinder::default().find(&hits, &mask).unwrap();
    assert_eq!(result.len(), 2);

    let json_path = dir.path().join("frame_0001.json");
    write_klusters_json(&json_path, result.klusters()).unwrap();
    let records: Vec<KlusterRecord> =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();

    assert_eq!(records[0].id, 0);
    assert_eq!(records[0].properties.size, 4);
    assert_eq!(records[0].properties.total_counts, 55);
    assert_eq!(records[0].properties.max_count, 30);
    assert_abs_diff_eq!(records[0].properties.x_mean, 40.5);
    assert!(records[0].properties.is_gamma_candidate);
    assert_eq!(records[1].properties.size, 2);

    let summary = FrameSummary::new("frame_0001", geometry, result.statistics(), false);
    assert_eq!(summary.masked_pixels, 1);
    assert_eq!(summary.gammas, 2);
    assert_eq!(summary.non_gammas, 0);

    let summary_path = dir.path().join("frames.json");
    write_frame_summaries_json(&summary_path, std::slice::from_ref(&summary)).unwrap();
    let read_back: Vec<FrameSummary> =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(read_back, vec![summary]);
}

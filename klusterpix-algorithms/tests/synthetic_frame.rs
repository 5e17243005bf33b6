//! End-to-end run over a hand-built 256 x 256 frame with a mask.
#![allow(clippy::float_cmp)]
use approx::assert_abs_diff_eq;
use klusterpix_algorithms::KlusterFinder;
use klusterpix_core::{FrameGeometry, HitMap, Kluster, Mask};

fn build_frame() -> HitMap {
    let mut hits = HitMap::new(FrameGeometry::timepix());
    let mut add = |x: u32, y: u32, c: u32| {
        hits.insert_xy(x, y, c).unwrap();
    };

    // Monopixel.
    add(10, 10, 40);
    // Two L-shaped tripixels.
    for (x, y) in [(20, 20), (21, 20), (20, 21)] {
        add(x, y, 15);
    }
    for (x, y) in [(30, 40), (31, 40), (31, 41)] {
        add(x, y, 15);
    }
    // Two 2x2 squares joined through a hot pixel at (52, 52).
    for (x, y) in [(50, 50), (51, 50), (50, 51), (51, 51)] {
        add(x, y, 20);
    }
    add(52, 52, 11_810);
    for (x, y) in [(53, 53), (54, 53), (53, 54), (54, 54)] {
        add(x, y, 20);
    }
    // Horizontal and vertical lines.
    for x in 70..73 {
        add(x, 10, 8);
    }
    for y in 200..204 {
        add(90, y, 8);
    }
    // 3x2 blob.
    for y in 150..152 {
        for x in 150..153 {
            add(x, y, 30);
        }
    }
    // Diagonal track with a slope of one half.
    for k in 0..25 {
        add(100 + k, 180 + k / 2, 10 + k);
    }
    // Isolated noisy pixel.
    add(200, 200, 11_810);

    hits
}

fn build_mask() -> Mask {
    Mask::from_coords(FrameGeometry::timepix(), [(52, 52), (200, 200), (5, 5)]).unwrap()
}

#[test]
fn test_masked_frame_statistics() {
    let hits = build_frame();
    let result = KlusterFinder::default().find(&hits, &build_mask()).unwrap();

    let stats = result.statistics();
    assert_eq!(stats.raw_pixels, 55);
    assert_eq!(stats.occupancy(), 55);
    assert_eq!(stats.masked_pixels, 2);
    assert_eq!(stats.unmasked_pixels, 53);
    assert_eq!(stats.klusters_found, 9);
    assert_eq!(stats.frame_pixels, 65_536);

    let gammas = result.gammas();
    assert_eq!(gammas.monopixels, 1);
    assert_eq!(gammas.bipixels, 0);
    assert_eq!(gammas.tripixel_gammas, 2);
    assert_eq!(gammas.tetrapixel_gammas, 2);
    assert_eq!(gammas.total(), 5);
    assert_eq!(stats.non_gammas(), 4);
}

#[test]
fn test_masked_frame_order() {
    let geometry = FrameGeometry::timepix();
    let hits = build_frame();
    let result = KlusterFinder::default().find(&hits, &build_mask()).unwrap();

    let sizes: Vec<usize> = result.iter().map(Kluster::len).collect();
    assert_eq!(sizes, vec![25, 6, 4, 4, 4, 3, 3, 3, 1]);

    // Ties stay in discovery order: lowest seed key first.
    let seeds: Vec<u32> = result.iter().map(|k| k.members()[0]).collect();
    let expected = [
        (100, 180),
        (150, 150),
        (50, 50),
        (53, 53),
        (90, 200),
        (70, 10),
        (20, 20),
        (30, 40),
        (10, 10),
    ];
    let expected: Vec<u32> = expected
        .iter()
        .map(|&(x, y)| geometry.key(x, y).unwrap())
        .collect();
    assert_eq!(seeds, expected);
}

#[test]
fn test_track_properties() {
    let hits = build_frame();
    let result = KlusterFinder::default().find(&hits, &build_mask()).unwrap();
    let track = result.klusters()[0].properties().unwrap();

    assert_eq!(track.size, 25);
    assert_eq!((track.xmin, track.xmax), (100, 124));
    assert_eq!((track.ymin, track.ymax), (180, 192));
    assert_eq!((track.width, track.height), (25, 13));
    assert_abs_diff_eq!(track.x_mean, 112.0, epsilon = 1e-12);
    assert_abs_diff_eq!(track.y_mean, 185.76, epsilon = 1e-12);
    assert_eq!(track.total_counts, 550);
    assert_eq!(track.max_count, 34);
    assert_abs_diff_eq!(track.line.slope, 0.5, epsilon = 1e-9);
    // Even steps sit 0.24 above the line, odd steps 0.26 below.
    assert_abs_diff_eq!(track.line.intercept, 129.76, epsilon = 1e-9);
    assert_abs_diff_eq!(track.line.sum_residuals, 6.24 / 1.25_f64.sqrt(), epsilon = 1e-9);
    assert_abs_diff_eq!(track.line.linearity, 0.2496 / 1.25_f64.sqrt(), epsilon = 1e-9);
    assert_eq!(track.edge_pixels, 25);
    assert_eq!(track.outer_fraction, 1.0);
    assert_eq!(track.inner_fraction, 0.0);
    assert!(!track.is_gamma_candidate);
    assert!(!track.is_frame_edge);
    assert!(!track.is_simulated);
}

#[test]
fn test_small_cluster_properties() {
    let hits = build_frame();
    let result = KlusterFinder::default().find(&hits, &build_mask()).unwrap();
    let klusters = result.klusters();

    let square = klusters[2].properties().unwrap();
    assert_abs_diff_eq!(square.radius, 0.5_f64.sqrt(), epsilon = 1e-12);
    assert_eq!(square.total_counts, 80);
    assert!(square.is_gamma_candidate);

    let vline = klusters[4].line_fit().unwrap();
    assert_eq!(vline.slope, 999_999.9);

    let hline = klusters[5].line_fit().unwrap();
    assert_eq!(hline.slope, 0.0);
    assert_eq!(hline.intercept, 10.0);

    let tripixel = klusters[6].properties().unwrap();
    assert!(tripixel.radius < 0.75);
    assert!(tripixel.is_gamma_candidate);

    let mono = klusters[8].properties().unwrap();
    assert_eq!(mono.radius, 0.0);
    assert_eq!(mono.density, 0.0);
    assert_eq!(mono.line.intercept, 10.0);
    assert_eq!(mono.total_counts, 40);
}

#[test]
fn test_unmasked_hot_pixel_joins_squares() {
    let hits = build_frame();
    let result = KlusterFinder::default().find(&hits, &Mask::new()).unwrap();

    let sizes: Vec<usize> = result.iter().map(Kluster::len).collect();
    assert_eq!(sizes, vec![25, 9, 6, 4, 3, 3, 3, 1, 1]);

    let merged = result.klusters()[1].properties().unwrap();
    assert_eq!(merged.total_counts, 8 * 20 + 11_810);
    assert_eq!(merged.max_count, 11_810);
    assert_eq!(result.statistics().masked_pixels, 0);
    assert_eq!(result.gammas().total(), 4);
}

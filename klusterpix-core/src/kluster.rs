//! Clusters ("klusters") of 8-connected hit pixels and their properties.
#![allow(clippy::cast_precision_loss)]

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::HitMap;
use crate::gamma::is_gamma_candidate;
use crate::linearity::{fit_line, LineFit};
use crate::pixel::{Direction, FrameGeometry, PixelKey};

/// First row/column of the 256x256 active area.
pub const ACTIVE_AREA_FIRST: u16 = 0;

/// Last row/column of the 256x256 active area.
///
/// Clusters touching this boundary are flagged as frame-edge clusters even
/// when the frame itself is larger.
pub const ACTIVE_AREA_LAST: u16 = 255;

/// A member pixel with its recorded count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelHit {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
    /// Recorded count.
    pub c: u32,
}

/// Derived cluster properties, fixed once the cluster is processed.
///
/// With the `serde` feature the field names match the cluster JSON consumed
/// by the existing report generators.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KlusterProperties {
    /// Number of member pixels.
    pub size: usize,
    /// Smallest member x.
    pub xmin: u16,
    /// Largest member x.
    pub xmax: u16,
    /// Smallest member y.
    pub ymin: u16,
    /// Largest member y.
    pub ymax: u16,
    /// `xmax - xmin + 1`.
    pub width: u16,
    /// `ymax - ymin + 1`.
    pub height: u16,
    /// Unweighted mean x.
    #[cfg_attr(feature = "serde", serde(rename = "x_uw"))]
    pub x_mean: f64,
    /// Unweighted mean y.
    #[cfg_attr(feature = "serde", serde(rename = "y_uw"))]
    pub y_mean: f64,
    /// Largest distance from the unweighted centroid to a member pixel.
    #[cfg_attr(feature = "serde", serde(rename = "radius_uw"))]
    pub radius: f64,
    /// `size / (pi r^2)`, or zero for a single pixel.
    #[cfg_attr(feature = "serde", serde(rename = "density_uw"))]
    pub density: f64,
    /// Sum of member counts.
    #[cfg_attr(feature = "serde", serde(rename = "totalcounts"))]
    pub total_counts: u64,
    /// Largest single member count.
    #[cfg_attr(feature = "serde", serde(rename = "maxcounts"))]
    pub max_count: u32,
    /// Line of best fit and linearity.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub line: LineFit,
    /// Members with at least one 8-neighbour outside the cluster.
    #[cfg_attr(feature = "serde", serde(rename = "n_edgepixels"))]
    pub edge_pixels: usize,
    /// `edge_pixels / size`.
    #[cfg_attr(feature = "serde", serde(rename = "edgefrac"))]
    pub outer_fraction: f64,
    /// `1 - outer_fraction`.
    #[cfg_attr(feature = "serde", serde(rename = "innerfrac"))]
    pub inner_fraction: f64,
    /// Provenance flag passed through from the finder.
    #[cfg_attr(feature = "serde", serde(rename = "ismc"))]
    pub is_simulated: bool,
    /// Touches the boundary of the active area.
    #[cfg_attr(feature = "serde", serde(rename = "isedgekluster"))]
    pub is_frame_edge: bool,
    /// Passes the gamma candidate size/radius test.
    #[cfg_attr(feature = "serde", serde(rename = "isgamma"))]
    pub is_gamma_candidate: bool,
    /// Always zero: no calibration is applied.
    #[cfg_attr(feature = "serde", serde(rename = "totalenergy"))]
    pub total_energy: f64,
    /// Always zero: no calibration is applied.
    #[cfg_attr(feature = "serde", serde(rename = "maxenergy"))]
    pub max_energy: f64,
}

/// A connected group of hit pixels from one frame.
///
/// Members are kept in discovery order. Derived properties only exist
/// after [`Kluster::process`] and never change afterwards.
#[derive(Debug, Clone)]
pub struct Kluster {
    geometry: FrameGeometry,
    is_simulated: bool,
    members: Vec<PixelKey>,
    total_counts: u64,
    pixels: Vec<PixelHit>,
    properties: Option<KlusterProperties>,
}

impl Kluster {
    /// Creates an empty, unprocessed cluster.
    #[must_use]
    pub fn new(geometry: FrameGeometry, is_simulated: bool) -> Self {
        Self {
            geometry,
            is_simulated,
            members: Vec::new(),
            total_counts: 0,
            pixels: Vec::new(),
            properties: None,
        }
    }

    /// Appends a member pixel and adds its count to the running total.
    pub fn insert(&mut self, key: PixelKey, count: u32) {
        self.members.push(key);
        self.total_counts += u64::from(count);
    }

    /// Member keys in discovery order.
    #[must_use]
    pub fn members(&self) -> &[PixelKey] {
        &self.members
    }

    /// Number of member pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the cluster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Running total of member counts.
    #[must_use]
    pub fn total_counts(&self) -> u64 {
        self.total_counts
    }

    /// Whether the cluster comes from simulated data.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.is_simulated
    }

    /// Geometry of the originating frame.
    #[must_use]
    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Returns true once [`Kluster::process`] has run.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.properties.is_some()
    }

    /// Computes every derived property from the member pixels.
    ///
    /// `hits` must contain every member key; it is only read.
    ///
    /// # Errors
    /// - [`Error::AlreadyProcessed`] on a second call;
    /// - [`Error::EmptyCluster`] if there are no members;
    /// - [`Error::MissingPixel`] if a member is absent from `hits`.
    pub fn process(&mut self, hits: &HitMap) -> Result<()> {
        if self.properties.is_some() {
            return Err(Error::AlreadyProcessed);
        }
        if self.members.is_empty() {
            return Err(Error::EmptyCluster);
        }

        let pixels = self
            .members
            .iter()
            .map(|&key| {
                let count = hits.get(key).ok_or(Error::MissingPixel(key))?;
                let coord = self.geometry.coord(key);
                Ok(PixelHit {
                    x: coord.x,
                    y: coord.y,
                    c: count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let properties = self.compute_properties(&pixels)?;
        log_properties(&pixels, &properties);

        self.pixels = pixels;
        self.properties = Some(properties);
        Ok(())
    }

    fn compute_properties(&self, pixels: &[PixelHit]) -> Result<KlusterProperties> {
        let size = pixels.len();
        let n = size as f64;

        let mut xmin = u16::MAX;
        let mut xmax = u16::MIN;
        let mut ymin = u16::MAX;
        let mut ymax = u16::MIN;
        let mut max_count = 0;
        let mut total_counts = 0u64;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;

        for pixel in pixels {
            xmin = xmin.min(pixel.x);
            xmax = xmax.max(pixel.x);
            ymin = ymin.min(pixel.y);
            ymax = ymax.max(pixel.y);
            max_count = max_count.max(pixel.c);
            total_counts += u64::from(pixel.c);
            sum_x += f64::from(pixel.x);
            sum_y += f64::from(pixel.y);
        }

        let x_mean = sum_x / n;
        let y_mean = sum_y / n;

        let radius = pixels
            .iter()
            .map(|p| {
                let dx = f64::from(p.x) - x_mean;
                let dy = f64::from(p.y) - y_mean;
                dx * dx + dy * dy
            })
            .fold(0.0, f64::max)
            .sqrt();

        let density = if radius > 0.0 {
            n / (std::f64::consts::PI * radius * radius)
        } else {
            0.0
        };

        let points: Vec<(f64, f64)> = pixels
            .iter()
            .map(|p| (f64::from(p.x), f64::from(p.y)))
            .collect();
        let line = fit_line(&points)?;

        let edge_pixels = count_edge_pixels(&self.members, self.geometry);
        let outer_fraction = edge_pixels as f64 / n;

        let on_boundary = |v: u16| v == ACTIVE_AREA_FIRST || v == ACTIVE_AREA_LAST;
        let is_frame_edge = pixels.iter().any(|p| on_boundary(p.x) || on_boundary(p.y));

        Ok(KlusterProperties {
            size,
            xmin,
            xmax,
            ymin,
            ymax,
            width: xmax - xmin + 1,
            height: ymax - ymin + 1,
            x_mean,
            y_mean,
            radius,
            density,
            total_counts,
            max_count,
            line,
            edge_pixels,
            outer_fraction,
            inner_fraction: 1.0 - outer_fraction,
            is_simulated: self.is_simulated,
            is_frame_edge,
            is_gamma_candidate: is_gamma_candidate(size, radius),
            total_energy: 0.0,
            max_energy: 0.0,
        })
    }

    /// The derived properties.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn properties(&self) -> Result<&KlusterProperties> {
        self.properties.as_ref().ok_or(Error::UnprocessedCluster)
    }

    /// Member pixels with their counts, in discovery order.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn pixels(&self) -> Result<&[PixelHit]> {
        self.properties()?;
        Ok(&self.pixels)
    }

    /// Bounding box width in pixels.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn width(&self) -> Result<u16> {
        self.properties().map(|p| p.width)
    }

    /// Bounding box height in pixels.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn height(&self) -> Result<u16> {
        self.properties().map(|p| p.height)
    }

    /// Unweighted centroid `(x, y)`.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn centroid(&self) -> Result<(f64, f64)> {
        self.properties().map(|p| (p.x_mean, p.y_mean))
    }

    /// Unweighted radius.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn radius(&self) -> Result<f64> {
        self.properties().map(|p| p.radius)
    }

    /// Unweighted spatial density.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn density(&self) -> Result<f64> {
        self.properties().map(|p| p.density)
    }

    /// Line of best fit and linearity.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn line_fit(&self) -> Result<LineFit> {
        self.properties().map(|p| p.line)
    }

    /// Whether the cluster is a gamma candidate.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn is_gamma_candidate(&self) -> Result<bool> {
        self.properties().map(|p| p.is_gamma_candidate)
    }

    /// Whether the cluster touches the active-area boundary.
    ///
    /// # Errors
    /// Returns [`Error::UnprocessedCluster`] before [`Kluster::process`].
    pub fn is_frame_edge(&self) -> Result<bool> {
        self.properties().map(|p| p.is_frame_edge)
    }
}

/// Counts members with at least one neighbour position not in the cluster.
///
/// Positions beyond the frame boundary are never members.
fn count_edge_pixels(members: &[PixelKey], geometry: FrameGeometry) -> usize {
    let set: HashSet<PixelKey> = members.iter().copied().collect();
    members
        .iter()
        .filter(|&&key| {
            Direction::ALL.iter().any(|&direction| {
                geometry
                    .neighbor(key, direction)
                    .is_none_or(|neighbor| !set.contains(&neighbor))
            })
        })
        .count()
}

fn log_properties(pixels: &[PixelHit], p: &KlusterProperties) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    log::debug!("new cluster: {} pixel(s)", p.size);
    for pixel in pixels {
        log::debug!("  pixel ({:3}, {:3}) = {}", pixel.x, pixel.y, pixel.c);
    }
    log::debug!(
        "  x [{}, {}] y [{}, {}] -> {} x {}",
        p.xmin,
        p.xmax,
        p.ymin,
        p.ymax,
        p.width,
        p.height
    );
    log::debug!("  counts: total {} max {}", p.total_counts, p.max_count);
    log::debug!(
        "  unweighted centroid ({:6.2}, {:6.2}), radius {:10.5}, density {:10.5}",
        p.x_mean,
        p.y_mean,
        p.radius,
        p.density
    );
    log::debug!(
        "  line {:.6} * x {:+.6}, sum of residuals {:.6}, linearity {:.6}",
        p.line.slope,
        p.line.intercept,
        p.line.sum_residuals,
        p.line.linearity
    );
    log::debug!("  edge pixels {}", p.edge_pixels);
}

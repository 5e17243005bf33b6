//! Line-of-best-fit and linearity metric for cluster pixels.
//!
//! The line `y = m x + c` is fitted by least squares on the vertical
//! residuals; the linearity is then the mean perpendicular distance of
//! the pixels from that line. Counts are ignored.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Slope and intercept reported for a cluster whose pixels share one column.
pub const VERTICAL_LINE_SENTINEL: f64 = 999_999.9;

const MAX_ITERATIONS: usize = 10;
const STEP_TOLERANCE: f64 = 1.0e-12;

/// Result of a line fit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineFit {
    /// Gradient `m`.
    #[cfg_attr(feature = "serde", serde(rename = "lin_m"))]
    pub slope: f64,
    /// Intercept `c`.
    #[cfg_attr(feature = "serde", serde(rename = "lin_c"))]
    pub intercept: f64,
    /// Sum of perpendicular residuals.
    #[cfg_attr(feature = "serde", serde(rename = "lin_sumofres"))]
    pub sum_residuals: f64,
    /// `sum_residuals / n`.
    #[cfg_attr(feature = "serde", serde(rename = "lin_linearity"))]
    pub linearity: f64,
}

impl LineFit {
    fn exact(slope: f64, intercept: f64) -> Self {
        Self {
            slope,
            intercept,
            sum_residuals: 0.0,
            linearity: 0.0,
        }
    }
}

/// Fits a line through `points` given as `(x, y)`.
///
/// The first point seeds the fit, so pass points in discovery order.
///
/// Degenerate inputs:
/// - one point: slope `0`, intercept set to the point's `x`;
/// - one shared `x`: slope and intercept are [`VERTICAL_LINE_SENTINEL`];
/// - one shared `y`: slope `0`, intercept `y`.
///
/// # Errors
/// Returns [`Error::EmptyCluster`] if `points` is empty.
#[allow(clippy::float_cmp)]
pub fn fit_line(points: &[(f64, f64)]) -> Result<LineFit> {
    let Some(&(x0, y0)) = points.first() else {
        return Err(Error::EmptyCluster);
    };

    if points.len() == 1 {
        return Ok(LineFit::exact(0.0, x0));
    }
    if points.iter().all(|&(x, _)| x == x0) {
        return Ok(LineFit::exact(VERTICAL_LINE_SENTINEL, VERTICAL_LINE_SENTINEL));
    }
    if points.iter().all(|&(_, y)| y == y0) {
        return Ok(LineFit::exact(0.0, y0));
    }

    let seed_slope = 0.0;
    let seed_intercept = y0 - seed_slope * x0;
    let (slope, intercept) = least_squares(points, seed_slope, seed_intercept);

    let denominator = (1.0 + slope * slope).sqrt();
    let sum_residuals: f64 = points
        .iter()
        .map(|&(x, y)| (slope * x - y + intercept).abs() / denominator)
        .sum();

    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    log::trace!(
        "line fit over {} points: m = {slope}, c = {intercept}",
        points.len()
    );

    Ok(LineFit {
        slope,
        intercept,
        sum_residuals,
        linearity: sum_residuals / n,
    })
}

/// Gauss-Newton iterations on `sum (y - m x - c)^2` from `(m, c)`.
///
/// The model is linear in its parameters, so the first step lands on the
/// minimum; later steps only polish rounding. Needs at least two distinct `x`.
fn least_squares(points: &[(f64, f64)], mut m: f64, mut c: f64) -> (f64, f64) {
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let sx: f64 = points.iter().map(|&(x, _)| x).sum();
    let sxx: f64 = points.iter().map(|&(x, _)| x * x).sum();
    let det = sxx * n - sx * sx;

    for _ in 0..MAX_ITERATIONS {
        let (sxr, sr) = points.iter().fold((0.0, 0.0), |(sxr, sr), &(x, y)| {
            let r = y - m * x - c;
            (sxr + x * r, sr + r)
        });
        let dm = (n * sxr - sx * sr) / det;
        let dc = (sxx * sr - sx * sxr) / det;
        m += dm;
        c += dc;
        if dm.abs() <= STEP_TOLERANCE * (1.0 + m.abs())
            && dc.abs() <= STEP_TOLERANCE * (1.0 + c.abs())
        {
            break;
        }
    }
    (m, c)
}

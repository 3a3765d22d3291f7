//! Profiled two-parameter contours (MNCONTOUR).
//!
//! The polygon starts from the four MINOS crossing points of the two
//! parameters. New vertices are added by cutting the largest gap, measured
//! in units of the parameter errors, with a ray from the minimum through the
//! gap's midpoint and finding where the profile along that ray, minimized
//! over all other parameters, reaches the contour level.

use crate::error::{MinOptError, NumericalWarning, Result};
use crate::minos::cross::{function_cross, CrossSearch, CrossStatus};
use crate::minos::profiler::Profiler;
use crate::minos::MinosRun;
use crate::objective::Objective;
use crate::utils::linalg::invert;
use ndarray::array;

/// Vertices of a profiled contour.
#[derive(Debug, Clone)]
pub(crate) struct ContourTrace {
    pub points: Vec<(f64, f64)>,
    pub warnings: Vec<NumericalWarning>,
}

/// Trace the contour of parameters `ix` and `iy` at `sigma`.
///
/// `minos_x` and `minos_y` are the MINOS runs of the two parameters at the
/// same `sigma`; their crossings become the first four vertices.
#[allow(clippy::too_many_arguments)]
pub(crate) fn mncontour<F: Objective + ?Sized>(
    profiler: &Profiler<F>,
    ix: usize,
    iy: usize,
    fmin: f64,
    sigma: f64,
    numpoints: usize,
    minos_x: &MinosRun,
    minos_y: &MinosRun,
) -> Result<ContourTrace> {
    if numpoints < 4 {
        return Err(MinOptError::InvalidInput(format!(
            "a contour needs at least 4 points, got {}",
            numpoints
        )));
    }

    let params = profiler.params();
    let (px, py) = match (params.param(ix), params.param(iy)) {
        (Some(px), Some(py)) => (px, py),
        _ => {
            return Err(MinOptError::ParameterNotFound(format!(
                "parameter indices {} and {}",
                ix, iy
            )))
        }
    };
    let (x0, y0) = (px.value(), py.value());
    let (bx, by) = (*px.bounds(), *py.bounds());

    let mut warnings = Vec::new();
    let mut points = vec![
        (x0 + minos_x.upper.delta, minos_x.upper.point[iy]),
        (minos_y.upper.point[ix], y0 + minos_y.upper.delta),
        (x0 + minos_x.lower.delta, minos_x.lower.point[iy]),
        (minos_y.lower.point[ix], y0 + minos_y.lower.delta),
    ];

    let cxx = profiler.covariance_of(ix, ix);
    let cyy = profiler.covariance_of(iy, iy);
    let cxy = profiler.covariance_of(ix, iy);
    let scale_x = if cxx > 0.0 { cxx.sqrt() } else { profiler.variance(ix).sqrt() };
    let scale_y = if cyy > 0.0 { cyy.sqrt() } else { profiler.variance(iy).sqrt() };
    let inv_cov = invert(&array![[cxx, cxy], [cxy, cyy]]).ok();

    let up = profiler.config().errordef();

    while points.len() < numpoints {
        // Largest gap in error-scaled distance.
        let n = points.len();
        let mut widest = 0;
        let mut widest_dist = -1.0;
        for k in 0..n {
            let (xa, ya) = points[k];
            let (xb, yb) = points[(k + 1) % n];
            let dist = ((xb - xa) / scale_x).hypot((yb - ya) / scale_y);
            if dist > widest_dist {
                widest_dist = dist;
                widest = k;
            }
        }

        let (xa, ya) = points[widest];
        let (xb, yb) = points[(widest + 1) % n];
        let (mut ux, mut uy) = (0.5 * (xa + xb) - x0, 0.5 * (ya + yb) - y0);
        if ux == 0.0 && uy == 0.0 {
            // Gap midpoint at the minimum: use the gap normal.
            ux = (yb - ya) / scale_y * scale_x;
            uy = -(xb - xa) / scale_x * scale_y;
        }
        let norm = (ux / scale_x).hypot(uy / scale_y);
        if !(norm > 0.0) {
            return Err(MinOptError::InvalidState(
                "contour points collapsed onto the minimum".to_string(),
            ));
        }
        ux /= norm;
        uy /= norm;

        let quad = inv_cov
            .as_ref()
            .map(|c| ux * ux * c[[0, 0]] + 2.0 * ux * uy * c[[0, 1]] + uy * uy * c[[1, 1]])
            .unwrap_or(0.0);
        let t0 = if quad > 0.0 { sigma / quad.sqrt() } else { sigma };

        let mut t_max: Option<f64> = None;
        let mut limit = |dist: f64| {
            t_max = Some(t_max.map_or(dist, |t: f64| t.min(dist)).max(0.0));
        };
        if ux > 0.0 && bx.has_upper_bound() {
            limit((bx.max - x0) / ux);
        } else if ux < 0.0 && bx.has_lower_bound() {
            limit((bx.min - x0) / ux);
        }
        if uy > 0.0 && by.has_upper_bound() {
            limit((by.max - y0) / uy);
        } else if uy < 0.0 && by.has_lower_bound() {
            limit((by.min - y0) / uy);
        }

        let search = CrossSearch::new(fmin, sigma, up, t0).with_t_max(t_max);
        let crossing = function_cross(&search, |t| {
            profiler.profile_at(&[(ix, x0 + t * ux), (iy, y0 + t * uy)])
        })?;

        let index = widest + 1;
        if crossing.status != CrossStatus::Valid {
            warnings.push(NumericalWarning::ContourPointInvalid { index });
        }
        points.insert(index, (x0 + crossing.t * ux, y0 + crossing.t * uy));
    }

    Ok(ContourTrace { points, warnings })
}

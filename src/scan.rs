//! One- and two-parameter scans of the objective.
//!
//! The plain scans evaluate the objective on a grid with every other
//! parameter held at its current value. The profiled scan (`mnprofile`)
//! re-minimizes the other free parameters at each grid point instead.

use crate::error::{MinOptError, Result};
use crate::minos::profiler::Profiler;
use crate::objective::Objective;
use crate::parameters::{Parameter, Parameters};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Range of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScanBound {
    /// `value ± k·error`
    Sigma(f64),
    /// Explicit `(low, high)` range
    Range(f64, f64),
}

impl Default for ScanBound {
    fn default() -> Self {
        ScanBound::Sigma(2.0)
    }
}

impl ScanBound {
    /// Scan range for a parameter, clipped to its limits.
    pub fn range_for(&self, param: &Parameter) -> Result<(f64, f64)> {
        let (low, high) = match *self {
            ScanBound::Sigma(k) => {
                if !(k > 0.0) {
                    return Err(MinOptError::InvalidInput(format!(
                        "scan width must be positive, got {} sigma",
                        k
                    )));
                }
                (param.value() - k * param.error(), param.value() + k * param.error())
            }
            ScanBound::Range(a, b) => (a, b),
        };
        let bounds = param.bounds();
        let low = if bounds.has_lower_bound() { low.max(bounds.min) } else { low };
        let high = if bounds.has_upper_bound() { high.min(bounds.max) } else { high };
        if !(low < high) || !low.is_finite() || !high.is_finite() {
            return Err(MinOptError::InvalidInput(format!(
                "empty scan range [{}, {}] for parameter '{}'",
                low,
                high,
                param.name()
            )));
        }
        Ok((low, high))
    }
}

/// Objective along one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileScan {
    pub name: String,
    pub values: Vec<f64>,
    pub fvals: Vec<f64>,
    /// Per point, whether the conditional minimization converged (always
    /// true for plain scans)
    pub converged: Vec<bool>,
}

impl ProfileScan {
    fn plain(name: &str, values: Vec<f64>, fvals: Vec<f64>) -> Self {
        let converged = vec![true; values.len()];
        Self {
            name: name.to_string(),
            values,
            fvals,
            converged,
        }
    }

    /// Shift the function values by the minimum, `fmin` when given.
    pub fn subtract_min(&mut self, fmin: Option<f64>) {
        let off = offset(fmin, self.fvals.iter());
        for f in &mut self.fvals {
            *f -= off;
        }
    }

    /// Grid point with the lowest function value.
    pub fn minimum(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .zip(self.fvals.iter().copied())
            .filter(|(_, f)| f.is_finite())
            .fold(None, |best, p| match best {
                Some((_, fb)) if fb <= p.1 => best,
                _ => Some(p),
            })
    }
}

/// Objective on a grid of two parameters, `fvals[[i, j]] = f(x[i], y[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourGrid {
    pub x_name: String,
    pub y_name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub fvals: Array2<f64>,
}

impl ContourGrid {
    /// Shift the function values by the minimum, `fmin` when given.
    pub fn subtract_min(&mut self, fmin: Option<f64>) {
        let off = offset(fmin, self.fvals.iter());
        self.fvals.mapv_inplace(|f| f - off);
    }
}

/// `bins` evenly spaced values from `low` to `high` inclusive.
pub(crate) fn linspace(low: f64, high: f64, bins: usize) -> Result<Vec<f64>> {
    if bins < 2 {
        return Err(MinOptError::InvalidInput(format!(
            "a scan needs at least 2 bins, got {}",
            bins
        )));
    }
    let step = (high - low) / (bins - 1) as f64;
    Ok((0..bins).map(|i| low + step * i as f64).collect())
}

fn param_at(params: &Parameters, index: usize) -> Result<&Parameter> {
    params
        .param(index)
        .ok_or_else(|| MinOptError::ParameterNotFound(format!("parameter index {}", index)))
}

/// Value to subtract: the fitted minimum if known, else the lowest finite value.
fn offset<'a>(fmin: Option<f64>, fvals: impl Iterator<Item = &'a f64>) -> f64 {
    fmin.unwrap_or_else(|| {
        fvals
            .copied()
            .filter(|f| f.is_finite())
            .fold(f64::INFINITY, f64::min)
    })
}

/// Plain 1-D scan with the other parameters at their current values.
pub(crate) fn profile<F: Objective + ?Sized>(
    fcn: &F,
    params: &Parameters,
    index: usize,
    bins: usize,
    bound: ScanBound,
) -> Result<ProfileScan> {
    let param = param_at(params, index)?;
    let (low, high) = bound.range_for(param)?;
    let values = linspace(low, high, bins)?;
    let base = params.values();

    let fvals = values
        .iter()
        .map(|&v| {
            let mut full = base.clone();
            full[index] = v;
            fcn.eval(&full)
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(ProfileScan::plain(param.name(), values, fvals))
}

/// Plain 2-D scan with the other parameters at their current values.
pub(crate) fn contour<F: Objective + ?Sized>(
    fcn: &F,
    params: &Parameters,
    ix: usize,
    iy: usize,
    bins: usize,
    bound: ScanBound,
) -> Result<ContourGrid> {
    let (px, py) = (param_at(params, ix)?, param_at(params, iy)?);
    let (x, y) = grid_axes(px, py, bins, bound)?;
    let base = params.values();

    let mut fvals = Array2::<f64>::zeros((x.len(), y.len()));
    for (i, &xv) in x.iter().enumerate() {
        for (j, &yv) in y.iter().enumerate() {
            let mut full = base.clone();
            full[ix] = xv;
            full[iy] = yv;
            fvals[[i, j]] = fcn.eval(&full)?;
        }
    }

    Ok(ContourGrid {
        x_name: px.name().to_string(),
        y_name: py.name().to_string(),
        x,
        y,
        fvals,
    })
}

/// 1-D scan re-minimizing the other free parameters at each point.
pub(crate) fn mnprofile<F: Objective + ?Sized>(
    profiler: &Profiler<F>,
    index: usize,
    bins: usize,
    bound: ScanBound,
) -> Result<ProfileScan> {
    let param = param_at(profiler.params(), index)?;
    let (low, high) = bound.range_for(param)?;
    let values = linspace(low, high, bins)?;

    let mut fvals = Vec::with_capacity(values.len());
    let mut converged = Vec::with_capacity(values.len());
    for &v in &values {
        let point = profiler.profile_at(&[(index, v)])?;
        fvals.push(point.fval);
        converged.push(point.valid);
    }

    Ok(ProfileScan {
        name: param.name().to_string(),
        values,
        fvals,
        converged,
    })
}

fn grid_axes(
    px: &Parameter,
    py: &Parameter,
    bins: usize,
    bound: ScanBound,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let (xlo, xhi) = bound.range_for(px)?;
    let (ylo, yhi) = bound.range_for(py)?;
    Ok((linspace(xlo, xhi, bins)?, linspace(ylo, yhi, bins)?))
}

#[cfg(feature = "parallel")]
mod parallel {
    use super::*;
    use ndarray::Array1;
    use rayon::prelude::*;

    /// Plain 1-D scan with the grid evaluated on the rayon thread pool.
    pub(crate) fn profile_parallel<F: Objective + Sync + ?Sized>(
        fcn: &F,
        params: &Parameters,
        index: usize,
        bins: usize,
        bound: ScanBound,
    ) -> Result<ProfileScan> {
        let param = param_at(params, index)?;
        let (low, high) = bound.range_for(param)?;
        let values = linspace(low, high, bins)?;
        let base = params.values();

        let fvals = values
            .par_iter()
            .map(|&v| {
                let mut full = base.clone();
                full[index] = v;
                fcn.eval(&full)
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(ProfileScan::plain(param.name(), values, fvals))
    }

    /// Plain 2-D scan with the grid rows evaluated on the rayon thread pool.
    pub(crate) fn contour_parallel<F: Objective + Sync + ?Sized>(
        fcn: &F,
        params: &Parameters,
        ix: usize,
        iy: usize,
        bins: usize,
        bound: ScanBound,
    ) -> Result<ContourGrid> {
        let (px, py) = (param_at(params, ix)?, param_at(params, iy)?);
        let (x, y) = grid_axes(px, py, bins, bound)?;
        let base = params.values();

        let rows = x
            .par_iter()
            .map(|&xv| {
                y.iter()
                    .map(|&yv| {
                        let mut full: Array1<f64> = base.clone();
                        full[ix] = xv;
                        full[iy] = yv;
                        fcn.eval(&full)
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let mut fvals = Array2::<f64>::zeros((x.len(), y.len()));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, f) in row.into_iter().enumerate() {
                fvals[[i, j]] = f;
            }
        }

        Ok(ContourGrid {
            x_name: px.name().to_string(),
            y_name: py.name().to_string(),
            x,
            y,
            fvals,
        })
    }
}

#[cfg(feature = "parallel")]
pub(crate) use parallel::{contour_parallel, profile_parallel};

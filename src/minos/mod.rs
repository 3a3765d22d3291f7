//! # MINOS
//!
//! Asymmetric confidence intervals from the profile likelihood. For a
//! parameter `p` the interval edges are the displacements `Δ` at which the
//! objective, minimized over all other free parameters with `p` held at
//! `p̂ + Δ`, rises by `sigma²·errordef` above the minimum.
//!
//! A side that cannot be computed (limit reached, budget exhausted, a new
//! minimum found) is reported as invalid through flags, never as an error.

pub(crate) mod cross;
pub(crate) mod profiler;

use crate::error::{NumericalWarning, Result};
use crate::objective::Objective;
use cross::{function_cross, CrossSearch, CrossStatus};
use ndarray::Array1;
use profiler::Profiler;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// MINOS errors of the parameters they were computed for, by name.
pub type MinosErrors = BTreeMap<String, MinosError>;

/// Result of MINOS for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinosError {
    /// Parameter name
    pub name: String,
    /// Parameter value at the minimum
    pub min: f64,
    /// Lower error, not positive
    pub lower: f64,
    /// Upper error, not negative
    pub upper: f64,
    pub lower_valid: bool,
    pub upper_valid: bool,
    pub at_lower_limit: bool,
    pub at_upper_limit: bool,
    pub at_lower_max_fcn: bool,
    pub at_upper_max_fcn: bool,
    pub lower_new_min: bool,
    pub upper_new_min: bool,
    /// Function calls spent on this parameter
    pub nfcn: usize,
}

impl MinosError {
    /// Both sides were computed successfully.
    pub fn is_valid(&self) -> bool {
        self.lower_valid && self.upper_valid
    }

    /// The confidence interval `(min + lower, min + upper)`.
    pub fn interval(&self) -> (f64, f64) {
        (self.min + self.lower, self.min + self.upper)
    }

    /// Warnings for the invalid sides.
    pub(crate) fn warnings(&self) -> Vec<NumericalWarning> {
        let mut out = Vec::new();
        let sides = [
            (
                "lower",
                self.lower_valid,
                self.at_lower_limit,
                self.at_lower_max_fcn,
                self.lower_new_min,
            ),
            (
                "upper",
                self.upper_valid,
                self.at_upper_limit,
                self.at_upper_max_fcn,
                self.upper_new_min,
            ),
        ];
        for (side, valid, at_limit, max_fcn, new_min) in sides {
            if valid {
                continue;
            }
            let reason = if at_limit {
                "parameter limit reached"
            } else if max_fcn {
                "call limit reached"
            } else if new_min {
                "new minimum found"
            } else {
                "conditional minimization did not converge"
            };
            out.push(NumericalWarning::MinosInvalid {
                name: self.name.clone(),
                side,
                reason: reason.to_string(),
            });
        }
        out
    }
}

/// Outcome of the search on one side.
#[derive(Debug, Clone)]
pub(crate) struct MinosSide {
    /// Signed displacement from the minimum
    pub delta: f64,
    pub valid: bool,
    pub at_limit: bool,
    pub at_max_fcn: bool,
    pub new_min: bool,
    /// Full external parameter vector at the crossing
    pub point: Array1<f64>,
}

/// MINOS error of parameter `index` together with the two crossing points.
pub(crate) struct MinosRun {
    pub error: MinosError,
    pub lower: MinosSide,
    pub upper: MinosSide,
}

/// Search one side of parameter `index`; `direction` is +1 or -1.
pub(crate) fn minos_side<F: Objective + ?Sized>(
    profiler: &Profiler<F>,
    index: usize,
    direction: f64,
    fmin: f64,
    sigma: f64,
) -> Result<MinosSide> {
    let params = profiler.params();
    let (value, bounds) = match params.param(index) {
        Some(p) => (p.value(), *p.bounds()),
        None => {
            return Err(crate::error::MinOptError::ParameterNotFound(format!(
                "parameter index {}",
                index
            )))
        }
    };

    let t_max = if direction > 0.0 && bounds.has_upper_bound() {
        Some((bounds.max - value).max(0.0))
    } else if direction < 0.0 && bounds.has_lower_bound() {
        Some((value - bounds.min).max(0.0))
    } else {
        None
    };

    let up = profiler.config().errordef();
    let t0 = sigma * profiler.variance(index).sqrt();
    let search = CrossSearch::new(fmin, sigma, up, t0).with_t_max(t_max);
    let crossing = function_cross(&search, |t| {
        profiler.profile_at(&[(index, value + direction * t)])
    })?;

    Ok(MinosSide {
        delta: direction * crossing.t,
        valid: crossing.status == CrossStatus::Valid,
        at_limit: crossing.status == CrossStatus::AtLimit,
        at_max_fcn: crossing.status == CrossStatus::CallLimit,
        new_min: crossing.status == CrossStatus::NewMinimum,
        point: crossing.point.values,
    })
}

/// Run MINOS for parameter `index` on both sides.
pub(crate) fn minos_parameter<F: Objective + ?Sized>(
    profiler: &Profiler<F>,
    index: usize,
    fmin: f64,
    sigma: f64,
) -> Result<MinosRun> {
    let calls_before = profiler.nfcn();
    let lower = minos_side(profiler, index, -1.0, fmin, sigma)?;
    let upper = minos_side(profiler, index, 1.0, fmin, sigma)?;

    let (name, min) = profiler
        .params()
        .param(index)
        .map(|p| (p.name().to_string(), p.value()))
        .unwrap_or_default();

    let error = MinosError {
        name,
        min,
        lower: lower.delta.min(0.0),
        upper: upper.delta.max(0.0),
        lower_valid: lower.valid,
        upper_valid: upper.valid,
        at_lower_limit: lower.at_limit,
        at_upper_limit: upper.at_limit,
        at_lower_max_fcn: lower.at_max_fcn,
        at_upper_max_fcn: upper.at_max_fcn,
        lower_new_min: lower.new_min,
        upper_new_min: upper.new_min,
        nfcn: profiler.nfcn() - calls_before,
    };

    Ok(MinosRun {
        error,
        lower,
        upper,
    })
}

//! HESSE: covariance from the numerical second-derivative matrix.
//!
//! The matrix is computed at the current minimum in internal coordinates,
//! forced positive definite when needed and inverted. A parameter whose
//! curvature vanishes makes the whole computation fail; the previous metric
//! is then kept and the state carries the reason.

use crate::config::MinuitConfig;
use crate::error::Result;
use crate::migrad::state::{HesseFailure, MinimumState};
use crate::objective::{FcnAdapter, Objective};
use crate::uncertainty::CovarianceStatus;
use crate::utils::finite_difference::{hessian, hessian_from_gradient};
use crate::utils::linalg::{invert_spd, make_pos_def};

/// Recompute the inverse Hessian of `state`.
///
/// Returns a new state: on success the metric is replaced, `dcovar` is zero
/// and the covariance status is `Accurate` or `MadePosDef`; on failure the
/// metric is unchanged, the status is `HesseFailed` and `hesse_failure`
/// names the cause.
pub(crate) fn refine<F: Objective + ?Sized>(
    fcn: &FcnAdapter<F>,
    state: &MinimumState,
    config: &MinuitConfig,
) -> Result<MinimumState> {
    let mut next = state.clone();
    next.hesse_failure = None;

    let estimate = if fcn.has_gradient() {
        hessian_from_gradient(|p| fcn.gradient(p), &state.x, &state.gradient)?
    } else {
        hessian(
            |p| fcn.eval(p),
            &state.x,
            state.fval,
            &state.gradient,
            &fcn.bounded(),
            fcn.up(),
            &config.strategy().settings(),
        )?
    };

    if let Some(i) = estimate.zero_curvature {
        next.covariance_status = CovarianceStatus::HesseFailed;
        next.hesse_failure = Some(HesseFailure::ZeroCurvature(i));
        next.nfcn = fcn.nfcn();
        return Ok(next);
    }

    let (matrix, made_pos_def) = make_pos_def(&estimate.matrix);
    match invert_spd(&matrix) {
        Ok(inv) => {
            next.inv_hessian = inv;
            next.gradient = estimate.gradient;
            next.dcovar = 0.0;
            next.covariance_status = if made_pos_def {
                CovarianceStatus::MadePosDef
            } else {
                CovarianceStatus::Accurate
            };
        }
        Err(_) => {
            next.covariance_status = CovarianceStatus::HesseFailed;
            next.hesse_failure = Some(HesseFailure::InversionFailed);
        }
    }

    next.refresh_edm();
    next.nfcn = fcn.nfcn();
    Ok(next)
}

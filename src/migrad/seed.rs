//! Starting state for MIGRAD.

use crate::config::{MinuitConfig, Strategy};
use crate::error::{MinOptError, Result};
use crate::hesse;
use crate::migrad::convergence::MinimizationStatus;
use crate::migrad::state::MinimumState;
use crate::objective::{FcnAdapter, Objective};
use crate::uncertainty::CovarianceStatus;
use crate::utils::finite_difference::{gradient_g2, initial_gradient, numerical_gradient};
use crate::utils::{GradientState, Precision};
use ndarray::{Array1, Array2};

/// Gradient at `x`, analytic when the objective provides one.
///
/// An analytic gradient replaces only the first derivatives; the curvature
/// and step estimates of `previous` are carried over.
pub(crate) fn gradient_at<F: Objective + ?Sized>(
    fcn: &FcnAdapter<F>,
    x: &Array1<f64>,
    fval: f64,
    previous: &GradientState,
    config: &MinuitConfig,
) -> Result<GradientState> {
    if fcn.has_gradient() {
        let grad = fcn.gradient(x)?;
        if grad.iter().any(|g| !g.is_finite()) {
            return Err(MinOptError::FunctionEvaluation(
                "analytic gradient returned a non-finite value".to_string(),
            ));
        }
        return Ok(GradientState {
            grad,
            g2: previous.g2.clone(),
            gstep: previous.gstep.clone(),
        });
    }
    numerical_gradient(
        |p| fcn.eval(p),
        x,
        fval,
        previous,
        &fcn.bounded(),
        fcn.up(),
        &config.strategy().settings(),
    )
}

/// Evaluate the starting point and build the first metric.
///
/// The metric is `diag(1/g2)` from the gradient's curvature estimates, or the
/// inverse of a full numerical Hessian with the high strategy.
pub(crate) fn seed<F: Objective + ?Sized>(
    fcn: &FcnAdapter<F>,
    config: &MinuitConfig,
    x: Array1<f64>,
    dirin: &Array1<f64>,
) -> Result<MinimumState> {
    let prec = Precision::default();
    let n = x.len();

    let fval = fcn.eval(&x)?;
    if !fval.is_finite() {
        return Err(MinOptError::FunctionEvaluation(format!(
            "objective is not finite at the starting point ({})",
            fval
        )));
    }

    let init = initial_gradient(&x, dirin, fcn.up());
    let mut gradient = gradient_at(fcn, &x, fval, &init, config)?;
    if fcn.has_gradient() {
        gradient.g2 = gradient_g2(|p| fcn.gradient(p), &x, &init.gstep)?;
    }

    let mut inv_hessian = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        let g2 = gradient.g2[i];
        inv_hessian[[i, i]] = if g2.abs() > prec.eps2 { 1.0 / g2 } else { 1.0 };
        if inv_hessian[[i, i]] < 0.0 {
            inv_hessian[[i, i]] = 1.0;
        }
    }

    let mut state = MinimumState {
        x,
        fval,
        gradient,
        inv_hessian,
        edm: 0.0,
        dcovar: 1.0,
        covariance_status: CovarianceStatus::Approximate,
        hesse_failure: None,
        status: MinimizationStatus::Running,
        nfcn: 0,
        iterations: 0,
    };

    if config.strategy() == Strategy::High && n > 0 {
        let refined = hesse::refine(fcn, &state, config)?;
        if refined.hesse_failure.is_none() {
            state = refined;
        }
    }

    state.refresh_edm();
    state.nfcn = fcn.nfcn();
    Ok(state)
}

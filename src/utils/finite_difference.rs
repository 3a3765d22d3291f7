//! Finite difference methods for numerical differentiation.
//!
//! Besides a plain central-difference gradient, this module provides the
//! step-adaptive derivatives the minimizer relies on: a two-point gradient
//! that also estimates diagonal second derivatives and tunes its steps from
//! them, and a full Hessian whose diagonal steps are tuned so the sagitta of
//! the function is well above round-off.

use crate::config::StrategySettings;
use crate::error::{MinOptError, Result};
use ndarray::{Array1, Array2};

/// Default relative step size for plain central differences.
const DEFAULT_EPSILON: f64 = 1e-6;

/// Machine precision figures used to bound step sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precision {
    /// Smallest relative change of a stored value
    pub eps: f64,
    /// 2·sqrt(eps), the relative accuracy of a difference quotient
    pub eps2: f64,
}

impl Default for Precision {
    fn default() -> Self {
        let eps = 4.0 * f64::EPSILON;
        Self {
            eps,
            eps2: 2.0 * eps.sqrt(),
        }
    }
}

/// Gradient, diagonal second derivatives and step sizes at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientState {
    pub grad: Array1<f64>,
    pub g2: Array1<f64>,
    pub gstep: Array1<f64>,
}

/// Result of a numerical Hessian.
#[derive(Debug, Clone)]
pub struct HessianEstimate {
    /// Second-derivative matrix; meaningless when `zero_curvature` is set
    pub matrix: Array2<f64>,
    /// Gradient refreshed with the tuned steps
    pub gradient: GradientState,
    /// First parameter whose second derivative vanished numerically
    pub zero_curvature: Option<usize>,
}

/// Compute the gradient of a scalar function using central finite differences.
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `params` - The parameter values at which to evaluate the gradient
/// * `epsilon` - The relative step size (optional)
///
/// # Returns
///
/// * `Result<Array1<f64>>` - The gradient vector
pub fn gradient<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let mut grad = Array1::zeros(params.len());

    for j in 0..params.len() {
        let eps_j = if params[j].abs() > 1.0 {
            params[j].abs() * eps
        } else {
            eps
        };

        let mut forward = params.clone();
        forward[j] += eps_j;
        let mut backward = params.clone();
        backward[j] -= eps_j;

        grad[j] = (f(&forward)? - f(&backward)?) / (2.0 * eps_j);
    }

    Ok(grad)
}

/// First gradient estimate derived from the user's error estimates.
///
/// Assumes the function rises by `up` over one error, which fixes the
/// curvature `g2 = 2·up/dirin²`.
pub fn initial_gradient(x: &Array1<f64>, dirin: &Array1<f64>, up: f64) -> GradientState {
    let prec = Precision::default();
    let n = x.len();
    let mut grad = Array1::zeros(n);
    let mut g2 = Array1::zeros(n);
    let mut gstep = Array1::zeros(n);

    for i in 0..n {
        let dmin = 8.0 * prec.eps2 * (x[i].abs() + prec.eps2);
        let d = dirin[i].abs().max(dmin);
        g2[i] = 2.0 * up / (d * d);
        grad[i] = g2[i] * d;
        gstep[i] = (0.1 * d).max(dmin);
    }

    GradientState { grad, g2, gstep }
}

/// Two-point gradient with adaptive steps.
///
/// # Arguments
///
/// * `f` - Function of the free internal coordinates
/// * `x` - Point at which to differentiate
/// * `fval` - Function value at `x`
/// * `previous` - Last known gradient state, used to choose the steps
/// * `bounded` - Parameters whose steps are capped at 0.5 (limited ones)
/// * `up` - The errordef, which sets the tolerable change of `f`
/// * `settings` - Number of refinement cycles and tolerances
pub fn numerical_gradient<F>(
    f: F,
    x: &Array1<f64>,
    fval: f64,
    previous: &GradientState,
    bounded: &[bool],
    up: f64,
    settings: &StrategySettings,
) -> Result<GradientState>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let prec = Precision::default();
    let dfmin = 8.0 * prec.eps2 * (fval.abs() + up);
    let vrysml = 8.0 * prec.eps * prec.eps;

    let mut state = previous.clone();
    let mut shifted = x.clone();

    for i in 0..x.len() {
        let xtf = x[i];
        let epspri = prec.eps2 + (state.grad[i] * prec.eps2).abs();
        let mut stepb4 = 0.0;

        for _ in 0..settings.gradient_ncycles {
            let optstp = (dfmin / (state.g2[i].abs() + epspri)).sqrt();
            let mut step = optstp.max((0.1 * state.gstep[i]).abs());
            if bounded.get(i).copied().unwrap_or(false) {
                step = step.min(0.5);
            }
            let stpmax = 10.0 * state.gstep[i].abs();
            if stpmax > 0.0 {
                step = step.min(stpmax);
            }
            let stpmin = vrysml.max(8.0 * (prec.eps2 * xtf).abs());
            step = step.max(stpmin);

            if ((step - stepb4) / step).abs() < settings.gradient_step_tolerance {
                break;
            }
            state.gstep[i] = step;
            stepb4 = step;

            shifted[i] = xtf + step;
            let fs1 = f(&shifted)?;
            shifted[i] = xtf - step;
            let fs2 = f(&shifted)?;
            shifted[i] = xtf;

            if !(fs1.is_finite() && fs2.is_finite()) {
                return Err(MinOptError::FunctionEvaluation(format!(
                    "non-finite function value while differentiating parameter {}",
                    i
                )));
            }

            let grdb4 = state.grad[i];
            state.grad[i] = 0.5 * (fs1 - fs2) / step;
            state.g2[i] = (fs1 + fs2 - 2.0 * fval) / (step * step);

            if (grdb4 - state.grad[i]).abs() / (state.grad[i].abs() + dfmin / step)
                < settings.gradient_tolerance
            {
                break;
            }
        }
    }

    Ok(state)
}

/// Diagonal second derivatives from central differences of an analytic gradient.
pub fn gradient_g2<G>(grad: G, x: &Array1<f64>, steps: &Array1<f64>) -> Result<Array1<f64>>
where
    G: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    let mut g2 = Array1::zeros(x.len());
    let mut shifted = x.clone();
    for i in 0..x.len() {
        let d = steps[i];
        shifted[i] = x[i] + d;
        let up = grad(&shifted)?;
        shifted[i] = x[i] - d;
        let down = grad(&shifted)?;
        shifted[i] = x[i];
        g2[i] = (up[i] - down[i]) / (2.0 * d);
    }
    Ok(g2)
}

/// Numerical Hessian at a minimum candidate.
///
/// Diagonal elements come from the sagitta `(f(x+d) + f(x-d) - 2f(x))/d²`,
/// with `d` iterated towards the step that makes the sagitta a fixed small
/// fraction of `|f| + up`. A sagitta that stays at round-off level while the
/// step grows by four decades marks the parameter as having zero curvature.
/// Off-diagonal elements use the four-point mixed difference, which is
/// symmetric by construction.
pub fn hessian<F>(
    f: F,
    x: &Array1<f64>,
    fval: f64,
    previous: &GradientState,
    bounded: &[bool],
    up: f64,
    settings: &StrategySettings,
) -> Result<HessianEstimate>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let prec = Precision::default();
    let n = x.len();
    let aimsag = prec.eps2.sqrt() * (fval.abs() + up);

    let mut state = previous.clone();
    let mut matrix = Array2::zeros((n, n));
    let mut shifted = x.clone();

    for i in 0..n {
        let xtf = x[i];
        let is_bounded = bounded.get(i).copied().unwrap_or(false);
        let dmin = 8.0 * prec.eps2 * (xtf.abs() + prec.eps2);
        let mut d = state.gstep[i].abs().max(dmin);

        for _ in 0..settings.hessian_ncycles {
            let mut found = None;
            for _ in 0..5 {
                shifted[i] = xtf + d;
                let fs1 = f(&shifted)?;
                shifted[i] = xtf - d;
                let fs2 = f(&shifted)?;
                shifted[i] = xtf;

                let sag = 0.5 * (fs1 + fs2 - 2.0 * fval);
                if sag.is_finite() && sag > prec.eps2 {
                    found = Some((fs1, fs2, sag));
                    break;
                }
                if is_bounded && d >= 0.5 {
                    break;
                }
                d *= 10.0;
                if is_bounded {
                    d = d.min(0.51);
                }
            }

            let (fs1, fs2, sag) = match found {
                Some(v) => v,
                None => {
                    return Ok(HessianEstimate {
                        matrix,
                        gradient: state,
                        zero_curvature: Some(i),
                    })
                }
            };

            let g2bfor = state.g2[i];
            state.g2[i] = 2.0 * sag / (d * d);
            state.grad[i] = (fs1 - fs2) / (2.0 * d);
            state.gstep[i] = d;

            let dlast = d;
            d = (2.0 * aimsag / state.g2[i].abs()).sqrt();
            if is_bounded {
                d = d.min(0.5);
            }
            d = d.max(dmin);

            if ((d - dlast) / d).abs() < settings.hessian_step_tolerance {
                break;
            }
            if ((state.g2[i] - g2bfor) / state.g2[i]).abs() < settings.hessian_g2_tolerance {
                break;
            }
            d = d.min(10.0 * dlast).max(0.1 * dlast);
        }

        matrix[[i, i]] = state.g2[i];
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let (di, dj) = (state.gstep[i], state.gstep[j]);
            let mut corner = |si: f64, sj: f64| -> Result<f64> {
                shifted[i] = x[i] + si * di;
                shifted[j] = x[j] + sj * dj;
                let v = f(&shifted);
                shifted[i] = x[i];
                shifted[j] = x[j];
                v
            };
            let fpp = corner(1.0, 1.0)?;
            let fpm = corner(1.0, -1.0)?;
            let fmp = corner(-1.0, 1.0)?;
            let fmm = corner(-1.0, -1.0)?;
            let h = (fpp - fpm - fmp + fmm) / (4.0 * di * dj);
            matrix[[i, j]] = h;
            matrix[[j, i]] = h;
        }
    }

    Ok(HessianEstimate {
        matrix,
        gradient: state,
        zero_curvature: None,
    })
}

/// Hessian from differences of an analytic gradient.
///
/// Column `i` comes from central differences of the gradient along axis `i`;
/// the off-diagonal elements computed from both columns are averaged.
pub fn hessian_from_gradient<G>(
    grad: G,
    x: &Array1<f64>,
    previous: &GradientState,
) -> Result<HessianEstimate>
where
    G: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    let prec = Precision::default();
    let n = x.len();
    let mut raw = Array2::zeros((n, n));
    let mut shifted = x.clone();
    let mut state = previous.clone();

    for i in 0..n {
        let dmin = 8.0 * prec.eps2 * (x[i].abs() + prec.eps2);
        let d = state.gstep[i].abs().max(dmin);
        shifted[i] = x[i] + d;
        let up = grad(&shifted)?;
        shifted[i] = x[i] - d;
        let down = grad(&shifted)?;
        shifted[i] = x[i];
        for j in 0..n {
            raw[[i, j]] = (up[j] - down[j]) / (2.0 * d);
        }
        state.gstep[i] = d;
    }

    let mut matrix = Array2::zeros((n, n));
    let mut zero_curvature = None;
    for i in 0..n {
        for j in 0..n {
            matrix[[i, j]] = 0.5 * (raw[[i, j]] + raw[[j, i]]);
        }
        state.g2[i] = matrix[[i, i]];
        if zero_curvature.is_none() && !(matrix[[i, i]] > prec.eps2 * prec.eps2) {
            zero_curvature = Some(i);
        }
    }
    state.grad = grad(x)?;

    Ok(HessianEstimate {
        matrix,
        gradient: state,
        zero_curvature,
    })
}

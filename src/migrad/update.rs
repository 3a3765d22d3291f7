//! Davidon update of the inverse Hessian.

use ndarray::{Array1, Array2};

/// Rank-two update of the inverse Hessian after a step.
///
/// DFP formula, with the BFGS correction term added when the step's
/// curvature `dxᵀdg` exceeds `dgᵀVdg`. Returns the new matrix and the new
/// `dcovar`, a running measure of how much the metric still changes.
/// A step with non-positive curvature leaves the matrix untouched.
pub(crate) fn davidon_update(
    v0: &Array2<f64>,
    dx: &Array1<f64>,
    dg: &Array1<f64>,
    dcovar: f64,
) -> (Array2<f64>, f64) {
    let delgam = dx.dot(dg);
    let vg = v0.dot(dg);
    let gvg = dg.dot(&vg);

    if !(delgam > 0.0) || !(gvg > 0.0) {
        return (v0.clone(), dcovar);
    }

    let n = dx.len();
    let mut upd = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            upd[[i, j]] = dx[i] * dx[j] / delgam - vg[i] * vg[j] / gvg;
        }
    }

    if delgam > gvg {
        let flnu: Array1<f64> = dx / delgam - &vg / gvg;
        for i in 0..n {
            for j in 0..n {
                upd[[i, j]] += gvg * flnu[i] * flnu[j];
            }
        }
    }

    let v1 = v0 + &upd;
    let sum_upd: f64 = upd.iter().map(|v| v.abs()).sum();
    let sum_v1: f64 = v1.iter().map(|v| v.abs()).sum();
    let ratio = if sum_v1 > 0.0 { sum_upd / sum_v1 } else { 1.0 };

    (v1, 0.5 * (dcovar + ratio))
}

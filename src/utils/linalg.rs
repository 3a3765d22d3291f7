//! Dense linear algebra on the parameter-sized matrices of the minimizer.
//!
//! Factorizations go through nalgebra; callers keep working with ndarray.

use crate::error::{MinOptError, Result};
use crate::utils::finite_difference::Precision;
use crate::utils::matrix_convert::{
    nalgebra_to_ndarray, nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};
use nalgebra::linalg::{Cholesky, SymmetricEigen};
use nalgebra::DVector;
use ndarray::{Array1, Array2};

/// Lower-triangular Cholesky factor of a symmetric matrix.
///
/// Returns `None` when the matrix is not positive definite.
pub fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    Cholesky::new(ndarray_to_nalgebra(a)).map(|chol| nalgebra_to_ndarray(&chol.l()))
}

/// Inverse of a symmetric positive-definite matrix via its Cholesky factor.
pub fn invert_spd(a: &Array2<f64>) -> Result<Array2<f64>> {
    let chol = Cholesky::new(ndarray_to_nalgebra(a)).ok_or(MinOptError::SingularMatrix)?;
    let inv = nalgebra_to_ndarray(&chol.inverse());
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(MinOptError::SingularMatrix);
    }
    Ok(symmetrize(&inv))
}

/// General inverse by LU decomposition with partial pivoting.
pub fn invert(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MinOptError::DimensionMismatch(format!(
            "cannot invert a {}x{} matrix",
            n,
            a.ncols()
        )));
    }
    let lu = ndarray_to_nalgebra(a).lu();
    if is_near_singular(a, &lu.u().diagonal()) {
        return Err(MinOptError::SingularMatrix);
    }
    let inv = lu.try_inverse().ok_or(MinOptError::SingularMatrix)?;
    let inv = nalgebra_to_ndarray(&inv);
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(MinOptError::SingularMatrix);
    }
    Ok(inv)
}

/// Solve `a x = b`.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    if b.len() != a.nrows() {
        return Err(MinOptError::DimensionMismatch(format!(
            "right-hand side has {} rows, matrix has {}",
            b.len(),
            a.nrows()
        )));
    }
    if a.ncols() != a.nrows() {
        return Err(MinOptError::DimensionMismatch(format!(
            "cannot solve with a {}x{} matrix",
            a.nrows(),
            a.ncols()
        )));
    }
    let lu = ndarray_to_nalgebra(a).lu();
    if is_near_singular(a, &lu.u().diagonal()) {
        return Err(MinOptError::SingularMatrix);
    }
    let x = lu
        .solve(&ndarray_vec_to_nalgebra(b))
        .ok_or(MinOptError::SingularMatrix)?;
    Ok(nalgebra_vec_to_ndarray(&x))
}

/// Pivots of `U` that vanish relative to the largest element of `a`.
///
/// `try_inverse` only rejects exact zeros; rounding leaves tiny pivots on
/// rank-deficient matrices.
fn is_near_singular(a: &Array2<f64>, pivots: &DVector<f64>) -> bool {
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tiny = Precision::default().eps * scale.max(f64::MIN_POSITIVE);
    pivots.iter().any(|p| !(p.abs() > tiny))
}

/// Average a matrix with its transpose.
pub fn symmetrize(a: &Array2<f64>) -> Array2<f64> {
    (a + &a.t()) * 0.5
}

/// Eigenvalues of a symmetric matrix, ascending.
pub fn symmetric_eigenvalues(a: &Array2<f64>) -> Array1<f64> {
    let eigen = SymmetricEigen::new(ndarray_to_nalgebra(&symmetrize(a)));
    let mut eig: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
    eig.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Array1::from(eig)
}

/// Force a symmetric matrix to be positive definite.
///
/// Non-positive diagonal elements are shifted up first. The matrix is then
/// scaled to unit diagonal; if its smallest eigenvalue is below a small
/// fraction of the largest, the diagonal is raised until it is not.
///
/// Returns the corrected matrix and whether a correction was needed.
pub fn make_pos_def(a: &Array2<f64>) -> (Array2<f64>, bool) {
    let n = a.nrows();
    let prec = Precision::default();
    let epspdf = prec.eps2.max(1e-6);
    let mut m = symmetrize(a);
    if n == 0 {
        return (m, false);
    }
    let mut changed = false;

    let dgmin = (0..n).map(|i| m[[i, i]]).fold(f64::INFINITY, f64::min);
    if dgmin <= 0.0 {
        let dg = 0.5 + epspdf - dgmin;
        for i in 0..n {
            m[[i, i]] += dg;
        }
        changed = true;
    }

    let s: Array1<f64> = (0..n).map(|i| 1.0 / m[[i, i]].sqrt()).collect();
    let mut p = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            p[[i, j]] = m[[i, j]] * s[i] * s[j];
        }
    }

    let eig = symmetric_eigenvalues(&p);
    let pmin = eig[0];
    let pmax = eig[n - 1].abs().max(1.0);
    if pmin > epspdf * pmax {
        return (m, changed);
    }

    let padd = 0.001 * pmax - pmin;
    for i in 0..n {
        m[[i, i]] *= 1.0 + padd;
    }
    (m, true)
}

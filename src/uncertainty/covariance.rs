//! # Covariance Matrix Calculations
//!
//! This module converts the inverse Hessian the minimizer works with into a
//! covariance matrix of the external parameters, and derives correlation
//! matrices and standard errors from it.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// How far a covariance matrix can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceStatus {
    /// No matrix has been computed.
    NotAvailable,
    /// Variable-metric approximation that has not settled yet.
    Approximate,
    /// The matrix had to be forced positive definite.
    MadePosDef,
    /// HESSE could not compute or invert the second derivatives.
    HesseFailed,
    /// Full-accuracy matrix.
    Accurate,
}

impl CovarianceStatus {
    pub fn is_accurate(&self) -> bool {
        matches!(self, CovarianceStatus::Accurate)
    }

    /// Whether the matrix can be used at all.
    pub fn is_usable(&self) -> bool {
        !matches!(
            self,
            CovarianceStatus::NotAvailable | CovarianceStatus::HesseFailed
        )
    }
}

/// Covariance matrix over the free parameters, in external coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
    names: Vec<String>,
    matrix: Array2<f64>,
    status: CovarianceStatus,
}

impl Covariance {
    pub(crate) fn new(names: Vec<String>, matrix: Array2<f64>, status: CovarianceStatus) -> Self {
        Self {
            names,
            matrix,
            status,
        }
    }

    /// Names of the free parameters, in matrix order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn status(&self) -> CovarianceStatus {
        self.status
    }

    pub fn is_accurate(&self) -> bool {
        self.status.is_accurate()
    }

    /// Element for a pair of parameter names.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.matrix[[i, j]])
    }

    pub fn correlation(&self) -> Array2<f64> {
        calculate_correlation(&self.matrix)
    }

    pub fn standard_errors(&self) -> Array1<f64> {
        standard_errors_from_covariance(&self.matrix)
    }
}

/// External covariance from an internal inverse Hessian.
///
/// `covar[i,j] = 2·up · J[i]·J[j] · V[i,j]` with `J = d ext / d int`.
pub fn external_covariance(inv_hessian: &Array2<f64>, dext_dint: &Array1<f64>, up: f64) -> Array2<f64> {
    let n = inv_hessian.nrows();
    let mut covar = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            covar[[i, j]] = 2.0 * up * dext_dint[i] * dext_dint[j] * inv_hessian[[i, j]];
        }
    }
    covar
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                if denom > 0.0 {
                    correl[[i, j]] = covar[[i, j]] / denom;
                }
            }
        }
    }

    correl
}

/// Extract standard errors from the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .iter()
        .map(|&v| if v > 0.0 { v.sqrt() } else { 0.0 })
        .collect()
}

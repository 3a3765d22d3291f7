//! State of a minimization in internal coordinates.

use crate::migrad::convergence::{edm, MinimizationStatus};
use crate::uncertainty::CovarianceStatus;
use crate::utils::GradientState;
use ndarray::{Array1, Array2};

/// Why HESSE could not produce a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HesseFailure {
    /// Free parameter (position in the free vector) with vanishing curvature.
    ZeroCurvature(usize),
    /// The second-derivative matrix could not be inverted.
    InversionFailed,
}

/// Point, derivatives and metric of the current best minimum candidate.
#[derive(Debug, Clone)]
pub(crate) struct MinimumState {
    /// Free parameters in internal coordinates
    pub x: Array1<f64>,
    pub fval: f64,
    pub gradient: GradientState,
    /// Inverse of the second-derivative matrix in internal coordinates
    pub inv_hessian: Array2<f64>,
    pub edm: f64,
    /// Relative size of the last metric update; 0 after HESSE
    pub dcovar: f64,
    pub covariance_status: CovarianceStatus,
    pub hesse_failure: Option<HesseFailure>,
    pub status: MinimizationStatus,
    pub nfcn: usize,
    pub iterations: usize,
}

impl MinimumState {
    pub fn refresh_edm(&mut self) {
        self.edm = edm(&self.gradient.grad, &self.inv_hessian);
    }

    /// Accuracy of a variable-metric matrix follows from the last update size.
    pub fn settle_covariance_status(&mut self) {
        if matches!(
            self.covariance_status,
            CovarianceStatus::Approximate | CovarianceStatus::Accurate
        ) {
            self.covariance_status = if self.dcovar < 0.1 {
                CovarianceStatus::Accurate
            } else {
                CovarianceStatus::Approximate
            };
        }
    }
}

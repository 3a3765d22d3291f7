//! # Uncertainty Calculation
//!
//! Covariance and correlation matrices of fitted parameters. The matrices
//! are produced by MIGRAD (variable-metric estimate) and HESSE (full second
//! derivatives); profile-likelihood intervals live in [`crate::minos`].

mod covariance;

pub use covariance::{
    calculate_correlation, external_covariance, standard_errors_from_covariance, Covariance,
    CovarianceStatus,
};

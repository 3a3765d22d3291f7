//! Numerical helpers for the minimizer.

pub mod finite_difference;
pub mod linalg;
pub mod matrix_convert;

pub use finite_difference::{GradientState, HessianEstimate, Precision};

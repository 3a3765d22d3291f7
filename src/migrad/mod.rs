//! # MIGRAD
//!
//! Variable-metric minimization in the style of MINUIT. Each iteration takes
//! the quasi-Newton step `-V·g`, runs a parabolic line search along it and
//! updates the inverse-Hessian estimate `V` with the Davidon formula.
//! Iteration stops when the estimated distance to minimum `½ gᵀVg` falls
//! below `0.002·tol·errordef`.

pub(crate) mod algorithm;
pub mod convergence;
pub(crate) mod line_search;
pub(crate) mod seed;
pub(crate) mod state;
pub(crate) mod update;

pub(crate) use algorithm::Migrad;
pub use convergence::{edm, MinimizationStatus};

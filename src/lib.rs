//! # minopt-rs
//!
//! `minopt-rs` is a Rust implementation of the MINUIT family of function
//! minimization and error analysis algorithms.
//!
//! The library provides:
//! - MIGRAD, a variable-metric minimizer with an EDM convergence criterion
//! - HESSE, the covariance matrix from the numerical second derivatives
//! - MINOS, asymmetric confidence intervals from the profile likelihood
//! - Profiled and plain contours and scans of the objective
//! - A parameter system with errors, one- or two-sided limits and fixing
//!
//! ## Basic Usage
//!
//! ```
//! use minopt_rs::{FnObjective, Minuit};
//! use ndarray::Array1;
//!
//! let f = FnObjective::new(|p: &Array1<f64>| {
//!     Ok((p[0] - 2.0).powi(2) + (p[1] - 5.0).powi(2) + 10.0)
//! });
//! let mut m = Minuit::builder(f, &["x", "y"])
//!     .value("x", 1.0)
//!     .error("x", 0.5)
//!     .build()
//!     .unwrap();
//!
//! let fit = m.migrad().unwrap();
//! assert!(fit.is_valid());
//! assert!((fit.fval - 10.0).abs() < 1e-6);
//! ```

// Public modules
pub mod config;
pub mod error;
pub mod fitarg;
pub mod migrad;
pub mod minos;
pub mod minuit;
pub mod objective;
pub mod scan;

// Parameter system
pub mod parameters;

// Numerics
pub mod uncertainty;
pub mod utils;

mod contour;
mod hesse;

// Re-exports for convenience
pub use config::{MinuitConfig, Strategy};
pub use error::{MinOptError, NumericalWarning, Result};
pub use fitarg::{FitArg, FitArgValue};
pub use migrad::MinimizationStatus;
pub use minos::{MinosError, MinosErrors};
pub use minuit::{FitState, FitStatus, Minuit, MinuitBuilder};
pub use objective::{FnObjective, Objective};
pub use parameters::{Parameter, Parameters};
pub use scan::{ContourGrid, ProfileScan, ScanBound};
pub use uncertainty::{Covariance, CovarianceStatus};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Parameter System
//!
//! This module provides the parameter store used by the minimizer: named
//! parameters with initial errors, optional one- or two-sided limits and a
//! fixed flag, kept in declaration order.
//!
//! ## Core Components
//!
//! - [`Parameter`]: Individual parameters with value, error, limits and fixed flag
//! - [`Parameters`]: An ordered collection with a name index and a free-subvector view
//! - [`Bounds`] and [`BoundsTransform`]: Limits and the Minuit-style mapping
//!   between bounded external and unbounded internal coordinates
//!
//! ## Example Usage
//!
//! ```rust
//! use minopt_rs::parameters::Parameters;
//! use ndarray::array;
//!
//! let mut params = Parameters::from_names(&["x", "y", "z"]).unwrap();
//! params.set("z", 7.0, 0.5, Some((Some(0.0), None)), false).unwrap();
//! params.fix("y").unwrap();
//!
//! // The minimizer only sees the free parameters
//! assert_eq!(params.free_names(), vec!["x", "z"]);
//! let full = params.to_full(&array![1.0, 2.0]).unwrap();
//! assert_eq!(full, array![1.0, 0.0, 2.0]);
//! ```

pub mod bounds;
pub mod parameter;
pub mod parameters;


// Re-export key types
pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use parameter::{Parameter, ParameterError};
pub use parameters::Parameters;

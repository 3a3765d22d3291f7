//! Parameter definition and implementation
//!
//! This module provides the Parameter struct, the fundamental building block
//! of the parameter store. A parameter has a value, an initial error that
//! doubles as the first step size of the minimizer, optional one- or
//! two-sided limits, and a fixed flag.

use crate::parameters::bounds::{Bounds, BoundsError, BoundsTransform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Parameter '{name}' is declared more than once")]
    DuplicateName { name: String },

    #[error("Parameter '{name}' needs a positive finite error, got {error}")]
    InvalidError { name: String, error: f64 },

    #[error("Parameter '{name}' needs a finite value, got {value}")]
    InvalidValue { name: String, value: f64 },

    #[error("Expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// A parameter of a minimization problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    pub name: String,

    /// Current value of the parameter
    value: f64,

    /// Initial value when created (for reset operations)
    init_value: f64,

    /// Uncertainty estimate; the initial step size before a fit
    error: f64,

    /// Limits; infinities mark a missing side
    #[serde(default)]
    bounds: Bounds,

    /// Whether this parameter is held constant during minimization
    #[serde(default)]
    fixed: bool,
}

impl Parameter {
    /// Create a new parameter with the given name and value
    ///
    /// The parameter starts free, unbounded, with an error of 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::parameters::parameter::Parameter;
    ///
    /// let param = Parameter::new("x", 2.0);
    /// assert_eq!(param.name(), "x");
    /// assert_eq!(param.value(), 2.0);
    /// assert_eq!(param.error(), 1.0);
    /// assert!(!param.is_fixed());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            error: 1.0,
            bounds: Bounds::default(),
            fixed: false,
        }
    }

    /// Create a new parameter with the given name, value, and bounds
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the parameter
    /// * `value` - Initial value of the parameter, clamped into the bounds
    /// * `min` - Minimum allowed value for the parameter
    /// * `max` - Maximum allowed value for the parameter
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::parameters::parameter::Parameter;
    ///
    /// let param = Parameter::with_bounds("amplitude", 30.0, 0.0, 20.0).unwrap();
    /// assert_eq!(param.value(), 20.0);
    /// assert!(Parameter::with_bounds("amplitude", 1.0, 3.0, 2.0).is_err());
    /// ```
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;
        let value = bounds.clamp(value);

        Ok(Self {
            bounds,
            ..Self::new(name, value)
        })
    }

    /// Create a parameter from every declared attribute at once.
    ///
    /// The limits are stored as given and not checked; call
    /// [`Parameter::validate_bounds`] before using them in a fit.
    pub fn declared(
        name: &str,
        value: f64,
        error: f64,
        limits: Option<(Option<f64>, Option<f64>)>,
        fixed: bool,
    ) -> Result<Self, ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::InvalidValue {
                name: name.to_string(),
                value,
            });
        }
        check_error(name, error)?;
        let bounds = limits
            .map(|(min, max)| Bounds::unchecked(min, max))
            .unwrap_or_default();
        Ok(Self {
            name: name.to_string(),
            value,
            init_value: value,
            error,
            bounds,
            fixed,
        })
    }

    /// Builder-style error setter
    pub fn with_error(mut self, error: f64) -> Result<Self, ParameterError> {
        self.set_error(error)?;
        Ok(self)
    }

    /// Builder-style fixed flag
    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Get the current value of the parameter
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value of the parameter
    ///
    /// Fails if the value is not finite or lies outside valid bounds.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::InvalidValue {
                name: self.name.clone(),
                value,
            });
        }
        if self.bounds.validate().is_ok() && !self.bounds.is_within_bounds(value) {
            return Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.bounds.min,
                max: self.bounds.max,
            }
            .into());
        }
        self.value = value;
        Ok(())
    }

    /// Set the value, moving it onto the nearest limit if it lies outside.
    ///
    /// Returns the value actually stored.
    pub fn set_value_clamped(&mut self, value: f64) -> f64 {
        self.value = if self.bounds.validate().is_ok() {
            self.bounds.clamp(value)
        } else {
            value
        };
        self.value
    }

    /// Move a value sitting on a limit one error inside the allowed range.
    ///
    /// For two-sided limits the move is at most half the range. Returns the
    /// value actually stored.
    pub fn move_off_limit(&mut self) -> f64 {
        let b = self.bounds;
        if b.validate().is_err() {
            return self.value;
        }
        let on_low = b.has_lower_bound() && self.value <= b.min;
        let on_high = b.has_upper_bound() && self.value >= b.max;
        if on_low == on_high {
            return self.value;
        }
        let step = if b.has_lower_bound() && b.has_upper_bound() {
            self.error.min(0.5 * (b.max - b.min))
        } else {
            self.error
        };
        self.value = if on_low { b.min + step } else { b.max - step };
        self.value
    }

    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    /// Reset the parameter to its initial value
    pub fn reset(&mut self) {
        self.value = self.init_value;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current error (step size before a fit, uncertainty after one)
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Set the error; it must be positive and finite
    pub fn set_error(&mut self, error: f64) -> Result<(), ParameterError> {
        check_error(&self.name, error)?;
        self.error = error;
        Ok(())
    }

    /// Store a fitted uncertainty, keeping the old one if the new one is unusable
    pub(crate) fn update_error(&mut self, error: f64) {
        if error.is_finite() && error > 0.0 {
            self.error = error;
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Limits as a pair of optional values, `None` when the parameter is unbounded
    pub fn limits(&self) -> Option<(Option<f64>, Option<f64>)> {
        if self.has_limits() {
            Some(self.bounds.limits())
        } else {
            None
        }
    }

    pub fn has_limits(&self) -> bool {
        self.bounds.is_bounded()
    }

    /// Set checked limits and clamp the value into them
    pub fn set_limits(&mut self, min: Option<f64>, max: Option<f64>) -> Result<(), ParameterError> {
        let bounds = Bounds::from_limits(min, max)?;
        self.bounds = bounds;
        self.value = bounds.clamp(self.value);
        Ok(())
    }

    /// Check the limits stored on the parameter
    pub fn validate_bounds(&self) -> Result<(), ParameterError> {
        self.bounds.validate().map_err(ParameterError::from)
    }

    /// Get the bounds transform for this parameter
    pub fn bounds_transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounds)
    }

    /// Convert the current value to internal coordinates
    pub fn to_internal(&self) -> Result<f64, ParameterError> {
        Ok(self.bounds_transform().to_internal(self.value)?)
    }

    /// Convert an internal value to an external value
    pub fn from_internal(&self, internal_value: f64) -> f64 {
        self.bounds_transform().to_external(internal_value)
    }

    /// Current error expressed as a step in internal coordinates
    pub fn internal_error(&self) -> Result<f64, ParameterError> {
        Ok(self
            .bounds_transform()
            .internal_error(self.value, self.error)?)
    }
}

fn check_error(name: &str, error: f64) -> Result<(), ParameterError> {
    if error.is_finite() && error > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::InvalidError {
            name: name.to_string(),
            error,
        })
    }
}

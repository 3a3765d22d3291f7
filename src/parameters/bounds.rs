//! Parameter bounds implementation
//!
//! This module provides one- and two-sided parameter limits and the
//! Minuit-style transformation between bounded external values and the
//! unbounded internal values the minimizer works with.

use crate::utils::finite_difference::Precision;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Represents the bounds constraints on a parameter
///
/// A missing side is stored as an infinity. Serialized as a pair of optional
/// numbers, `[min, max]`, with `null` for a missing side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.limits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (min, max) = <(Option<f64>, Option<f64>)>::deserialize(deserializer)?;
        Ok(Bounds::unchecked(min, max))
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create a new bounds constraints with min and max values
    ///
    /// # Arguments
    ///
    /// * `min` - Minimum allowed value for the parameter
    /// * `max` - Maximum allowed value for the parameter
    ///
    /// # Returns
    ///
    /// A new `Bounds` object if min <= max, or an error otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(3.0, 2.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Create bounds from optional limits, as written in a `limit_<name>` keyword
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::from_limits(None, Some(9.0)).unwrap();
    /// assert!(!bounds.has_lower_bound());
    /// assert_eq!(bounds.limits(), (None, Some(9.0)));
    /// ```
    pub fn from_limits(min: Option<f64>, max: Option<f64>) -> Result<Self, BoundsError> {
        let bounds = Self::unchecked(min, max);
        bounds.validate()?;
        Ok(bounds)
    }

    /// Create bounds from optional limits without checking their order.
    ///
    /// Used for declared limits that are only validated when a fit starts.
    pub fn unchecked(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min: min.unwrap_or(NEG_INFINITY),
            max: max.unwrap_or(INFINITY),
        }
    }

    /// Check that min does not exceed max
    pub fn validate(&self) -> Result<(), BoundsError> {
        if self.min.is_nan() || self.max.is_nan() || self.min > self.max {
            return Err(BoundsError::InvalidBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a bounds constraint with only a minimum value
    pub fn min_only(min: f64) -> Self {
        Self { min, max: INFINITY }
    }

    /// Create a bounds constraint with only a maximum value
    pub fn max_only(max: f64) -> Self {
        Self {
            min: NEG_INFINITY,
            max,
        }
    }

    /// The limits as a pair of optional values
    pub fn limits(&self) -> (Option<f64>, Option<f64>) {
        let min = if self.has_lower_bound() {
            Some(self.min)
        } else {
            None
        };
        let max = if self.has_upper_bound() {
            Some(self.max)
        } else {
            None
        };
        (min, max)
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the parameter is bounded on at least one side
    pub fn is_bounded(&self) -> bool {
        self.has_lower_bound() || self.has_upper_bound()
    }

    /// Check if the parameter is bounded from below
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Check if the parameter is bounded from above
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value to be within the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Implements the Minuit-style parameter transformations for handling bounds constraints
///
/// This allows the optimizer to work with unbounded parameters internally, while the
/// external values are constrained to be within the specified bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Transform an internal parameter value to an external value
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => b.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => b.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => b.min + (internal_value.sin() + 1.0) * (b.max - b.min) / 2.0,
        }
    }

    /// Transform an external parameter value to an internal value
    ///
    /// # Returns
    ///
    /// The corresponding internal value, or an error if the external value is outside bounds
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }

        let b = &self.bounds;
        if !b.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: b.min,
                max: b.max,
            });
        }

        // Keep away from the points where dext/dint vanishes.
        let prec = Precision::default();
        let distnn = 8.0 * prec.eps2.sqrt();

        Ok(match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - b.min + 1.0).powi(2) - 1.0)
                .max(0.0)
                .sqrt()
                .max(distnn),
            (false, true) => ((b.max - external_value + 1.0).powi(2) - 1.0)
                .max(0.0)
                .sqrt()
                .max(distnn),
            (true, true) => {
                let range = b.max - b.min;
                if range <= 0.0 {
                    0.0
                } else {
                    let scaled = 2.0 * (external_value - b.min) / range - 1.0;
                    if scaled * scaled > 1.0 - prec.eps2 {
                        scaled.signum() * (FRAC_PI_2 - distnn)
                    } else {
                        scaled.asin()
                    }
                }
            }
        })
    }

    /// Derivative of the external value with respect to the internal value
    pub fn dext_dint(&self, internal_value: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => 1.0,
            (true, false) => internal_value / (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => -internal_value / (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => (b.max - b.min) * internal_value.cos() / 2.0,
        }
    }

    /// Scale the gradient of the objective function for a parameter
    ///
    /// # Arguments
    ///
    /// * `internal_value` - The internal parameter value
    /// * `gradient` - The gradient with respect to the external parameter
    ///
    /// # Returns
    ///
    /// The gradient with respect to the internal parameter
    pub fn scale_gradient(&self, internal_value: f64, gradient: f64) -> f64 {
        gradient * self.dext_dint(internal_value)
    }

    /// Step in internal coordinates equivalent to an external error
    pub fn internal_error(&self, external_value: f64, error: f64) -> Result<f64, BoundsError> {
        if !self.bounds.is_bounded() {
            return Ok(error);
        }
        let center = self.to_internal(external_value)?;
        let up = self.to_internal(self.bounds.clamp(external_value + error))?;
        let down = self.to_internal(self.bounds.clamp(external_value - error))?;
        let step = 0.5 * ((up - center).abs() + (center - down).abs());
        if step > 0.0 {
            Ok(step)
        } else {
            // Value sits on the limit; fall back to the local slope.
            let slope = self.dext_dint(center).abs();
            Ok(if slope > 0.0 { error / slope } else { 1.0 })
        }
    }

    /// External error from an internal value and its internal uncertainty
    pub fn external_error(&self, internal_value: f64, internal_error: f64) -> f64 {
        if !self.bounds.is_bounded() {
            return internal_error;
        }
        let center = self.to_external(internal_value);
        let up = self.to_external(internal_value + internal_error);
        let down = self.to_external(internal_value - internal_error);
        let both = self.bounds.has_lower_bound() && self.bounds.has_upper_bound();
        if both && internal_error > 1.0 {
            // The sine wraps around; the whole range is covered.
            return self.bounds.max - self.bounds.min;
        }
        0.5 * ((up - center).abs() + (down - center).abs())
    }
}

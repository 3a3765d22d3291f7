//! Parameters collection implementation
//!
//! This module provides the Parameters struct, an ordered collection of
//! Parameter objects with a name index. Declaration order is the order of the
//! full parameter vector handed to the objective; the free subvector keeps
//! the same relative order with fixed parameters removed.

use crate::parameters::parameter::{Parameter, ParameterError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ordered collection of named parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Parameter>", into = "Vec<Parameter>")]
pub struct Parameters {
    /// Parameters in declaration order
    params: Vec<Parameter>,

    /// Map of parameter names to positions in `params`
    index: HashMap<String, usize>,
}

impl Parameters {
    /// Create a new empty parameters collection
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::parameters::parameters::Parameters;
    ///
    /// let params = Parameters::new();
    /// assert_eq!(params.len(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from a list of names, all starting at 0 with error 1
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::parameters::Parameters;
    ///
    /// let params = Parameters::from_names(&["x", "y"]).unwrap();
    /// assert_eq!(params.names(), vec!["x", "y"]);
    /// assert!(Parameters::from_names(&["x", "x"]).is_err());
    /// ```
    pub fn from_names(names: &[&str]) -> Result<Self, ParameterError> {
        let mut params = Self::new();
        for name in names {
            params.add_param(name, 0.0)?;
        }
        Ok(params)
    }

    /// Add a parameter to the collection
    ///
    /// # Returns
    ///
    /// `Ok(())` if the parameter was added, or an error if a parameter with the
    /// same name already exists
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.index.contains_key(param.name()) {
            return Err(ParameterError::DuplicateName {
                name: param.name().to_string(),
            });
        }
        self.index.insert(param.name().to_string(), self.params.len());
        self.params.push(param);
        Ok(())
    }

    /// Add a new parameter with the given name and value
    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    /// Add a new parameter with the given name, value and bounds
    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    /// Replace every attribute of an existing parameter
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the parameter to change
    /// * `value` - New value, clamped into the new limits
    /// * `error` - New error, must be positive
    /// * `limits` - New limits, `None` removes them
    /// * `fixed` - New fixed flag
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::parameters::Parameters;
    ///
    /// let mut params = Parameters::from_names(&["x", "y"]).unwrap();
    /// params.set("y", 3.0, 0.5, Some((Some(0.0), None)), true).unwrap();
    /// assert_eq!(params.free_names(), vec!["x"]);
    /// assert!(params.set("y", 3.0, 0.5, Some((Some(3.0), Some(2.0))), true).is_err());
    /// assert!(params.set("z", 3.0, 0.5, None, false).is_err());
    /// ```
    pub fn set(
        &mut self,
        name: &str,
        value: f64,
        error: f64,
        limits: Option<(Option<f64>, Option<f64>)>,
        fixed: bool,
    ) -> Result<(), ParameterError> {
        let idx = self.require(name)?;
        let mut param = Parameter::declared(name, value, error, None, fixed)?;
        if let Some((min, max)) = limits {
            param.set_limits(min, max)?;
        }
        self.params[idx] = param;
        Ok(())
    }

    /// Get a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    /// Get a mutable reference to a parameter by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.params[i]),
            None => None,
        }
    }

    /// Position of a parameter in the full vector
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn require(&self, name: &str) -> Result<usize, ParameterError> {
        self.index_of(name)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    /// Parameter at a position of the full vector
    pub fn param(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    pub(crate) fn param_mut(&mut self, index: usize) -> Option<&mut Parameter> {
        self.params.get_mut(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Names in declaration order
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Fix a parameter at its current value
    pub fn fix(&mut self, name: &str) -> Result<(), ParameterError> {
        let idx = self.require(name)?;
        self.params[idx].set_fixed(true);
        Ok(())
    }

    /// Release a fixed parameter
    pub fn release(&mut self, name: &str) -> Result<(), ParameterError> {
        let idx = self.require(name)?;
        self.params[idx].set_fixed(false);
        Ok(())
    }

    /// Positions of free parameters in the full vector
    pub fn free_indices(&self) -> Vec<usize> {
        (0..self.params.len())
            .filter(|&i| !self.params[i].is_fixed())
            .collect()
    }

    /// Positions of fixed parameters in the full vector
    pub fn fixed_indices(&self) -> Vec<usize> {
        (0..self.params.len())
            .filter(|&i| self.params[i].is_fixed())
            .collect()
    }

    pub fn n_free(&self) -> usize {
        self.params.iter().filter(|p| !p.is_fixed()).count()
    }

    /// Names of free parameters, in order
    pub fn free_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| !p.is_fixed())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Names of fixed parameters, in order
    pub fn fixed_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.is_fixed())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Full vector of current values
    pub fn values(&self) -> Array1<f64> {
        self.params.iter().map(|p| p.value()).collect()
    }

    /// Full vector of current errors
    pub fn errors(&self) -> Array1<f64> {
        self.params.iter().map(|p| p.error()).collect()
    }

    /// Expand a free-parameter vector into a full vector
    ///
    /// Fixed positions take the stored values.
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::parameters::Parameters;
    /// use ndarray::array;
    ///
    /// let mut params = Parameters::from_names(&["x", "y", "z"]).unwrap();
    /// params.get_mut("y").unwrap().set_value(10.0).unwrap();
    /// params.fix("y").unwrap();
    ///
    /// let full = params.to_full(&array![1.0, 3.0]).unwrap();
    /// assert_eq!(full, array![1.0, 10.0, 3.0]);
    /// assert_eq!(params.from_full(&full).unwrap(), array![1.0, 3.0]);
    /// ```
    pub fn to_full(&self, free: &Array1<f64>) -> Result<Array1<f64>, ParameterError> {
        let free_idx = self.free_indices();
        if free.len() != free_idx.len() {
            return Err(ParameterError::LengthMismatch {
                expected: free_idx.len(),
                actual: free.len(),
            });
        }
        let mut full = self.values();
        for (k, &i) in free_idx.iter().enumerate() {
            full[i] = free[k];
        }
        Ok(full)
    }

    /// Extract the free subvector of a full vector
    pub fn from_full(&self, full: &Array1<f64>) -> Result<Array1<f64>, ParameterError> {
        if full.len() != self.params.len() {
            return Err(ParameterError::LengthMismatch {
                expected: self.params.len(),
                actual: full.len(),
            });
        }
        Ok(self.free_indices().iter().map(|&i| full[i]).collect())
    }

    /// Check the limits of every parameter
    pub fn validate_bounds(&self) -> Result<(), ParameterError> {
        for param in &self.params {
            param.validate_bounds()?;
        }
        Ok(())
    }

    /// Free parameter values in internal coordinates
    pub fn free_internal_values(&self) -> Result<Array1<f64>, ParameterError> {
        self.free_indices()
            .iter()
            .map(|&i| self.params[i].to_internal())
            .collect()
    }

    /// Free parameter errors as steps in internal coordinates
    pub fn free_internal_errors(&self) -> Result<Array1<f64>, ParameterError> {
        self.free_indices()
            .iter()
            .map(|&i| self.params[i].internal_error())
            .collect()
    }

    /// Full external vector for a free internal vector
    pub fn external_from_internal(&self, internal: &Array1<f64>) -> Result<Array1<f64>, ParameterError> {
        let free_idx = self.free_indices();
        if internal.len() != free_idx.len() {
            return Err(ParameterError::LengthMismatch {
                expected: free_idx.len(),
                actual: internal.len(),
            });
        }
        let mut full = self.values();
        for (k, &i) in free_idx.iter().enumerate() {
            full[i] = self.params[i].from_internal(internal[k]);
        }
        Ok(full)
    }

    /// Store the result of a minimization over the free parameters
    ///
    /// `internal` holds the free internal values and `internal_errors` their
    /// internal uncertainties.
    pub fn update_from_internal(
        &mut self,
        internal: &Array1<f64>,
        internal_errors: Option<&Array1<f64>>,
    ) -> Result<(), ParameterError> {
        let free_idx = self.free_indices();
        if internal.len() != free_idx.len() {
            return Err(ParameterError::LengthMismatch {
                expected: free_idx.len(),
                actual: internal.len(),
            });
        }
        for (k, &i) in free_idx.iter().enumerate() {
            let param = &mut self.params[i];
            let external = param.from_internal(internal[k]);
            param.set_value_clamped(external);
            if let Some(errs) = internal_errors {
                let err = param.bounds_transform().external_error(internal[k], errs[k]);
                param.update_error(err);
            }
        }
        Ok(())
    }

    /// Reset every parameter to its initial value
    pub fn reset(&mut self) {
        for param in &mut self.params {
            param.reset();
        }
    }

    /// Save parameters to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load parameters from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl TryFrom<Vec<Parameter>> for Parameters {
    type Error = ParameterError;

    fn try_from(list: Vec<Parameter>) -> Result<Self, Self::Error> {
        let mut params = Parameters::new();
        for param in list {
            params.add(param)?;
        }
        Ok(params)
    }
}

impl From<Parameters> for Vec<Parameter> {
    fn from(params: Parameters) -> Self {
        params.params
    }
}

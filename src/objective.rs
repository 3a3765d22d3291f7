//! Objective function trait and adapters.
//!
//! This module defines the `Objective` trait, the scalar function to be
//! minimized, a closure wrapper for it, and the adapter the minimizer uses to
//! evaluate the objective at a vector of free parameters in internal
//! (unbounded) coordinates.

use crate::error::{MinOptError, Result};
use crate::parameters::{BoundsTransform, Parameters};
use ndarray::Array1;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A scalar function of a parameter vector.
///
/// The vector passed to `eval` always holds every declared parameter, in
/// declaration order, fixed ones included.
pub trait Objective {
    /// Evaluate the function at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The full parameter vector
    ///
    /// # Returns
    ///
    /// * The function value, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<f64>;

    /// Evaluate the gradient at the given parameters.
    ///
    /// # Default Implementation
    ///
    /// Central finite differences. The minimizer only calls this method when
    /// `has_custom_gradient` returns true; otherwise it uses its own adaptive
    /// numerical derivatives.
    fn gradient(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        crate::utils::finite_difference::gradient(|p| self.eval(p), params, None)
    }

    /// Check if this objective provides an analytic gradient.
    fn has_custom_gradient(&self) -> bool {
        false
    }

    /// Number of parameters the function expects, when it knows it.
    ///
    /// Used to reject a parameter list of the wrong length at construction.
    fn parameter_count(&self) -> Option<usize> {
        None
    }
}

impl<T: Objective + ?Sized> Objective for &T {
    fn eval(&self, params: &Array1<f64>) -> Result<f64> {
        (**self).eval(params)
    }

    fn gradient(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        (**self).gradient(params)
    }

    fn has_custom_gradient(&self) -> bool {
        (**self).has_custom_gradient()
    }

    fn parameter_count(&self) -> Option<usize> {
        (**self).parameter_count()
    }
}

type GradientFn = fn(&Array1<f64>) -> Result<Array1<f64>>;

/// Objective built from closures.
///
/// # Examples
///
/// ```
/// use minopt_rs::{FnObjective, Objective};
/// use ndarray::{array, Array1};
///
/// let f = FnObjective::new(|p: &Array1<f64>| Ok((p[0] - 2.0).powi(2) + (p[1] - 5.0).powi(2) + 10.0))
///     .with_gradient(|p: &Array1<f64>| Ok(array![2.0 * (p[0] - 2.0), 2.0 * (p[1] - 5.0)]));
///
/// assert_eq!(f.eval(&array![2.0, 5.0]).unwrap(), 10.0);
/// assert!(f.has_custom_gradient());
/// ```
pub struct FnObjective<F, G = GradientFn> {
    func: F,
    grad: Option<G>,
    n_params: Option<usize>,
}

impl<F> FnObjective<F>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    /// Wrap a function without an analytic gradient.
    pub fn new(func: F) -> Self {
        Self {
            func,
            grad: None,
            n_params: None,
        }
    }
}

impl<F, G> FnObjective<F, G>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    /// Attach an analytic gradient.
    pub fn with_gradient<G2>(self, grad: G2) -> FnObjective<F, G2>
    where
        G2: Fn(&Array1<f64>) -> Result<Array1<f64>>,
    {
        FnObjective {
            func: self.func,
            grad: Some(grad),
            n_params: self.n_params,
        }
    }

    /// Declare how many parameters the function takes.
    pub fn with_parameter_count(mut self, n: usize) -> Self {
        self.n_params = Some(n);
        self
    }
}

impl<F, G> Objective for FnObjective<F, G>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
    G: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    fn eval(&self, params: &Array1<f64>) -> Result<f64> {
        (self.func)(params)
    }

    fn gradient(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        match &self.grad {
            Some(grad) => grad(params),
            None => crate::utils::finite_difference::gradient(|p| self.eval(p), params, None),
        }
    }

    fn has_custom_gradient(&self) -> bool {
        self.grad.is_some()
    }

    fn parameter_count(&self) -> Option<usize> {
        self.n_params
    }
}

/// Evaluates an objective at free internal coordinates.
///
/// Holds a snapshot of the parameter layout: which positions are free, the
/// values of the fixed ones, and the bounds transform of each free one.
pub(crate) struct FcnAdapter<'a, F: Objective + ?Sized> {
    fcn: &'a F,
    params: &'a Parameters,
    free: Vec<usize>,
    transforms: Vec<BoundsTransform>,
    base: Array1<f64>,
    up: f64,
    calls: AtomicUsize,
}

impl<'a, F: Objective + ?Sized> FcnAdapter<'a, F> {
    pub fn new(fcn: &'a F, params: &'a Parameters, up: f64) -> Self {
        let free = params.free_indices();
        let transforms = free
            .iter()
            .filter_map(|&i| params.param(i).map(|p| p.bounds_transform()))
            .collect();
        Self {
            fcn,
            params,
            free,
            transforms,
            base: params.values(),
            up,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn up(&self) -> f64 {
        self.up
    }

    /// Number of function evaluations made through this adapter.
    pub fn nfcn(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Which free parameters carry limits.
    pub fn bounded(&self) -> Vec<bool> {
        self.free
            .iter()
            .map(|&i| self.params.param(i).map_or(false, |p| p.has_limits()))
            .collect()
    }

    /// Starting point and step sizes in internal coordinates.
    pub fn start(&self) -> Result<(Array1<f64>, Array1<f64>)> {
        let values = self
            .params
            .free_internal_values()
            .map_err(|e| MinOptError::BoundsViolation(e.to_string()))?;
        let errors = self
            .params
            .free_internal_errors()
            .map_err(|e| MinOptError::BoundsViolation(e.to_string()))?;
        Ok((values, errors))
    }

    /// Full external vector for a free internal vector.
    pub fn external(&self, internal: &Array1<f64>) -> Result<Array1<f64>> {
        if internal.len() != self.free.len() {
            return Err(MinOptError::DimensionMismatch(format!(
                "expected {} free parameters, got {}",
                self.free.len(),
                internal.len()
            )));
        }
        let mut full = self.base.clone();
        for (k, &i) in self.free.iter().enumerate() {
            full[i] = self.transforms[k].to_external(internal[k]);
        }
        Ok(full)
    }

    /// Derivatives of external with respect to internal coordinates.
    pub fn dext_dint(&self, internal: &Array1<f64>) -> Array1<f64> {
        self.transforms
            .iter()
            .zip(internal.iter())
            .map(|(t, &v)| t.dext_dint(v))
            .collect()
    }

    /// Evaluate at a free internal vector.
    pub fn eval(&self, internal: &Array1<f64>) -> Result<f64> {
        let full = self.external(internal)?;
        self.eval_full(&full)
    }

    /// Evaluate at a full external vector.
    pub fn eval_full(&self, full: &Array1<f64>) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.fcn.eval(full)
    }

    pub fn has_gradient(&self) -> bool {
        self.fcn.has_custom_gradient()
    }

    /// Analytic gradient with respect to the free internal coordinates.
    pub fn gradient(&self, internal: &Array1<f64>) -> Result<Array1<f64>> {
        let full = self.external(internal)?;
        let g = self.fcn.gradient(&full)?;
        if g.len() != full.len() {
            return Err(MinOptError::DimensionMismatch(format!(
                "gradient has {} components, expected {}",
                g.len(),
                full.len()
            )));
        }
        Ok(self
            .free
            .iter()
            .enumerate()
            .map(|(k, &i)| self.transforms[k].scale_gradient(internal[k], g[i]))
            .collect())
    }
}

//! The `Minuit` facade.
//!
//! [`Minuit`] owns the objective, the parameter store, the configuration and
//! the results of the last fit. Operations run sequentially on `&mut self`:
//! [`Minuit::migrad`] finds the minimum, [`Minuit::hesse`] refines the
//! covariance matrix, and [`Minuit::minos`] and [`Minuit::mncontour`]
//! compute profile-likelihood intervals and contours.
//!
//! # Examples
//!
//! ```
//! use minopt_rs::{FnObjective, Minuit};
//! use ndarray::Array1;
//!
//! let f = FnObjective::new(|p: &Array1<f64>| {
//!     Ok(0.2 * (p[0] - 2.0).powi(2) + (p[1] - 5.0).powi(2) + 10.0)
//! });
//! let mut m = Minuit::new(f, &["x", "y"]).unwrap();
//! let fit = m.migrad().unwrap();
//! assert!(fit.is_valid());
//! assert!((m.values()["x"] - 2.0).abs() < 1e-3);
//!
//! let merrors = m.minos(Some("x"), 1.0).unwrap().unwrap();
//! assert!((merrors["x"].upper - 5.0_f64.sqrt()).abs() < 1e-2);
//! ```

use crate::config::{MinuitConfig, Strategy};
use crate::contour::mncontour;
use crate::error::{MinOptError, NumericalWarning, Result};
use crate::fitarg::FitArg;
use crate::hesse;
use crate::migrad::state::{HesseFailure, MinimumState};
use crate::migrad::{MinimizationStatus, Migrad};
use crate::minos::profiler::Profiler;
use crate::minos::{minos_parameter, MinosError, MinosErrors};
use crate::objective::{FcnAdapter, Objective};
use crate::parameters::Parameters;
use crate::scan::{self, ContourGrid, ProfileScan, ScanBound};
use crate::uncertainty::{external_covariance, Covariance, CovarianceStatus};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::fmt;

/// Overall outcome of a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    /// No MIGRAD run since construction or the last change of parameters
    NotRun,
    /// Minimum found with a usable covariance matrix
    Converged,
    /// MIGRAD stopped without meeting the EDM target
    NotConverged,
    /// Minimum found but the second-derivative matrix could not be computed
    HesseFailed,
}

/// Result of a MIGRAD run, updated by HESSE.
#[derive(Debug, Clone)]
pub struct FitState {
    /// Parameter values and errors at the minimum
    pub parameters: Parameters,
    pub fval: f64,
    pub edm: f64,
    pub nfcn: usize,
    pub iterations: usize,
    /// Covariance of the free parameters in external coordinates
    pub covariance: Option<Covariance>,
    pub status: FitStatus,
    /// Detailed termination reason of the minimizer
    pub minimization: MinimizationStatus,
}

impl FitState {
    /// Converged with a usable covariance matrix.
    pub fn is_valid(&self) -> bool {
        self.status == FitStatus::Converged
    }

    pub fn has_accurate_covariance(&self) -> bool {
        self.covariance.as_ref().map_or(false, |c| c.is_accurate())
    }
}

impl fmt::Display for FitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result:")?;
        writeln!(f, "  Status: {:?} ({})", self.status, self.minimization.description())?;
        writeln!(f, "  FCN: {:.8e}", self.fval)?;
        writeln!(f, "  EDM: {:.3e}", self.edm)?;
        writeln!(f, "  Function evaluations: {}", self.nfcn)?;
        for p in self.parameters.iter() {
            let tag = if p.is_fixed() { " (fixed)" } else { "" };
            writeln!(f, "  {} = {:.6e} +/- {:.3e}{}", p.name(), p.value(), p.error(), tag)?;
        }
        Ok(())
    }
}

/// Function minimizer with MINUIT-style error analysis.
pub struct Minuit<F: Objective> {
    fcn: F,
    params: Parameters,
    config: MinuitConfig,
    fit: Option<FitState>,
    state: Option<MinimumState>,
    merrors: MinosErrors,
    warnings: Vec<NumericalWarning>,
}

impl<F: Objective> Minuit<F> {
    /// Create a minimizer for `fcn` with the given parameter names.
    ///
    /// Every parameter starts at 0 with error 1, free and unbounded.
    pub fn new(fcn: F, names: &[&str]) -> Result<Self> {
        Self::with_fitarg(fcn, names, FitArg::new())
    }

    /// Create a minimizer from keyword arguments.
    ///
    /// # Arguments
    ///
    /// * `fcn` - The objective
    /// * `names` - Parameter names, in the order the objective expects them
    /// * `fitarg` - Keywords for initial values, errors, limits, fixed flags
    ///   and global settings
    ///
    /// # Returns
    ///
    /// * The minimizer, or a `ConfigError` for an unknown keyword, a value of
    ///   the wrong type, a duplicate name or a non-positive error
    ///
    /// # Examples
    ///
    /// ```
    /// use minopt_rs::{FitArg, FnObjective, Minuit};
    /// use ndarray::Array1;
    ///
    /// let f = FnObjective::new(|p: &Array1<f64>| Ok((p[0] - 1.0).powi(2)));
    /// let fitarg = FitArg::new().with_value("x", 3.0).with_error("x", 0.5);
    /// let m = Minuit::with_fitarg(f, &["x"], fitarg).unwrap();
    /// assert_eq!(m.values()["x"], 3.0);
    /// ```
    pub fn with_fitarg(fcn: F, names: &[&str], fitarg: FitArg) -> Result<Self> {
        if let Some(n) = fcn.parameter_count() {
            if n != names.len() {
                return Err(MinOptError::DimensionMismatch(format!(
                    "objective takes {} parameters, {} names given",
                    n,
                    names.len()
                )));
            }
        }
        let resolved = fitarg.resolve(names, MinuitConfig::default())?;
        Ok(Self {
            fcn,
            params: resolved.params,
            config: resolved.config,
            fit: None,
            state: None,
            merrors: MinosErrors::new(),
            warnings: resolved.warnings,
        })
    }

    /// Start a builder for keyword-style construction.
    pub fn builder(fcn: F, names: &[&str]) -> MinuitBuilder<F> {
        MinuitBuilder {
            fcn,
            names: names.iter().map(|n| n.to_string()).collect(),
            fitarg: FitArg::new(),
        }
    }

    /// Create a minimizer from starting values, naming the parameters `p0, p1, …`.
    pub fn from_parameter_list(fcn: F, values: &[f64]) -> Result<Self> {
        let names: Vec<String> = (0..values.len()).map(|i| format!("p{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let fitarg = refs
            .iter()
            .zip(values)
            .fold(FitArg::new(), |acc, (name, &v)| acc.with_value(name, v));
        Self::with_fitarg(fcn, &refs, fitarg)
    }

    /// Run MIGRAD from the current parameter values.
    ///
    /// A free parameter starting outside or on one of its limits is first
    /// moved one error inside, with a `ValueClamped` warning. Previous MINOS
    /// results are discarded. Returns the new fit state; a
    /// fit that did not converge is reported through its status, not as an
    /// error.
    ///
    /// # Errors
    ///
    /// * `BoundsViolation` if a parameter has inverted limits
    /// * `FunctionEvaluation` if the objective fails or is not finite at the start
    pub fn migrad(&mut self) -> Result<FitState> {
        self.params.validate_bounds().map_err(|e| {
            MinOptError::BoundsViolation(format!("cannot start MIGRAD: {}", e))
        })?;

        for i in 0..self.params.len() {
            if let Some(p) = self.params.param_mut(i) {
                let from = p.value();
                let mut to = p.set_value_clamped(from);
                if !p.is_fixed() {
                    to = p.move_off_limit();
                }
                if to != from {
                    let name = p.name().to_string();
                    self.warnings
                        .push(NumericalWarning::ValueClamped { name, from, to }.emit());
                }
            }
        }

        let state = {
            let adapter = FcnAdapter::new(&self.fcn, &self.params, self.config.errordef());
            Migrad::new(&self.config).minimize(&adapter)?
        };

        self.merrors.clear();
        self.record_state_warnings(&state);
        self.publish(state)?;

        let fit = self.fmin()?.clone();
        if self.config.print_level() >= 1 {
            log::info!("MIGRAD\n{}", fit);
        }
        Ok(fit)
    }

    /// Recompute the covariance matrix from the numerical Hessian at the minimum.
    ///
    /// When the Hessian cannot be computed the previous matrix is kept with
    /// status [`CovarianceStatus::HesseFailed`] and a warning is recorded.
    ///
    /// # Errors
    ///
    /// * `PreconditionError` if MIGRAD has not been run
    pub fn hesse(&mut self) -> Result<Covariance> {
        let state = self.state.clone().ok_or_else(|| {
            MinOptError::PreconditionError("HESSE requires a prior MIGRAD run".to_string())
        })?;

        let refined = {
            let adapter = FcnAdapter::new(&self.fcn, &self.params, self.config.errordef());
            let mut refined = hesse::refine(&adapter, &state, &self.config)?;
            refined.nfcn = state.nfcn + adapter.nfcn();
            refined
        };

        self.record_state_warnings(&refined);
        self.publish(refined)?;

        if self.config.print_level() >= 1 {
            if let Some(fit) = &self.fit {
                log::info!("HESSE\n{}", fit);
            }
        }
        self.covariance().cloned().ok_or_else(|| {
            MinOptError::InvalidState("HESSE produced no covariance matrix".to_string())
        })
    }

    /// Run MINOS for one parameter, or for every free parameter when `name` is `None`.
    ///
    /// # Arguments
    ///
    /// * `name` - Parameter to analyse, or `None` for all free parameters
    /// * `sigma` - Interval width in units of the standard deviation
    ///
    /// # Returns
    ///
    /// * `Ok(None)` with a recorded warning when the parameter is fixed
    /// * Otherwise the MINOS errors computed by this call, which are also
    ///   merged into [`Minuit::merrors`]
    ///
    /// # Errors
    ///
    /// * `PreconditionError` without a converged MIGRAD run or for an unknown name
    pub fn minos(&mut self, name: Option<&str>, sigma: f64) -> Result<Option<MinosErrors>> {
        let fmin = self.require_minimum("MINOS")?;
        check_sigma(sigma)?;

        let targets = match name {
            Some(name) => {
                let index = self.require_param(name)?;
                if self.params.param(index).map_or(false, |p| p.is_fixed()) {
                    self.warnings.push(
                        NumericalWarning::FixedParameter {
                            name: name.to_string(),
                        }
                        .emit(),
                    );
                    return Ok(None);
                }
                vec![index]
            }
            None => self.params.free_indices(),
        };
        if targets.is_empty() {
            return Ok(None);
        }

        let mut result = MinosErrors::new();
        let calls = {
            let profiler = self.profiler();
            for index in targets {
                let run = minos_parameter(&profiler, index, fmin, sigma)?;
                result.insert(run.error.name.clone(), run.error);
            }
            profiler.nfcn()
        };

        for error in result.values() {
            for w in error.warnings() {
                self.warnings.push(w.emit());
            }
            if self.config.print_level() >= 1 {
                log::info!(
                    "MINOS {}: {:+.6e} {:+.6e} (valid: {})",
                    error.name,
                    error.lower,
                    error.upper,
                    error.is_valid()
                );
            }
        }
        self.add_calls(calls);
        self.merrors
            .extend(result.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(Some(result))
    }

    /// Profiled contour of two parameters.
    ///
    /// Runs MINOS on both parameters at `sigma` and traces a polygon of
    /// exactly `numpoints` vertices, counter-clockwise from the upper MINOS
    /// crossing of `x`.
    ///
    /// # Errors
    ///
    /// * `PreconditionError` without a converged MIGRAD run, for unknown,
    ///   fixed or identical parameters
    /// * `InvalidInput` if `numpoints < 4`
    pub fn mncontour(
        &mut self,
        x: &str,
        y: &str,
        numpoints: usize,
        sigma: f64,
    ) -> Result<(MinosError, MinosError, Vec<(f64, f64)>)> {
        let fmin = self.require_minimum("MNCONTOUR")?;
        check_sigma(sigma)?;
        let (ix, iy) = (self.require_free(x)?, self.require_free(y)?);
        if ix == iy {
            return Err(MinOptError::PreconditionError(format!(
                "contour needs two different parameters, got '{}' twice",
                x
            )));
        }
        if numpoints < 4 {
            return Err(MinOptError::InvalidInput(format!(
                "a contour needs at least 4 points, got {}",
                numpoints
            )));
        }

        let (mx, my, trace, calls) = {
            let profiler = self.profiler();
            let mx = minos_parameter(&profiler, ix, fmin, sigma)?;
            let my = minos_parameter(&profiler, iy, fmin, sigma)?;
            let trace = mncontour(&profiler, ix, iy, fmin, sigma, numpoints, &mx, &my)?;
            (mx.error, my.error, trace, profiler.nfcn())
        };

        for w in mx.warnings().into_iter().chain(my.warnings()) {
            self.warnings.push(w.emit());
        }
        for w in trace.warnings {
            self.warnings.push(w.emit());
        }
        self.add_calls(calls);
        self.merrors.insert(mx.name.clone(), mx.clone());
        self.merrors.insert(my.name.clone(), my.clone());
        Ok((mx, my, trace.points))
    }

    /// Objective on a `bins × bins` grid of two parameters, others held fixed.
    ///
    /// With `subtract_min` the minimum (the fitted one if available) is
    /// subtracted from every value.
    pub fn contour(
        &self,
        x: &str,
        y: &str,
        bins: usize,
        bound: ScanBound,
        subtract_min: bool,
    ) -> Result<ContourGrid> {
        let (ix, iy) = (self.require_param(x)?, self.require_param(y)?);
        let mut grid = scan::contour(&self.fcn, &self.params, ix, iy, bins, bound)?;
        if subtract_min {
            grid.subtract_min(self.fval());
        }
        Ok(grid)
    }

    /// Objective along one parameter, others held fixed.
    pub fn profile(
        &self,
        name: &str,
        bins: usize,
        bound: ScanBound,
        subtract_min: bool,
    ) -> Result<ProfileScan> {
        let index = self.require_param(name)?;
        let mut scan = scan::profile(&self.fcn, &self.params, index, bins, bound)?;
        if subtract_min {
            scan.subtract_min(self.fval());
        }
        Ok(scan)
    }

    /// Profile along one parameter, re-minimizing the other free parameters at each point.
    pub fn mnprofile(
        &self,
        name: &str,
        bins: usize,
        bound: ScanBound,
        subtract_min: bool,
    ) -> Result<ProfileScan> {
        let index = self.require_param(name)?;
        let mut scan = scan::mnprofile(&self.profiler(), index, bins, bound)?;
        if subtract_min {
            scan.subtract_min(self.fval());
        }
        Ok(scan)
    }

    /// Current parameter values by name.
    pub fn values(&self) -> HashMap<String, f64> {
        self.params
            .iter()
            .map(|p| (p.name().to_string(), p.value()))
            .collect()
    }

    /// Current parameter errors by name.
    pub fn errors(&self) -> HashMap<String, f64> {
        self.params
            .iter()
            .map(|p| (p.name().to_string(), p.error()))
            .collect()
    }

    /// Current parameter values in declaration order.
    pub fn args(&self) -> Array1<f64> {
        self.params.values()
    }

    /// Function value at the minimum, if MIGRAD has run.
    pub fn fval(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.fval)
    }

    pub fn edm(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.edm)
    }

    /// Function calls spent by the current fit, including HESSE and MINOS.
    pub fn nfcn(&self) -> usize {
        self.fit.as_ref().map_or(0, |f| f.nfcn)
    }

    /// The last fit state.
    ///
    /// # Errors
    ///
    /// * `PreconditionError` if MIGRAD has not been run
    pub fn fmin(&self) -> Result<&FitState> {
        self.fit.as_ref().ok_or_else(|| {
            MinOptError::PreconditionError("no function minimum, run MIGRAD first".to_string())
        })
    }

    pub fn status(&self) -> FitStatus {
        self.fit.as_ref().map_or(FitStatus::NotRun, |f| f.status)
    }

    pub fn covariance(&self) -> Option<&Covariance> {
        self.fit.as_ref().and_then(|f| f.covariance.as_ref())
    }

    /// Covariance matrix of the free parameters, or their correlation matrix.
    ///
    /// # Errors
    ///
    /// * `PreconditionError` if MIGRAD has not been run
    /// * `InvalidState` if the matrix is not usable (HESSE failed)
    pub fn matrix(&self, correlation: bool) -> Result<Array2<f64>> {
        let fit = self.fmin()?;
        let cov = fit.covariance.as_ref().ok_or_else(|| {
            MinOptError::InvalidState("no covariance matrix available".to_string())
        })?;
        if !cov.status().is_usable() {
            return Err(MinOptError::InvalidState(format!(
                "covariance matrix is not usable (status {:?})",
                cov.status()
            )));
        }
        Ok(if correlation {
            cov.correlation()
        } else {
            cov.matrix().clone()
        })
    }

    /// MINOS errors computed since the last MIGRAD run.
    pub fn merrors(&self) -> &MinosErrors {
        &self.merrors
    }

    /// Snapshot of every parameter as keyword arguments.
    ///
    /// Passing the snapshot to [`Minuit::with_fitarg`] reproduces the
    /// current parameter state.
    pub fn fitarg(&self) -> FitArg {
        FitArg::from_parameters(&self.params)
    }

    pub fn list_of_vary_param(&self) -> Vec<String> {
        self.params.free_names()
    }

    pub fn list_of_fixed_param(&self) -> Vec<String> {
        self.params.fixed_names()
    }

    /// Whether the last MIGRAD run converged with a usable covariance matrix.
    pub fn migrad_ok(&self) -> bool {
        self.fit.as_ref().map_or(false, |f| f.is_valid())
    }

    /// Whether the covariance matrix comes from a successful HESSE or a converged metric.
    pub fn matrix_accurate(&self) -> bool {
        self.fit
            .as_ref()
            .map_or(false, |f| f.has_accurate_covariance())
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn config(&self) -> &MinuitConfig {
        &self.config
    }

    pub fn objective(&self) -> &F {
        &self.fcn
    }

    /// Numerical warnings recorded so far.
    pub fn warnings(&self) -> &[NumericalWarning] {
        &self.warnings
    }

    /// Remove and return the recorded warnings.
    pub fn take_warnings(&mut self) -> Vec<NumericalWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.config = self.config.clone().with_strategy(strategy);
    }

    pub fn set_tol(&mut self, tol: f64) -> Result<()> {
        self.config = self.config.clone().with_tol(tol)?;
        Ok(())
    }

    /// Change the errordef; errors and covariance of the last fit are rescaled.
    pub fn set_errordef(&mut self, errordef: f64) -> Result<()> {
        self.config = self.config.clone().with_errordef(errordef)?;
        self.merrors.clear();
        if let Some(state) = self.state.clone() {
            self.publish(state)?;
        }
        Ok(())
    }

    pub fn set_print_level(&mut self, print_level: u32) {
        self.config = self.config.clone().with_print_level(print_level);
    }

    /// Replace the whole configuration. The last fit is discarded.
    pub fn set_config(&mut self, config: MinuitConfig) {
        self.config = config;
        self.invalidate();
    }

    /// Fix a parameter. The last fit is discarded.
    pub fn fix(&mut self, name: &str) -> Result<()> {
        self.params.fix(name)?;
        self.invalidate();
        Ok(())
    }

    /// Release a fixed parameter. The last fit is discarded.
    pub fn release(&mut self, name: &str) -> Result<()> {
        self.params.release(name)?;
        self.invalidate();
        Ok(())
    }

    /// Set the value of a parameter. The last fit is discarded.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        let index = self.require_param(name)?;
        if let Some(p) = self.params.param_mut(index) {
            p.set_value(value)?;
        }
        self.invalidate();
        Ok(())
    }

    /// Set the error (initial step) of a parameter. The last fit is discarded.
    pub fn set_error(&mut self, name: &str, error: f64) -> Result<()> {
        let index = self.require_param(name)?;
        if let Some(p) = self.params.param_mut(index) {
            p.set_error(error)?;
        }
        self.invalidate();
        Ok(())
    }

    /// Return every parameter to its initial value and discard the last fit.
    pub fn reset(&mut self) {
        self.params.reset();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.fit = None;
        self.state = None;
        self.merrors.clear();
    }

    fn profiler(&self) -> Profiler<'_, F> {
        let covariance = self.covariance().filter(|c| c.status().is_usable());
        Profiler::new(&self.fcn, &self.params, &self.config, covariance)
    }

    fn add_calls(&mut self, calls: usize) {
        if let Some(fit) = self.fit.as_mut() {
            fit.nfcn += calls;
        }
        if let Some(state) = self.state.as_mut() {
            state.nfcn += calls;
        }
    }

    fn require_param(&self, name: &str) -> Result<usize> {
        self.params.index_of(name).ok_or_else(|| {
            MinOptError::PreconditionError(format!("unknown parameter '{}'", name))
        })
    }

    fn require_free(&self, name: &str) -> Result<usize> {
        let index = self.require_param(name)?;
        if self.params.param(index).map_or(false, |p| p.is_fixed()) {
            return Err(MinOptError::PreconditionError(format!(
                "parameter '{}' is fixed",
                name
            )));
        }
        Ok(index)
    }

    /// Function value of a converged minimum.
    fn require_minimum(&self, operation: &str) -> Result<f64> {
        let fit = self.fit.as_ref().ok_or_else(|| {
            MinOptError::PreconditionError(format!("{} requires a prior MIGRAD run", operation))
        })?;
        if !fit.minimization.is_converged() {
            return Err(MinOptError::PreconditionError(format!(
                "{} requires a converged minimum ({})",
                operation,
                fit.minimization.description()
            )));
        }
        Ok(fit.fval)
    }

    fn record_state_warnings(&mut self, state: &MinimumState) {
        let free = self.params.free_names();
        match state.hesse_failure {
            Some(HesseFailure::ZeroCurvature(k)) => {
                let name = free.get(k).cloned().unwrap_or_default();
                self.warnings.push(
                    NumericalWarning::HesseFailed {
                        name,
                        reason: "second derivative is zero".to_string(),
                    }
                    .emit(),
                );
            }
            Some(HesseFailure::InversionFailed) => {
                self.warnings.push(
                    NumericalWarning::HesseFailed {
                        name: free.join(", "),
                        reason: "matrix inversion failed".to_string(),
                    }
                    .emit(),
                );
            }
            None if state.covariance_status == CovarianceStatus::MadePosDef => {
                self.warnings.push(NumericalWarning::MadePosDef.emit());
            }
            None => {}
        }
    }

    /// Store a minimum: parameter values and errors, covariance and fit state.
    fn publish(&mut self, state: MinimumState) -> Result<()> {
        let up = self.config.errordef();
        let dext_dint = FcnAdapter::new(&self.fcn, &self.params, up).dext_dint(&state.x);

        let internal_errors: Array1<f64> = (0..state.x.len())
            .map(|k| (2.0 * up * state.inv_hessian[[k, k]]).max(0.0).sqrt())
            .collect();
        self.params
            .update_from_internal(&state.x, Some(&internal_errors))?;

        let covariance = Covariance::new(
            self.params.free_names(),
            external_covariance(&state.inv_hessian, &dext_dint, up),
            state.covariance_status,
        );

        let status = if !state.status.is_converged() {
            FitStatus::NotConverged
        } else if state.covariance_status == CovarianceStatus::HesseFailed {
            FitStatus::HesseFailed
        } else {
            FitStatus::Converged
        };

        self.fit = Some(FitState {
            parameters: self.params.clone(),
            fval: state.fval,
            edm: state.edm,
            nfcn: state.nfcn,
            iterations: state.iterations,
            covariance: Some(covariance),
            status,
            minimization: state.status,
        });
        self.state = Some(state);
        Ok(())
    }
}

#[cfg(feature = "parallel")]
impl<F: Objective + Sync> Minuit<F> {
    /// [`Minuit::contour`] with the grid evaluated in parallel.
    pub fn contour_parallel(
        &self,
        x: &str,
        y: &str,
        bins: usize,
        bound: ScanBound,
        subtract_min: bool,
    ) -> Result<ContourGrid> {
        let (ix, iy) = (self.require_param(x)?, self.require_param(y)?);
        let mut grid = scan::contour_parallel(&self.fcn, &self.params, ix, iy, bins, bound)?;
        if subtract_min {
            grid.subtract_min(self.fval());
        }
        Ok(grid)
    }

    /// [`Minuit::profile`] with the grid evaluated in parallel.
    pub fn profile_parallel(
        &self,
        name: &str,
        bins: usize,
        bound: ScanBound,
        subtract_min: bool,
    ) -> Result<ProfileScan> {
        let index = self.require_param(name)?;
        let mut scan = scan::profile_parallel(&self.fcn, &self.params, index, bins, bound)?;
        if subtract_min {
            scan.subtract_min(self.fval());
        }
        Ok(scan)
    }
}

fn check_sigma(sigma: f64) -> Result<()> {
    if sigma > 0.0 && sigma.is_finite() {
        Ok(())
    } else {
        Err(MinOptError::InvalidInput(format!(
            "sigma must be positive, got {}",
            sigma
        )))
    }
}

/// Keyword-style construction of a [`Minuit`].
///
/// Names are checked when [`MinuitBuilder::build`] is called.
///
/// # Examples
///
/// ```
/// use minopt_rs::{FnObjective, Minuit, Strategy};
/// use ndarray::Array1;
///
/// let f = FnObjective::new(|p: &Array1<f64>| Ok((p[0] - 2.0).powi(2) + (p[1] - 5.0).powi(2)));
/// let m = Minuit::builder(f, &["x", "y"])
///     .value("x", 1.0)
///     .limit("y", Some(0.0), None)
///     .strategy(Strategy::High)
///     .build()
///     .unwrap();
/// assert_eq!(m.values()["x"], 1.0);
/// ```
pub struct MinuitBuilder<F: Objective> {
    fcn: F,
    names: Vec<String>,
    fitarg: FitArg,
}

impl<F: Objective> MinuitBuilder<F> {
    pub fn value(mut self, name: &str, value: f64) -> Self {
        self.fitarg = self.fitarg.with_value(name, value);
        self
    }

    pub fn error(mut self, name: &str, error: f64) -> Self {
        self.fitarg = self.fitarg.with_error(name, error);
        self
    }

    pub fn limit(mut self, name: &str, low: Option<f64>, high: Option<f64>) -> Self {
        self.fitarg = self.fitarg.with_limit(name, low, high);
        self
    }

    pub fn fix(mut self, name: &str) -> Self {
        self.fitarg = self.fitarg.with_fix(name, true);
        self
    }

    pub fn errordef(mut self, errordef: f64) -> Self {
        self.fitarg = self.fitarg.with_errordef(errordef);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.fitarg = self.fitarg.with_strategy(strategy);
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.fitarg = self.fitarg.with_tol(tol);
        self
    }

    pub fn print_level(mut self, print_level: u32) -> Self {
        self.fitarg = self.fitarg.with_print_level(print_level);
        self
    }

    pub fn pedantic(mut self, pedantic: bool) -> Self {
        self.fitarg = self.fitarg.with_pedantic(pedantic);
        self
    }

    pub fn max_calls(mut self, max_calls: usize) -> Self {
        self.fitarg = self.fitarg.with_max_calls(max_calls);
        self
    }

    /// Merge keyword arguments, overriding earlier settings of the same keys.
    pub fn fitarg(mut self, fitarg: FitArg) -> Self {
        for (key, value) in fitarg.iter() {
            self.fitarg.insert(key, *value);
        }
        self
    }

    pub fn build(self) -> Result<Minuit<F>> {
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        Minuit::with_fitarg(self.fcn, &names, self.fitarg)
    }
}

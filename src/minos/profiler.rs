//! Re-minimization with some parameters held at trial values.

use crate::config::MinuitConfig;
use crate::error::{MinOptError, Result};
use crate::migrad::Migrad;
use crate::objective::{FcnAdapter, Objective};
use crate::parameters::Parameters;
use crate::uncertainty::Covariance;
use crate::utils::linalg::solve;
use ndarray::{Array1, Array2};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Minimum of the objective over the parameters that were left free.
#[derive(Debug, Clone)]
pub(crate) struct ProfilePoint {
    pub fval: f64,
    /// Full external parameter vector at the conditional minimum
    pub values: Array1<f64>,
    /// Whether the conditional minimization converged
    pub valid: bool,
}

/// Computes profile points around a fitted minimum.
///
/// Every call works on a private copy of the parameter store, so the
/// caller's free/fixed configuration is never touched.
pub(crate) struct Profiler<'a, F: Objective + ?Sized> {
    fcn: &'a F,
    params: &'a Parameters,
    config: &'a MinuitConfig,
    covariance: Option<&'a Covariance>,
    calls: AtomicUsize,
}

impl<'a, F: Objective + ?Sized> Profiler<'a, F> {
    pub fn new(
        fcn: &'a F,
        params: &'a Parameters,
        config: &'a MinuitConfig,
        covariance: Option<&'a Covariance>,
    ) -> Self {
        Self {
            fcn,
            params,
            config,
            covariance,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn params(&self) -> &Parameters {
        self.params
    }

    pub fn config(&self) -> &MinuitConfig {
        self.config
    }

    /// Function calls spent in all profile points so far.
    pub fn nfcn(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Variance of a parameter from the covariance, falling back to its error.
    pub fn variance(&self, index: usize) -> f64 {
        let name = self.params.param(index).map(|p| p.name());
        let from_cov = name.and_then(|n| self.covariance.and_then(|c| c.get(n, n)));
        match from_cov {
            Some(v) if v > 0.0 => v,
            _ => self
                .params
                .param(index)
                .map_or(1.0, |p| p.error() * p.error()),
        }
    }

    /// Covariance between two parameters, zero when unknown.
    pub fn covariance_of(&self, a: usize, b: usize) -> f64 {
        let (Some(pa), Some(pb)) = (self.params.param(a), self.params.param(b)) else {
            return 0.0;
        };
        self.covariance
            .and_then(|c| c.get(pa.name(), pb.name()))
            .unwrap_or(0.0)
    }

    /// Minimize over all other free parameters with `fixed` held at the given values.
    ///
    /// The other parameters start from the linear prediction of the
    /// covariance matrix for the requested displacement.
    pub fn profile_at(&self, fixed: &[(usize, f64)]) -> Result<ProfilePoint> {
        let mut store = self.params.clone();

        for (j, shift) in self.predicted_shifts(fixed) {
            if let Some(p) = store.param_mut(j) {
                let start = p.value() + shift;
                p.set_value_clamped(start);
            }
        }
        for &(i, value) in fixed {
            let p = store.param_mut(i).ok_or_else(|| {
                MinOptError::ParameterNotFound(format!("parameter index {}", i))
            })?;
            p.set_value_clamped(value);
            p.set_fixed(true);
        }

        let adapter = FcnAdapter::new(self.fcn, &store, self.config.errordef());
        let result = Migrad::new(self.config)
            .with_final_hesse(false)
            .minimize(&adapter);
        self.calls.fetch_add(adapter.nfcn(), Ordering::Relaxed);
        let state = result?;

        Ok(ProfilePoint {
            fval: state.fval,
            values: adapter.external(&state.x)?,
            valid: state.status.is_converged(),
        })
    }

    /// `C_jF · C_FF⁻¹ · Δ_F` for every free parameter `j` outside `fixed`.
    fn predicted_shifts(&self, fixed: &[(usize, f64)]) -> Vec<(usize, f64)> {
        if self.covariance.is_none() || fixed.is_empty() {
            return Vec::new();
        }
        let k = fixed.len();
        let mut cff = Array2::<f64>::zeros((k, k));
        let mut delta = Array1::<f64>::zeros(k);
        for (a, &(ia, va)) in fixed.iter().enumerate() {
            delta[a] = va - self.params.param(ia).map_or(va, |p| p.value());
            for (b, &(ib, _)) in fixed.iter().enumerate() {
                cff[[a, b]] = self.covariance_of(ia, ib);
            }
        }
        let weights = match solve(&cff, &delta) {
            Ok(w) => w,
            Err(_) => return Vec::new(),
        };

        self.params
            .free_indices()
            .into_iter()
            .filter(|j| !fixed.iter().any(|&(i, _)| i == *j))
            .map(|j| {
                let shift = fixed
                    .iter()
                    .enumerate()
                    .map(|(a, &(i, _))| self.covariance_of(j, i) * weights[a])
                    .sum();
                (j, shift)
            })
            .collect()
    }
}

//! The MIGRAD variable-metric minimizer.

use crate::config::{MinuitConfig, Strategy};
use crate::error::Result;
use crate::hesse;
use crate::migrad::convergence::MinimizationStatus;
use crate::migrad::line_search::line_search;
use crate::migrad::seed::{gradient_at, seed};
use crate::migrad::state::MinimumState;
use crate::migrad::update::davidon_update;
use crate::objective::{FcnAdapter, Objective};
use crate::uncertainty::CovarianceStatus;
use crate::utils::linalg::make_pos_def;
use crate::utils::Precision;
use ndarray::{Array1, Array2};

/// Maximum number of restarts after HESSE finds the EDM above target.
const MAX_RESTARTS: usize = 2;

/// `dcovar` above which the medium strategy verifies the metric with HESSE.
const HESSE_DCOVAR_THRESHOLD: f64 = 0.05;

/// Variable-metric minimizer with a final HESSE check.
///
/// Operates on the free parameters in internal coordinates through an
/// [`FcnAdapter`]. The stopping target is `edm < 0.002·tol·errordef`.
pub(crate) struct Migrad<'c> {
    config: &'c MinuitConfig,
    final_hesse: bool,
}

impl<'c> Migrad<'c> {
    pub fn new(config: &'c MinuitConfig) -> Self {
        Self {
            config,
            final_hesse: true,
        }
    }

    /// Enable or disable the HESSE verification after convergence.
    pub fn with_final_hesse(mut self, final_hesse: bool) -> Self {
        self.final_hesse = final_hesse;
        self
    }

    /// Minimize starting from the parameter store of the adapter.
    pub fn minimize<F: Objective + ?Sized>(&self, fcn: &FcnAdapter<F>) -> Result<MinimumState> {
        let (x0, dirin) = fcn.start()?;
        self.minimize_from(fcn, x0, &dirin)
    }

    /// Minimize from an explicit internal starting point and step sizes.
    pub fn minimize_from<F: Objective + ?Sized>(
        &self,
        fcn: &FcnAdapter<F>,
        x0: Array1<f64>,
        dirin: &Array1<f64>,
    ) -> Result<MinimumState> {
        let n = x0.len();
        if n == 0 {
            let fval = fcn.eval(&x0)?;
            return Ok(MinimumState {
                x: x0,
                fval,
                gradient: crate::utils::GradientState {
                    grad: Array1::zeros(0),
                    g2: Array1::zeros(0),
                    gstep: Array1::zeros(0),
                },
                inv_hessian: Array2::zeros((0, 0)),
                edm: 0.0,
                dcovar: 0.0,
                covariance_status: CovarianceStatus::Accurate,
                hesse_failure: None,
                status: MinimizationStatus::Converged,
                nfcn: fcn.nfcn(),
                iterations: 0,
            });
        }

        let edmval = self.config.edm_max();
        let call_limit = self.config.call_limit(n);
        let strategy = self.config.strategy();

        let mut state = seed(fcn, self.config, x0, dirin)?;
        let mut restarts = 0;

        loop {
            self.iterate(fcn, &mut state, edmval, call_limit)?;
            if !state.status.is_converged() || !self.final_hesse {
                break;
            }

            let run_hesse = match strategy {
                Strategy::Low => false,
                Strategy::Medium => state.dcovar > HESSE_DCOVAR_THRESHOLD,
                Strategy::High => true,
            };
            if !run_hesse {
                break;
            }

            state = hesse::refine(fcn, &state, self.config)?;
            if state.hesse_failure.is_some() {
                break;
            }
            if state.edm > edmval {
                if restarts < MAX_RESTARTS {
                    restarts += 1;
                    log::debug!(
                        "MIGRAD restart {} after HESSE: edm = {:.3e} above {:.3e}",
                        restarts,
                        state.edm,
                        edmval
                    );
                    state.status = MinimizationStatus::Running;
                    continue;
                }
                if state.edm > 10.0 * edmval {
                    state.status = MinimizationStatus::AboveMaxEdm;
                }
            }
            break;
        }

        state.settle_covariance_status();
        state.nfcn = fcn.nfcn();

        if self.config.print_level() >= 2 {
            log::debug!(
                "MIGRAD finished: {} after {} iterations and {} calls",
                state.status.description(),
                state.iterations,
                state.nfcn
            );
        }
        Ok(state)
    }

    /// Variable-metric iterations until convergence or failure.
    fn iterate<F: Objective + ?Sized>(
        &self,
        fcn: &FcnAdapter<F>,
        state: &mut MinimumState,
        edmval: f64,
        call_limit: usize,
    ) -> Result<()> {
        let prec = Precision::default();

        loop {
            if state.edm < edmval {
                state.status = MinimizationStatus::Converged;
                return Ok(());
            }
            if fcn.nfcn() >= call_limit {
                state.status = MinimizationStatus::CallLimitReached;
                return Ok(());
            }

            let mut step = -state.inv_hessian.dot(&state.gradient.grad);
            let mut gdel = step.dot(&state.gradient.grad);
            if gdel > 0.0 {
                let (v, _) = make_pos_def(&state.inv_hessian);
                state.inv_hessian = v;
                state.covariance_status = CovarianceStatus::MadePosDef;
                step = -state.inv_hessian.dot(&state.gradient.grad);
                gdel = step.dot(&state.gradient.grad);
                if gdel > 0.0 {
                    state.status = MinimizationStatus::NotPosDef;
                    return Ok(());
                }
            }

            let search = line_search(|p| fcn.eval(p), &state.x, &step, state.fval, gdel)?;
            if !search.improved {
                state.status = if state.edm < prec.eps2 * state.fval.abs() {
                    MinimizationStatus::MachineAccuracy
                } else {
                    MinimizationStatus::LineSearchFailed
                };
                return Ok(());
            }

            let x1 = &state.x + &(&step * search.lambda);
            let gradient = gradient_at(fcn, &x1, search.fval, &state.gradient, self.config)?;
            let dx = &x1 - &state.x;
            let dg = &gradient.grad - &state.gradient.grad;
            let (inv_hessian, dcovar) = davidon_update(&state.inv_hessian, &dx, &dg, state.dcovar);

            state.x = x1;
            state.fval = search.fval;
            state.gradient = gradient;
            state.inv_hessian = inv_hessian;
            state.dcovar = dcovar;
            state.iterations += 1;

            if self.config.strategy() == Strategy::High {
                let refined = hesse::refine(fcn, state, self.config)?;
                if refined.hesse_failure.is_none() {
                    *state = refined;
                }
            }

            state.refresh_edm();
            if state.edm < 0.0 {
                let (v, _) = make_pos_def(&state.inv_hessian);
                state.inv_hessian = v;
                state.covariance_status = CovarianceStatus::MadePosDef;
                state.refresh_edm();
            }

            if self.config.print_level() >= 2 {
                log::debug!(
                    "MIGRAD iteration {}: fval = {:.8e}, edm = {:.3e}, calls = {}",
                    state.iterations,
                    state.fval,
                    state.edm,
                    fcn.nfcn()
                );
            }
        }
    }
}

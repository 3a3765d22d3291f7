//! Configuration options for the minimizer.
//!
//! [`MinuitConfig`] is immutable: every `with_*` method returns a modified
//! copy, so a fit that is running always sees one consistent set of options.
//! [`Strategy`] selects the trade-off between function calls and numerical
//! reliability, and carries the table of derivative settings used by the
//! gradient and Hessian calculators.

use crate::error::{MinOptError, Result};
use serde::{Deserialize, Serialize};

/// Scale between the user tolerance and the EDM target.
pub const EDM_SCALE: f64 = 0.002;

/// Speed/reliability trade-off of MIGRAD and HESSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Strategy {
    /// Fewest function calls. No automatic HESSE after MIGRAD.
    Low,

    /// Default. HESSE after MIGRAD when the variable-metric matrix is unreliable.
    #[default]
    Medium,

    /// Full Hessian at the seed and at every iteration, HESSE after MIGRAD.
    High,
}

/// Numerical settings attached to a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategySettings {
    pub gradient_ncycles: usize,
    pub gradient_step_tolerance: f64,
    pub gradient_tolerance: f64,
    pub hessian_ncycles: usize,
    pub hessian_step_tolerance: f64,
    pub hessian_g2_tolerance: f64,
}

impl Strategy {
    /// Numeric level of the strategy (0, 1 or 2).
    pub fn level(&self) -> u32 {
        match self {
            Strategy::Low => 0,
            Strategy::Medium => 1,
            Strategy::High => 2,
        }
    }

    /// Derivative settings for this strategy.
    pub fn settings(&self) -> StrategySettings {
        match self {
            Strategy::Low => StrategySettings {
                gradient_ncycles: 2,
                gradient_step_tolerance: 0.5,
                gradient_tolerance: 0.1,
                hessian_ncycles: 3,
                hessian_step_tolerance: 0.5,
                hessian_g2_tolerance: 0.1,
            },
            Strategy::Medium => StrategySettings {
                gradient_ncycles: 3,
                gradient_step_tolerance: 0.3,
                gradient_tolerance: 0.05,
                hessian_ncycles: 5,
                hessian_step_tolerance: 0.3,
                hessian_g2_tolerance: 0.05,
            },
            Strategy::High => StrategySettings {
                gradient_ncycles: 5,
                gradient_step_tolerance: 0.1,
                gradient_tolerance: 0.02,
                hessian_ncycles: 7,
                hessian_step_tolerance: 0.1,
                hessian_g2_tolerance: 0.02,
            },
        }
    }
}

impl TryFrom<u32> for Strategy {
    type Error = MinOptError;

    fn try_from(level: u32) -> Result<Self> {
        match level {
            0 => Ok(Strategy::Low),
            1 => Ok(Strategy::Medium),
            2 => Ok(Strategy::High),
            other => Err(MinOptError::ConfigError(format!(
                "strategy must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Global options of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuitConfig {
    errordef: f64,
    strategy: Strategy,
    tol: f64,
    print_level: u32,
    pedantic: bool,
    max_calls: Option<usize>,
}

impl Default for MinuitConfig {
    fn default() -> Self {
        Self {
            errordef: 1.0,
            strategy: Strategy::default(),
            tol: 0.1,
            print_level: 0,
            pedantic: false,
            max_calls: None,
        }
    }
}

impl MinuitConfig {
    /// Create a configuration with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Function increase that defines a one-sigma uncertainty.
    ///
    /// 1 for least-squares objectives, 0.5 for negative log-likelihoods.
    pub fn errordef(&self) -> f64 {
        self.errordef
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Convergence tolerance; MIGRAD stops when EDM < 0.002 · tol · errordef.
    pub fn tol(&self) -> f64 {
        self.tol
    }

    pub fn print_level(&self) -> u32 {
        self.print_level
    }

    /// Whether missing initial values or errors are reported as warnings.
    pub fn pedantic(&self) -> bool {
        self.pedantic
    }

    /// Explicit call budget for MIGRAD, if one was set.
    pub fn max_calls(&self) -> Option<usize> {
        self.max_calls
    }

    /// Set the errordef.
    pub fn with_errordef(mut self, errordef: f64) -> Result<Self> {
        if !(errordef.is_finite() && errordef > 0.0) {
            return Err(MinOptError::ConfigError(format!(
                "errordef must be positive, got {}",
                errordef
            )));
        }
        self.errordef = errordef;
        Ok(self)
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Result<Self> {
        if !(tol.is_finite() && tol > 0.0) {
            return Err(MinOptError::ConfigError(format!(
                "tol must be positive, got {}",
                tol
            )));
        }
        self.tol = tol;
        Ok(self)
    }

    /// Set the verbosity of fit logging.
    pub fn with_print_level(mut self, print_level: u32) -> Self {
        self.print_level = print_level;
        self
    }

    /// Enable or disable pedantic warnings.
    pub fn with_pedantic(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    /// Set an explicit MIGRAD call budget.
    pub fn with_max_calls(mut self, max_calls: Option<usize>) -> Self {
        self.max_calls = max_calls;
        self
    }

    /// EDM value below which MIGRAD is converged.
    pub fn edm_max(&self) -> f64 {
        EDM_SCALE * self.tol * self.errordef
    }

    /// Call budget for a minimization over `n` free parameters.
    pub fn call_limit(&self, n: usize) -> usize {
        self.max_calls.unwrap_or(200 + 100 * n + 5 * n * n)
    }
}

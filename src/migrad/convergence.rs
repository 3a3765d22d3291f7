//! Convergence criteria for MIGRAD.
//!
//! MIGRAD stops on the estimated distance to minimum, `edm = ½ gᵀVg`, the
//! decrease of the function a Newton step would still achieve.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Possible states of a MIGRAD run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinimizationStatus {
    /// The algorithm is still running.
    Running,

    /// EDM fell below the target.
    Converged,

    /// No further decrease is possible at machine precision and EDM is negligible.
    MachineAccuracy,

    /// The call budget ran out before convergence.
    CallLimitReached,

    /// The line search found no lower function value.
    LineSearchFailed,

    /// The search direction points uphill even after forcing the metric positive definite.
    NotPosDef,

    /// Convergence was reported but the refined EDM is far above the target.
    AboveMaxEdm,
}

impl MinimizationStatus {
    /// Returns true if the minimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, MinimizationStatus::Running)
    }

    /// Returns true if the minimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            MinimizationStatus::Converged | MinimizationStatus::MachineAccuracy
        )
    }

    /// Returns a description of the status.
    pub fn description(&self) -> String {
        match self {
            MinimizationStatus::Running => "Minimization is still running".to_string(),
            MinimizationStatus::Converged => "Converged: EDM below target".to_string(),
            MinimizationStatus::MachineAccuracy => {
                "Converged: machine accuracy limits further improvement".to_string()
            }
            MinimizationStatus::CallLimitReached => {
                "Terminated: call limit reached".to_string()
            }
            MinimizationStatus::LineSearchFailed => {
                "Terminated: no improvement in line search".to_string()
            }
            MinimizationStatus::NotPosDef => {
                "Terminated: metric is not positive definite".to_string()
            }
            MinimizationStatus::AboveMaxEdm => "Terminated: EDM above maximum".to_string(),
        }
    }
}

/// Estimated distance to minimum.
pub fn edm(grad: &Array1<f64>, inv_hessian: &Array2<f64>) -> f64 {
    0.5 * grad.dot(&inv_hessian.dot(grad))
}

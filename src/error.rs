use thiserror::Error;

/// Error types for the minopt-rs library.
#[derive(Error, Debug)]
pub enum MinOptError {
    /// Invalid construction input: unknown keyword, duplicate name, inverted bounds.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An operation was invoked before the state it depends on exists.
    #[error("Precondition failed: {0}")]
    PreconditionError(String),

    /// Parameter limits are inconsistent at fit time.
    #[error("Bounds violation: {0}")]
    BoundsViolation(String),

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// Error raised by the objective function.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Invalid state in the algorithm or data structure.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

impl From<crate::parameters::ParameterError> for MinOptError {
    fn from(err: crate::parameters::ParameterError) -> Self {
        MinOptError::ConfigError(format!("{}", err))
    }
}

/// Result type alias for minopt-rs operations.
pub type Result<T> = std::result::Result<T, MinOptError>;

impl From<String> for MinOptError {
    fn from(s: String) -> Self {
        MinOptError::Other(s)
    }
}

impl From<&str> for MinOptError {
    fn from(s: &str) -> Self {
        MinOptError::Other(s.to_string())
    }
}

/// Recoverable numerical conditions.
///
/// These never abort an operation. They are logged through `log::warn!`
/// when raised and kept on the [`Minuit`](crate::Minuit) instance so callers
/// can inspect them with `warnings()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericalWarning {
    #[error("HESSE failed for '{name}': {reason}")]
    HesseFailed { name: String, reason: String },

    #[error("covariance matrix was not positive definite and has been forced positive definite")]
    MadePosDef,

    #[error("MINOS {side} error for '{name}' is not valid: {reason}")]
    MinosInvalid {
        name: String,
        side: &'static str,
        reason: String,
    },

    #[error("parameter '{name}' is fixed, MINOS has nothing to compute")]
    FixedParameter { name: String },

    #[error("value of '{name}' moved from {from} to {to} to satisfy its limits")]
    ValueClamped { name: String, from: f64, to: f64 },

    #[error("contour point {index} did not reach the requested level")]
    ContourPointInvalid { index: usize },

    #[error("no initial value given for '{name}', using 0")]
    MissingInitialValue { name: String },

    #[error("no initial error given for '{name}', using 1")]
    MissingInitialError { name: String },
}

impl NumericalWarning {
    /// Log the warning and hand it back so it can be recorded.
    pub(crate) fn emit(self) -> Self {
        log::warn!("{}", self);
        self
    }
}

//! Error types for the anofox-fints library.

use thiserror::Error;

/// Result type alias for estimation and forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while testing, fitting, forecasting or evaluating.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Series too short for the requested lags or model order.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Model order incompatible with the available sample.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Fitted MA polynomial has roots inside the unit circle.
    #[error("non-invertible model: smallest MA root modulus {min_modulus:.4} is below 1")]
    NonInvertibleModel { min_modulus: f64 },

    /// No feasible variance parameters with persistence below one.
    #[error("non-stationary variance: persistence {persistence:.4} >= 1")]
    NonStationaryVariance { persistence: f64 },

    /// Actual and forecast sequences differ in length.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Optimizer ended on a non-finite objective.
    #[error("optimization diverged: {0}")]
    OptimizationDiverged(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Missing or non-finite values detected.
    #[error("missing values detected in data")]
    MissingValues,
}

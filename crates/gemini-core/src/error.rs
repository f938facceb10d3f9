//! Error types for the estimators and reduction adapters

use thiserror::Error;

/// Errors raised while computing a single metric.
///
/// Every variant is local to one record. Callers decide whether to abort
/// or skip; no variant is ever replaced by a fallback score here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// Too few samples, zero variance, or a singular covariance matrix
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Source entropy is (numerically) zero
    #[error("division by zero: source entropy is {0}")]
    DivisionByZero(f64),

    /// Point sets that must correspond row-for-row do not
    #[error("shape mismatch: {left} points vs {right} points")]
    ShapeMismatch { left: usize, right: usize },

    /// Parameter rejected before the underlying transform runs
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for metric and reduction operations
pub type Result<T> = std::result::Result<T, MetricError>;

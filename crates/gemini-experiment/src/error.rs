//! Error types for experiment runs

use crate::record::Experiment;
use gemini_core::MetricError;
use thiserror::Error;

/// Result type for experiment operations
pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Errors that abort an experiment run.
///
/// Runs are fail-fast: the first failing record stops the run, so no
/// partial result set is ever returned.
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// A metric failed while producing one record
    #[error("trial {trial}, dataset '{dataset}', {experiment}: {source}")]
    Record {
        trial: usize,
        dataset: String,
        experiment: Experiment,
        source: MetricError,
    },

    /// A dataset could not be prepared or is incompatible with the run
    #[error("dataset '{dataset}': {source}")]
    Dataset { dataset: String, source: MetricError },

    /// Cancellation was requested between protocol steps
    #[error("run cancelled at trial {trial}, dataset '{dataset}', {experiment}")]
    Cancelled {
        trial: usize,
        dataset: String,
        experiment: Experiment,
    },

    /// Invalid run configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error (config files)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExperimentError {
    /// The underlying metric error, if this failure came from one.
    pub fn metric_error(&self) -> Option<&MetricError> {
        match self {
            Self::Record { source, .. } | Self::Dataset { source, .. } => Some(source),
            _ => None,
        }
    }
}

// =============================================================================
// Analysis Errors
// =============================================================================
//
// Typed failures of the computational core. I/O and HTTP edges keep using
// `anyhow` with context and are folded into `DataSource` / `Report` at the
// boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Fewer observations than a required window.
    #[error("{stage}: insufficient data, need at least {required} observations, got {available}")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        available: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("data source error: {0}")]
    DataSource(String),

    #[error("report error: {0}")]
    Report(String),
}

impl AnalysisError {
    pub fn insufficient(stage: &'static str, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            stage,
            required,
            available,
        }
    }

    /// Fold an `anyhow` chain from the fetch layer into a `DataSource` error.
    pub fn data_source(err: anyhow::Error) -> Self {
        Self::DataSource(format!("{err:#}"))
    }
}

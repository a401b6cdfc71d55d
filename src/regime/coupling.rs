// =============================================================================
// Volatility / Entropy Coupling — rolling correlation of the normalised columns
// =============================================================================

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::indicators::correlation::{mean_defined, rolling_correlation};
use crate::metrics::MetricsTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationAnalysis {
    pub window: usize,
    /// One entry per metrics row; `None` for the first `window - 1` rows and
    /// for windows where either column is flat.
    pub values: Vec<Option<f64>>,
    /// Mean of the defined values.
    pub mean: Option<f64>,
}

impl CorrelationAnalysis {
    pub fn defined(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Rolling Pearson correlation of `vol_norm` against `ent_norm`.
pub fn correlate(table: &MetricsTable, window: usize) -> Result<CorrelationAnalysis, AnalysisError> {
    if window < 2 {
        return Err(AnalysisError::InvalidParameter(format!(
            "correlation window must be >= 2, got {window}"
        )));
    }

    let values = rolling_correlation(&table.vol_norm(), &table.ent_norm(), window);
    let mean = mean_defined(&values);

    if mean.is_none() {
        warn!(
            rows = table.len(),
            window,
            "no rolling correlation defined: too few metrics rows"
        );
    }

    let analysis = CorrelationAnalysis {
        window,
        values,
        mean,
    };

    debug!(
        window,
        defined = analysis.defined(),
        mean = ?analysis.mean,
        "rolling correlation computed"
    );

    Ok(analysis)
}

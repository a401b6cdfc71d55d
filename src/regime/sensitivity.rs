// =============================================================================
// Bin-Sensitivity Sweep — entropy "risk surface"
// =============================================================================
//
// Recomputes rolling entropy for each candidate bin count and stacks the
// results into a matrix: one row per bin count, one column per recent date.
// All rows are truncated to the most recent N values, N being the shortest
// series, so the columns line up in time.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::AnalysisError;
use crate::indicators::entropy::rolling_entropy;
use crate::indicators::returns::ReturnSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivitySurface {
    pub window: usize,
    /// Row labels, in the order requested.
    pub bin_counts: Vec<usize>,
    /// Column labels, oldest first.
    pub dates: Vec<NaiveDate>,
    /// `matrix[row][col]`: entropy for `bin_counts[row]` on `dates[col]`.
    pub matrix: Vec<Vec<f64>>,
}

impl SensitivitySurface {
    pub fn rows(&self) -> usize {
        self.matrix.len()
    }

    pub fn cols(&self) -> usize {
        self.dates.len()
    }
}

/// Sweep rolling entropy over `bin_counts` with a fixed `window`.
pub fn bin_sensitivity(
    returns: &ReturnSeries,
    window: usize,
    bin_counts: &[usize],
) -> Result<SensitivitySurface, AnalysisError> {
    if bin_counts.is_empty() {
        return Err(AnalysisError::InvalidParameter(
            "bin-sensitivity sweep needs at least one bin count".into(),
        ));
    }
    if let Some(&b) = bin_counts.iter().find(|&&b| b < 2) {
        return Err(AnalysisError::InvalidParameter(format!(
            "sweep bin counts must be >= 2, got {b}"
        )));
    }
    if window == 0 {
        return Err(AnalysisError::InvalidParameter(
            "sweep window must be positive".into(),
        ));
    }
    if returns.len() < window {
        return Err(AnalysisError::insufficient("sensitivity", window, returns.len()));
    }

    let values = returns.values();
    let series: Vec<Vec<f64>> = bin_counts
        .iter()
        .map(|&bins| rolling_entropy(&values, window, bins))
        .collect();

    let shortest = series.iter().map(Vec::len).min().unwrap_or(0);

    let matrix: Vec<Vec<f64>> = series
        .into_iter()
        .map(|s| s[s.len() - shortest..].to_vec())
        .collect();

    let all_dates = returns.dates();
    let dates = all_dates[all_dates.len() - shortest..].to_vec();

    debug!(
        window,
        rows = matrix.len(),
        cols = shortest,
        "bin-sensitivity surface computed"
    );

    Ok(SensitivitySurface {
        window,
        bin_counts: bin_counts.to_vec(),
        dates,
        matrix,
    })
}

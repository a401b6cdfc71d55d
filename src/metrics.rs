// =============================================================================
// Rolling Metrics Engine — volatility and entropy side by side
// =============================================================================
//
// Runs both rolling estimators over the same trailing windows of returns,
// min-max normalises each column over the whole computed series, and keeps
// only the dates where all four values are defined. The first row therefore
// belongs to return index `window - 1`.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::indicators::entropy::rolling_entropy;
use crate::indicators::normalize::min_max_normalize;
use crate::indicators::returns::ReturnSeries;
use crate::indicators::volatility::rolling_volatility;
use crate::runtime_config::MetricsParams;

/// One date of the metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsRow {
    pub date: NaiveDate,
    /// Annualised rolling standard deviation of returns.
    pub volatility: f64,
    /// Histogram Shannon entropy of the same window (nats).
    pub entropy: f64,
    pub vol_norm: f64,
    pub ent_norm: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsTable {
    rows: Vec<MetricsRow>,
}

impl MetricsTable {
    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn entropy(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.entropy).collect()
    }

    pub fn vol_norm(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.vol_norm).collect()
    }

    pub fn ent_norm(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.ent_norm).collect()
    }
}

/// Build the metrics table from a return series.
///
/// Rows with any undefined value are dropped. A column with `max == min`
/// normalises to NaN everywhere, so the table comes back empty rather than
/// failing.
///
/// Errors:
/// - `InvalidParameter` when `window < 2` or `bins < 2`;
/// - `InsufficientData` when there are fewer than `window` returns.
pub fn compute_metrics(
    returns: &ReturnSeries,
    params: &MetricsParams,
) -> Result<MetricsTable, AnalysisError> {
    let window = params.window;
    if window < 2 {
        return Err(AnalysisError::InvalidParameter(format!(
            "metrics window must be >= 2, got {window}"
        )));
    }
    if params.bins < 2 {
        return Err(AnalysisError::InvalidParameter(format!(
            "metrics bins must be >= 2, got {}",
            params.bins
        )));
    }
    if returns.len() < window {
        return Err(AnalysisError::insufficient("metrics", window, returns.len()));
    }

    let values = returns.values();
    let dates = returns.dates();

    let volatility = rolling_volatility(&values, window, params.annualization);
    let entropy = rolling_entropy(&values, window, params.bins);
    let vol_norm = min_max_normalize(&volatility);
    let ent_norm = min_max_normalize(&entropy);

    let computed = volatility.len().min(entropy.len());
    let rows: Vec<MetricsRow> = (0..computed)
        .map(|k| MetricsRow {
            date: dates[k + window - 1],
            volatility: volatility[k],
            entropy: entropy[k],
            vol_norm: vol_norm[k],
            ent_norm: ent_norm[k],
        })
        .filter(|r| {
            r.volatility.is_finite()
                && r.entropy.is_finite()
                && r.vol_norm.is_finite()
                && r.ent_norm.is_finite()
        })
        .collect();

    if rows.is_empty() && computed > 0 {
        for (column, norm) in [("volatility", &vol_norm), ("entropy", &ent_norm)] {
            if norm.iter().all(|v| v.is_nan()) {
                warn!(column, "normalisation undefined (max == min), metrics table is empty");
            }
        }
    }

    if rows.len() < computed {
        warn!(
            dropped = computed - rows.len(),
            kept = rows.len(),
            "metrics rows dropped with undefined values"
        );
    }

    debug!(
        returns = returns.len(),
        window,
        bins = params.bins,
        rows = rows.len(),
        "metrics table computed"
    );

    Ok(MetricsTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::returns::simple_returns;
    use crate::indicators::volatility::sample_std;
    use crate::market_data::PriceSeries;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
    }

    /// Deterministic xorshift random walk.
    fn pseudorandom_prices(len: usize, seed: u64) -> PriceSeries {
        let mut closes = Vec::with_capacity(len);
        let mut price = 100.0;
        let mut state = seed;
        for _ in 0..len {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let r = (state as f64 / u64::MAX as f64) - 0.5;
            price *= 1.0 + r * 0.04;
            closes.push(price);
        }
        PriceSeries::from_closes(day(0), &closes)
    }

    fn params(window: usize, bins: usize) -> MetricsParams {
        MetricsParams {
            window,
            bins,
            annualization: 252.0,
        }
    }

    #[test]
    fn worked_example_first_row_at_return_index_one() {
        let prices = PriceSeries::from_closes(day(0), &[100.0, 102.0, 101.0, 105.0, 103.0]);
        let returns = simple_returns(&prices).unwrap();
        let table = compute_metrics(&returns, &params(2, 4)).unwrap();

        // Two-value windows differ in bin width, so the floored entropies
        // differ slightly and every row survives normalisation.
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].date, returns.points()[1].date);

        let r = returns.values();
        let expected = sample_std(&r[0..2]).unwrap() * 252.0_f64.sqrt();
        assert!((table.rows()[0].volatility - expected).abs() < 1e-12);
        for row in table.rows() {
            assert!((row.entropy - 2.0_f64.ln()).abs() < 1e-8);
        }
    }

    #[test]
    fn first_row_uses_first_full_window() {
        let returns = simple_returns(&pseudorandom_prices(60, 11)).unwrap();
        let table = compute_metrics(&returns, &params(5, 4)).unwrap();

        assert_eq!(table.rows()[0].date, returns.points()[4].date);
        assert_eq!(table.rows().last().unwrap().date, returns.points()[58].date);

        let first = &returns.values()[0..5];
        let mean = first.iter().sum::<f64>() / 5.0;
        let sd = (first.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 4.0).sqrt();
        assert!((table.rows()[0].volatility - sd * 252.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn normalised_columns_are_in_unit_interval() {
        let returns = simple_returns(&pseudorandom_prices(400, 42)).unwrap();
        let table = compute_metrics(&returns, &params(20, 15)).unwrap();

        assert_eq!(table.len(), returns.len() - 20 + 1);
        for r in table.rows() {
            assert!((0.0..=1.0).contains(&r.vol_norm), "vol_norm {}", r.vol_norm);
            assert!((0.0..=1.0).contains(&r.ent_norm), "ent_norm {}", r.ent_norm);
        }
        let vn = table.vol_norm();
        assert!(vn.iter().any(|v| *v == 0.0));
        assert!(vn.iter().any(|v| *v == 1.0));
    }

    #[test]
    fn vol_norm_is_monotone_in_volatility() {
        let returns = simple_returns(&pseudorandom_prices(300, 7)).unwrap();
        let table = compute_metrics(&returns, &params(20, 15)).unwrap();
        let rows = table.rows();
        for a in rows {
            for b in rows {
                if a.volatility <= b.volatility {
                    assert!(a.vol_norm <= b.vol_norm);
                }
            }
        }
    }

    #[test]
    fn computation_is_idempotent() {
        let returns = simple_returns(&pseudorandom_prices(250, 99)).unwrap();
        let a = compute_metrics(&returns, &params(20, 15)).unwrap();
        let b = compute_metrics(&returns, &params(20, 15)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fewer_returns_than_window_is_insufficient() {
        let returns = simple_returns(&pseudorandom_prices(10, 1)).unwrap();
        let err = compute_metrics(&returns, &params(20, 15)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData { required: 20, available: 9, .. }
        ));
    }

    #[test]
    fn tiny_window_or_bins_are_rejected() {
        let returns = simple_returns(&pseudorandom_prices(50, 3)).unwrap();
        assert!(matches!(
            compute_metrics(&returns, &params(1, 15)),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            compute_metrics(&returns, &params(20, 1)),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn single_window_drops_every_row() {
        // Exactly one full window: max == min for both columns.
        let returns = simple_returns(&pseudorandom_prices(21, 5)).unwrap();
        let table = compute_metrics(&returns, &params(20, 15)).unwrap();
        assert!(table.is_empty());
        assert!(table.dates().is_empty());
    }
}

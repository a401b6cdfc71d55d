// =============================================================================
// Analyzer — single-pass entropy / volatility pipeline
// =============================================================================
//
//   prices ─► returns ─► metrics table ─┬─► rolling correlation
//                 │                     └─► regime threshold + mask
//                 ├─► bin-sensitivity surface
//                 └─► distribution profile
//
// Each stage takes its input by reference and returns a fresh value; nothing
// is mutated after construction. The first failing stage aborts the run.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::indicators::distribution::{describe_returns, ReturnDistribution};
use crate::indicators::returns::{simple_returns, ReturnSeries};
use crate::market_data::PriceSeries;
use crate::metrics::{compute_metrics, MetricsTable};
use crate::regime::{bin_sensitivity, correlate, detect_regimes};
use crate::regime::{CorrelationAnalysis, RegimeAnalysis, SensitivitySurface};
use crate::runtime_config::{DistributionParams, MetricsParams, RuntimeConfig, SweepParams};

/// Everything the chart renderer consumes for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub returns: ReturnSeries,
    pub metrics: MetricsTable,
    pub correlation: CorrelationAnalysis,
    pub regime: RegimeAnalysis,
    pub surface: SensitivitySurface,
    pub distribution: ReturnDistribution,
}

/// Parameters of every stage, usually taken from [`RuntimeConfig`].
#[derive(Debug, Clone)]
pub struct Analyzer {
    metrics: MetricsParams,
    correlation_window: usize,
    regime_quantile: f64,
    sweep: SweepParams,
    distribution: DistributionParams,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }
}

impl Analyzer {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            metrics: config.metrics.clone(),
            correlation_window: config.correlation_window,
            regime_quantile: config.regime_quantile,
            sweep: config.sweep.clone(),
            distribution: config.distribution.clone(),
        }
    }

    /// Run every stage once over `prices`.
    pub fn run(&self, prices: &PriceSeries) -> Result<AnalysisReport, AnalysisError> {
        let returns = simple_returns(prices)?;
        info!(prices = prices.len(), returns = returns.len(), "returns extracted");

        let metrics = compute_metrics(&returns, &self.metrics)?;
        if metrics.is_empty() {
            warn!(
                returns = returns.len(),
                window = self.metrics.window,
                "metrics table is empty, correlation and regimes will be undefined"
            );
        }
        info!(
            rows = metrics.len(),
            window = self.metrics.window,
            bins = self.metrics.bins,
            "rolling metrics computed"
        );

        let correlation = correlate(&metrics, self.correlation_window)?;
        let regime = detect_regimes(&metrics, self.regime_quantile)?;
        info!(
            mean_correlation = ?correlation.mean,
            threshold = ?regime.threshold,
            flagged = regime.flagged,
            "correlation and regimes analysed"
        );

        let surface = bin_sensitivity(&returns, self.sweep.window, &self.sweep.bin_counts())?;
        info!(
            rows = surface.rows(),
            cols = surface.cols(),
            "bin-sensitivity surface built"
        );

        let distribution = describe_returns(
            &returns.values(),
            self.distribution.bins,
            self.distribution.kde_points,
        )?;

        Ok(AnalysisReport {
            returns,
            metrics,
            correlation,
            regime,
            surface,
            distribution,
        })
    }
}

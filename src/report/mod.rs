// =============================================================================
// Report Module — chart data for the six summary figures
// =============================================================================
//
// Each chart is published as a JSON document holding exactly the series a
// renderer needs to draw it. File stems carry a fixed sequence index so the
// figures sort in presentation order:
//
//   01_normalized_metrics     normalised volatility and entropy over time
//   02_phase_space            (volatility, entropy) scatter coloured by time
//   03_returns_distribution   histogram + KDE + moments of daily returns
//   04_rolling_correlation    rolling correlation and its mean
//   05_regime_detection       entropy, quantile threshold and regime mask
//   06_risk_surface           entropy by bin count × recent date

pub mod writer;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::analyzer::AnalysisReport;
use crate::error::AnalysisError;
use crate::indicators::distribution::{DensityCurve, ReturnMoments};
use crate::runtime_config::RuntimeConfig;
use crate::types::DataSourceKind;

pub use writer::ReportWriter;

// =============================================================================
// Run metadata
// =============================================================================

/// Identifies the run in every artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMeta {
    pub symbol: String,
    pub source: DataSourceKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub generated_at: DateTime<Utc>,
}

impl RunMeta {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            symbol: config.symbol.clone(),
            source: config.source,
            start: config.start,
            end: config.end,
            generated_at: Utc::now(),
        }
    }
}

// =============================================================================
// Chart payloads
// =============================================================================

#[derive(Debug, Serialize)]
struct NormalizedMetricsChart {
    dates: Vec<NaiveDate>,
    vol_norm: Vec<f64>,
    ent_norm: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct PhasePoint {
    volatility: f64,
    entropy: f64,
    /// Row position, used as the colour scale ("time flow").
    time_index: usize,
}

#[derive(Debug, Serialize)]
struct PhaseSpaceChart {
    points: Vec<PhasePoint>,
}

#[derive(Debug, Serialize)]
struct ReturnsDistributionChart<'a> {
    histogram_edges: &'a [f64],
    histogram_density: &'a [f64],
    kde: Option<&'a DensityCurve>,
    moments: &'a ReturnMoments,
}

#[derive(Debug, Serialize)]
struct RollingCorrelationChart<'a> {
    window: usize,
    dates: Vec<NaiveDate>,
    correlation: &'a [Option<f64>],
    mean: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RegimeDetectionChart<'a> {
    quantile: f64,
    threshold: Option<f64>,
    dates: Vec<NaiveDate>,
    entropy: Vec<f64>,
    regime: &'a [bool],
    flagged_fraction: f64,
}

#[derive(Debug, Serialize)]
struct RiskSurfaceChart<'a> {
    window: usize,
    bin_counts: &'a [usize],
    dates: &'a [NaiveDate],
    matrix: &'a [Vec<f64>],
}

/// One chart document ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartArtifact {
    /// File stem, e.g. `01_normalized_metrics`.
    pub name: &'static str,
    pub title: String,
    pub meta: RunMeta,
    pub data: serde_json::Value,
}

/// Scalar results of the run, written next to the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub meta: RunMeta,
    pub returns: usize,
    pub metrics_rows: usize,
    pub first_metrics_date: Option<NaiveDate>,
    pub last_metrics_date: Option<NaiveDate>,
    pub correlation_window: usize,
    pub mean_correlation: Option<f64>,
    pub regime_quantile: f64,
    pub regime_threshold: Option<f64>,
    pub regime_flagged: usize,
    pub regime_flagged_fraction: f64,
    pub surface_rows: usize,
    pub surface_cols: usize,
    pub moments: ReturnMoments,
}

impl RunSummary {
    pub fn new(report: &AnalysisReport, meta: &RunMeta) -> Self {
        Self {
            meta: meta.clone(),
            returns: report.returns.len(),
            metrics_rows: report.metrics.len(),
            first_metrics_date: report.metrics.rows().first().map(|r| r.date),
            last_metrics_date: report.metrics.rows().last().map(|r| r.date),
            correlation_window: report.correlation.window,
            mean_correlation: report.correlation.mean,
            regime_quantile: report.regime.quantile,
            regime_threshold: report.regime.threshold,
            regime_flagged: report.regime.flagged,
            regime_flagged_fraction: report.regime.flagged_fraction,
            surface_rows: report.surface.rows(),
            surface_cols: report.surface.cols(),
            moments: report.distribution.moments.clone(),
        }
    }
}

fn to_value<T: Serialize>(name: &str, payload: &T) -> Result<serde_json::Value, AnalysisError> {
    serde_json::to_value(payload)
        .map_err(|e| AnalysisError::Report(format!("failed to serialise {name}: {e}")))
}

/// Build the six chart documents in presentation order.
pub fn build_artifacts(
    report: &AnalysisReport,
    meta: &RunMeta,
) -> Result<Vec<ChartArtifact>, AnalysisError> {
    let metrics = &report.metrics;
    let dates = metrics.dates();

    let normalized = NormalizedMetricsChart {
        dates: dates.clone(),
        vol_norm: metrics.vol_norm(),
        ent_norm: metrics.ent_norm(),
    };

    let phase = PhaseSpaceChart {
        points: metrics
            .rows()
            .iter()
            .enumerate()
            .map(|(i, r)| PhasePoint {
                volatility: r.volatility,
                entropy: r.entropy,
                time_index: i,
            })
            .collect(),
    };

    let dist = &report.distribution;
    let distribution = ReturnsDistributionChart {
        histogram_edges: &dist.histogram_edges,
        histogram_density: &dist.histogram_density,
        kde: dist.kde.as_ref(),
        moments: &dist.moments,
    };

    let correlation = RollingCorrelationChart {
        window: report.correlation.window,
        dates: dates.clone(),
        correlation: &report.correlation.values,
        mean: report.correlation.mean,
    };

    let regime = RegimeDetectionChart {
        quantile: report.regime.quantile,
        threshold: report.regime.threshold,
        dates,
        entropy: metrics.entropy(),
        regime: &report.regime.mask,
        flagged_fraction: report.regime.flagged_fraction,
    };

    let surface = RiskSurfaceChart {
        window: report.surface.window,
        bin_counts: &report.surface.bin_counts,
        dates: &report.surface.dates,
        matrix: &report.surface.matrix,
    };

    let quantile_pct = (report.regime.quantile * 100.0).round();

    Ok(vec![
        ChartArtifact {
            name: "01_normalized_metrics",
            title: "Volatility vs Entropy (Normalized)".into(),
            meta: meta.clone(),
            data: to_value("01_normalized_metrics", &normalized)?,
        },
        ChartArtifact {
            name: "02_phase_space",
            title: "Phase Space: Entropy-Volatility".into(),
            meta: meta.clone(),
            data: to_value("02_phase_space", &phase)?,
        },
        ChartArtifact {
            name: "03_returns_distribution",
            title: "Non-Gaussian Returns Distribution".into(),
            meta: meta.clone(),
            data: to_value("03_returns_distribution", &distribution)?,
        },
        ChartArtifact {
            name: "04_rolling_correlation",
            title: format!("Rolling Correlation ({}D)", report.correlation.window),
            meta: meta.clone(),
            data: to_value("04_rolling_correlation", &correlation)?,
        },
        ChartArtifact {
            name: "05_regime_detection",
            title: format!("Market Regime Detection ({quantile_pct}th percentile)"),
            meta: meta.clone(),
            data: to_value("05_regime_detection", &regime)?,
        },
        ChartArtifact {
            name: "06_risk_surface",
            title: "Risk Surface: Bin Sensitivity".into(),
            meta: meta.clone(),
            data: to_value("06_risk_surface", &surface)?,
        },
    ])
}

// =============================================================================
// Runtime Configuration — analysis settings loaded from JSON
// =============================================================================
//
// Every tunable of a run lives here: which instrument and date range to load,
// where the data comes from, the rolling-window parameters and where the
// chart data is written.
//
// All fields carry `#[serde(default)]` so that a partial (or empty) JSON file
// loads with the remaining values at their defaults. Environment variables
// override the file for the handful of values that change between runs.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::volatility::TRADING_DAYS_PER_YEAR;
use crate::types::DataSourceKind;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_price_file() -> String {
    "data/prices.json".to_string()
}

fn default_output_dir() -> String {
    "assets".to_string()
}

fn default_window() -> usize {
    20
}

fn default_bins() -> usize {
    15
}

fn default_annualization() -> f64 {
    TRADING_DAYS_PER_YEAR
}

fn default_correlation_window() -> usize {
    60
}

fn default_regime_quantile() -> f64 {
    0.90
}

fn default_sweep_bins_start() -> usize {
    5
}

fn default_sweep_bins_end() -> usize {
    50
}

fn default_sweep_bins_step() -> usize {
    5
}

fn default_distribution_bins() -> usize {
    60
}

fn default_kde_points() -> usize {
    1000
}

// =============================================================================
// Parameter groups
// =============================================================================

/// Rolling volatility / entropy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsParams {
    /// Trailing window length in return observations.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Histogram bin count for the entropy estimate.
    #[serde(default = "default_bins")]
    pub bins: usize,

    /// Periods per year used to annualise the standard deviation.
    #[serde(default = "default_annualization")]
    pub annualization: f64,
}

impl Default for MetricsParams {
    fn default() -> Self {
        Self {
            window: default_window(),
            bins: default_bins(),
            annualization: default_annualization(),
        }
    }
}

/// Bin-sensitivity sweep parameters. The bin range is inclusive at both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepParams {
    #[serde(default = "default_window")]
    pub window: usize,

    #[serde(default = "default_sweep_bins_start")]
    pub bins_start: usize,

    #[serde(default = "default_sweep_bins_end")]
    pub bins_end: usize,

    #[serde(default = "default_sweep_bins_step")]
    pub bins_step: usize,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            window: default_window(),
            bins_start: default_sweep_bins_start(),
            bins_end: default_sweep_bins_end(),
            bins_step: default_sweep_bins_step(),
        }
    }
}

impl SweepParams {
    /// `bins_start, bins_start + step, ..., <= bins_end`.
    pub fn bin_counts(&self) -> Vec<usize> {
        if self.bins_step == 0 || self.bins_start > self.bins_end {
            return Vec::new();
        }
        (self.bins_start..=self.bins_end)
            .step_by(self.bins_step)
            .collect()
    }
}

/// Returns-distribution profile parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionParams {
    #[serde(default = "default_distribution_bins")]
    pub bins: usize,

    /// Number of grid points the kernel density is evaluated on.
    #[serde(default = "default_kde_points")]
    pub kde_points: usize,
}

impl Default for DistributionParams {
    fn default() -> Self {
        Self {
            bins: default_distribution_bins(),
            kde_points: default_kde_points(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Instrument & range -------------------------------------------------

    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// First day to load (inclusive).
    #[serde(default = "default_start")]
    pub start: NaiveDate,

    /// Last day to load (exclusive).
    #[serde(default = "default_end")]
    pub end: NaiveDate,

    // --- Data source --------------------------------------------------------

    #[serde(default)]
    pub source: DataSourceKind,

    /// JSON price cache: read when `source` is `File`, written after a
    /// successful download when `cache_prices` is set.
    #[serde(default = "default_price_file")]
    pub price_file: String,

    #[serde(default = "default_true")]
    pub cache_prices: bool,

    // --- Output -------------------------------------------------------------

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    // --- Analysis parameters ------------------------------------------------

    #[serde(default)]
    pub metrics: MetricsParams,

    /// Trailing rows for the volatility/entropy rolling correlation.
    #[serde(default = "default_correlation_window")]
    pub correlation_window: usize,

    /// Entropy quantile above which a row is flagged as a regime.
    #[serde(default = "default_regime_quantile")]
    pub regime_quantile: f64,

    #[serde(default)]
    pub sweep: SweepParams,

    #[serde(default)]
    pub distribution: DistributionParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            start: default_start(),
            end: default_end(),
            source: DataSourceKind::default(),
            price_file: default_price_file(),
            cache_prices: true,
            output_dir: default_output_dir(),
            metrics: MetricsParams::default(),
            correlation_window: default_correlation_window(),
            regime_quantile: default_regime_quantile(),
            sweep: SweepParams::default(),
            distribution: DistributionParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            source = %config.source,
            "config loaded"
        );

        Ok(config)
    }

    /// Apply `ANALYZER_*` overrides. `lookup` is `std::env::var(..).ok()` in
    /// production and a map in tests.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(symbol) = lookup("ANALYZER_SYMBOL") {
            let symbol = symbol.trim().to_uppercase();
            if !symbol.is_empty() {
                self.symbol = symbol;
            }
        }
        if let Some(start) = lookup("ANALYZER_START") {
            self.start = parse_date("ANALYZER_START", &start)?;
        }
        if let Some(end) = lookup("ANALYZER_END") {
            self.end = parse_date("ANALYZER_END", &end)?;
        }
        if let Some(source) = lookup("ANALYZER_SOURCE") {
            self.source = source
                .parse()
                .map_err(|e: String| anyhow::anyhow!("ANALYZER_SOURCE: {e}"))?;
        }
        if let Some(path) = lookup("ANALYZER_PRICE_FILE") {
            self.price_file = path;
        }
        if let Some(dir) = lookup("ANALYZER_OUTPUT_DIR") {
            self.output_dir = dir;
        }
        Ok(())
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            anyhow::bail!("symbol must not be empty");
        }
        if self.start >= self.end {
            anyhow::bail!("start ({}) must be before end ({})", self.start, self.end);
        }
        if self.metrics.window < 2 {
            anyhow::bail!("metrics.window must be >= 2, got {}", self.metrics.window);
        }
        if self.metrics.bins < 2 {
            anyhow::bail!("metrics.bins must be >= 2, got {}", self.metrics.bins);
        }
        if !self.metrics.annualization.is_finite() || self.metrics.annualization <= 0.0 {
            anyhow::bail!("metrics.annualization must be positive");
        }
        if self.correlation_window < 2 {
            anyhow::bail!(
                "correlation_window must be >= 2, got {}",
                self.correlation_window
            );
        }
        if !(0.0..=1.0).contains(&self.regime_quantile) {
            anyhow::bail!(
                "regime_quantile must be within [0, 1], got {}",
                self.regime_quantile
            );
        }
        if self.sweep.window < 2 {
            anyhow::bail!("sweep.window must be >= 2, got {}", self.sweep.window);
        }
        let bin_counts = self.sweep.bin_counts();
        if bin_counts.is_empty() {
            anyhow::bail!("sweep bin range is empty");
        }
        if bin_counts.iter().any(|&b| b < 2) {
            anyhow::bail!("sweep bin counts must all be >= 2, got {:?}", bin_counts);
        }
        if self.distribution.bins == 0 {
            anyhow::bail!("distribution.bins must be positive");
        }
        if self.distribution.kde_points < 2 {
            anyhow::bail!("distribution.kde_points must be >= 2");
        }
        Ok(())
    }
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("{name}: expected YYYY-MM-DD, got '{value}'"))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.symbol, "BTCUSDT");
        assert_eq!(cfg.start, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(cfg.end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(cfg.source, DataSourceKind::Binance);
        assert_eq!(cfg.output_dir, "assets");
        assert_eq!(cfg.metrics.window, 20);
        assert_eq!(cfg.metrics.bins, 15);
        assert!((cfg.metrics.annualization - 252.0).abs() < f64::EPSILON);
        assert_eq!(cfg.correlation_window, 60);
        assert!((cfg.regime_quantile - 0.90).abs() < f64::EPSILON);
        assert_eq!(cfg.sweep.window, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_sweep_range_is_five_to_fifty() {
        let bins = SweepParams::default().bin_counts();
        assert_eq!(bins, vec![5, 10, 15, 20, 25, 30, 35, 40, 45, 50]);
    }

    #[test]
    fn sweep_with_zero_step_is_empty() {
        let sweep = SweepParams {
            bins_step: 0,
            ..SweepParams::default()
        };
        assert!(sweep.bin_counts().is_empty());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.symbol, "BTCUSDT");
        assert_eq!(cfg.metrics.window, 20);
        assert!(cfg.cache_prices);
        assert_eq!(cfg.distribution.bins, 60);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "symbol": "ETHUSDT", "source": "File", "metrics": { "bins": 30 } }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.symbol, "ETHUSDT");
        assert_eq!(cfg.source, DataSourceKind::File);
        assert_eq!(cfg.metrics.bins, 30);
        assert_eq!(cfg.metrics.window, 20);
        assert_eq!(cfg.correlation_window, 60);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(lookup_from(&[
            ("ANALYZER_SYMBOL", " ethusdt "),
            ("ANALYZER_START", "2020-03-01"),
            ("ANALYZER_END", "2021-03-01"),
            ("ANALYZER_SOURCE", "file"),
            ("ANALYZER_OUTPUT_DIR", "out"),
        ]))
        .unwrap();

        assert_eq!(cfg.symbol, "ETHUSDT");
        assert_eq!(cfg.start, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(cfg.end, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
        assert_eq!(cfg.source, DataSourceKind::File);
        assert_eq!(cfg.output_dir, "out");
    }

    #[test]
    fn bad_date_override_is_rejected() {
        let mut cfg = RuntimeConfig::default();
        let err = cfg
            .apply_overrides(lookup_from(&[("ANALYZER_START", "01/01/2020")]))
            .unwrap_err();
        assert!(err.to_string().contains("ANALYZER_START"));
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let mut cfg = RuntimeConfig::default();
        cfg.end = cfg.start;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_small_windows_and_bins() {
        let mut cfg = RuntimeConfig::default();
        cfg.metrics.window = 1;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.metrics.bins = 1;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.regime_quantile = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.sweep.bins_start = 60;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_file_and_fills_defaults() {
        let path = std::env::temp_dir().join(format!(
            "entropy-vol-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "symbol": "SOLUSDT", "sweep": { "bins_end": 25 } }"#).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.symbol, "SOLUSDT");
        assert_eq!(loaded.sweep.bin_counts(), vec![5, 10, 15, 20, 25]);
        assert_eq!(loaded.metrics.window, 20);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("entropy-vol-config-does-not-exist.json");
        assert!(RuntimeConfig::load(&path).is_err());
    }
}

// =============================================================================
// Entropy / Volatility Analyzer — Main Entry Point
// =============================================================================
//
// One-shot batch run: load daily closes, compute the rolling metrics and
// derived analyses, write the chart data. Any failure ends the run with a
// non-zero exit code; nothing is retried.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analyzer;
mod binance;
mod error;
mod indicators;
mod market_data;
mod metrics;
mod regime;
mod report;
mod runtime_config;
mod types;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::analyzer::Analyzer;
use crate::report::{ReportWriter, RunMeta};
use crate::runtime_config::RuntimeConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("ANALYZER_CONFIG").unwrap_or_else(|_| "analyzer_config.json".into());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    config
        .apply_overrides(|key| std::env::var(key).ok())
        .context("invalid environment override")?;
    config.validate().context("invalid configuration")?;

    info!(
        symbol = %config.symbol,
        start = %config.start,
        end = %config.end,
        source = %config.source,
        window = config.metrics.window,
        bins = config.metrics.bins,
        "Entropy / volatility analysis starting"
    );

    // ── 2. Output directory ──────────────────────────────────────────────
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create output directory {}", config.output_dir))?;

    // ── 3. Market data ───────────────────────────────────────────────────
    let prices = market_data::load_prices(&config).await?;

    // ── 4. Analysis ──────────────────────────────────────────────────────
    let report = Analyzer::from_config(&config).run(&prices)?;

    // ── 5. Chart data ────────────────────────────────────────────────────
    let meta = RunMeta::from_config(&config);
    let writer = ReportWriter::new(&config.output_dir);
    let written = writer.write(&report, &meta)?;

    info!(
        dir = %writer.dir().display(),
        files = written.len(),
        metrics_rows = report.metrics.len(),
        mean_correlation = ?report.correlation.mean,
        regime_threshold = ?report.regime.threshold,
        regime_fraction = format!("{:.3}", report.regime.flagged_fraction),
        "Analysis complete"
    );

    Ok(())
}

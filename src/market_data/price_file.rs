// =============================================================================
// Price File — JSON cache of daily closes
// =============================================================================
//
// Format: a JSON array of `{ "date": "YYYY-MM-DD", "close": <f64> }` objects,
// oldest first. Writes use the tmp + rename pattern so a crash never leaves a
// half-written cache behind.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info};

use super::{PricePoint, PriceSeries};
use crate::error::AnalysisError;

/// Read and validate a price cache file.
pub fn load(path: impl AsRef<Path>) -> Result<PriceSeries> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read price file {}", path.display()))?;

    let points: Vec<PricePoint> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse price file {}", path.display()))?;

    let series = PriceSeries::new(points)
        .with_context(|| format!("invalid price data in {}", path.display()))?;

    debug!(path = %path.display(), points = series.len(), "price file loaded");
    Ok(series)
}

/// Persist a price series atomically.
pub fn save(path: impl AsRef<Path>, series: &PriceSeries) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let content = serde_json::to_string_pretty(series.points())
        .context("failed to serialise price series to JSON")?;

    let tmp_path = path.with_extension("json.tmp");

    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write tmp prices to {}", tmp_path.display()))?;

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp prices to {}", path.display()))?;

    info!(path = %path.display(), points = series.len(), "price cache saved (atomic)");
    Ok(())
}

/// Keep the points with `start <= date < end`.
pub fn select_range(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, AnalysisError> {
    let points = series
        .points()
        .iter()
        .filter(|p| p.date >= start && p.date < end)
        .copied()
        .collect();
    PriceSeries::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "entropy-vol-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn save_then_load_preserves_points() {
        let dir = scratch_dir("price-file");
        let path = dir.join("nested").join("prices.json");
        let series = PriceSeries::from_closes(d(2023, 12, 30), &[100.0, 101.5, 99.25]);

        save(&path, &series).unwrap();
        assert!(!path.with_extension("json.tmp").exists(), "tmp file must be renamed away");

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, series);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_parses_iso_dates() {
        let dir = scratch_dir("price-file-iso");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("prices.json");
        std::fs::write(
            &path,
            r#"[{"date":"2024-01-02","close":10.0},{"date":"2024-01-03","close":11.0}]"#,
        )
        .unwrap();

        let series = load(&path).unwrap();
        assert_eq!(series.first_date(), Some(d(2024, 1, 2)));
        assert_eq!(series.closes(), vec![10.0, 11.0]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_rejects_unordered_file() {
        let dir = scratch_dir("price-file-unordered");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("prices.json");
        std::fs::write(
            &path,
            r#"[{"date":"2024-01-03","close":10.0},{"date":"2024-01-02","close":11.0}]"#,
        )
        .unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("strictly increasing"), "got: {err:#}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load("/definitely/not/here/prices.json").is_err());
    }

    #[test]
    fn select_range_is_start_inclusive_end_exclusive() {
        let series = PriceSeries::from_closes(d(2024, 1, 1), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let picked = select_range(&series, d(2024, 1, 2), d(2024, 1, 4)).unwrap();
        assert_eq!(picked.closes(), vec![2.0, 3.0]);
    }
}

// =============================================================================
// Report Writer — one JSON file per chart, written atomically
// =============================================================================
//
// Every artifact is written on its own (tmp + rename), so a failure on one
// chart never leaves a truncated file behind and does not stop the remaining
// charts from being written. All failures are reported together at the end.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info};

use super::{build_artifacts, RunMeta, RunSummary};
use crate::analyzer::AnalysisReport;
use crate::error::AnalysisError;

/// File stem of the run summary.
const SUMMARY_NAME: &str = "summary";

/// Writes chart artifacts into an existing output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// The directory must already exist; `main` creates it before the run.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the six charts and the summary. Returns the paths written, or a
    /// `Report` error naming every artifact that failed.
    pub fn write(
        &self,
        report: &AnalysisReport,
        meta: &RunMeta,
    ) -> Result<Vec<PathBuf>, AnalysisError> {
        let artifacts = build_artifacts(report, meta)?;
        let summary = RunSummary::new(report, meta);

        let mut written = Vec::with_capacity(artifacts.len() + 1);
        let mut failures: Vec<String> = Vec::new();

        for artifact in &artifacts {
            let path = self.dir.join(format!("{}.json", artifact.name));
            match write_json_atomic(&path, artifact) {
                Ok(()) => {
                    info!(chart = artifact.name, path = %path.display(), "chart data written");
                    written.push(path);
                }
                Err(e) => {
                    error!(chart = artifact.name, error = %e, "failed to write chart data");
                    failures.push(format!("{}: {e:#}", artifact.name));
                }
            }
        }

        let summary_path = self.dir.join(format!("{SUMMARY_NAME}.json"));
        match write_json_atomic(&summary_path, &summary) {
            Ok(()) => written.push(summary_path),
            Err(e) => {
                error!(error = %e, "failed to write run summary");
                failures.push(format!("{SUMMARY_NAME}: {e:#}"));
            }
        }

        if failures.is_empty() {
            Ok(written)
        } else {
            Err(AnalysisError::Report(format!(
                "{} of {} artifacts failed: {}",
                failures.len(),
                artifacts.len() + 1,
                failures.join("; ")
            )))
        }
    }
}

/// Serialise `value` as pretty JSON to `path` via a temporary sibling file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("failed to serialise to JSON")?;

    let tmp_path = path.with_extension("json.tmp");

    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e).with_context(|| {
            format!("failed to rename {} to {}", tmp_path.display(), path.display())
        });
    }

    Ok(())
}

// =============================================================================
// Entropy Regime Detector
// =============================================================================
//
// A date is in a high-entropy regime when its rolling entropy is at or above
// the q-quantile of the entropy column (q = 0.90 by default). The quantile
// interpolates linearly between order statistics:
//
//   h = (n - 1) * q,   Q = x_(⌊h⌋) + (h - ⌊h⌋) * (x_(⌊h⌋+1) - x_(⌊h⌋))
//
// With q = 0.90 roughly one row in ten is flagged.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::metrics::MetricsTable;

/// Threshold plus per-row flags for a metrics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeAnalysis {
    pub quantile: f64,
    /// `None` when the entropy column has no finite values.
    pub threshold: Option<f64>,
    /// One flag per metrics row, `entropy >= threshold`.
    pub mask: Vec<bool>,
    pub flagged: usize,
    pub flagged_fraction: f64,
}

/// Linear-interpolation quantile of the finite values. `None` when there are
/// none or `q` lies outside [0, 1].
pub fn quantile_linear(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - lo as f64;

    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Flag the rows of `entropy` at or above its `quantile`.
pub fn flag_regimes(entropy: &[f64], quantile: f64) -> Result<RegimeAnalysis, AnalysisError> {
    if !(0.0..=1.0).contains(&quantile) {
        return Err(AnalysisError::InvalidParameter(format!(
            "regime quantile must be within [0, 1], got {quantile}"
        )));
    }
    let Some(threshold) = quantile_linear(entropy, quantile) else {
        warn!(rows = entropy.len(), "no entropy values, regime threshold undefined");
        return Ok(RegimeAnalysis {
            quantile,
            threshold: None,
            mask: vec![false; entropy.len()],
            flagged: 0,
            flagged_fraction: 0.0,
        });
    };

    let mask: Vec<bool> = entropy.iter().map(|&e| e >= threshold).collect();
    let flagged = mask.iter().filter(|&&m| m).count();
    let flagged_fraction = flagged as f64 / mask.len() as f64;

    debug!(
        threshold = format!("{:.4}", threshold),
        flagged,
        rows = mask.len(),
        "entropy regimes flagged"
    );

    Ok(RegimeAnalysis {
        quantile,
        threshold: Some(threshold),
        mask,
        flagged,
        flagged_fraction,
    })
}

/// Regime analysis over a metrics table's raw entropy column.
pub fn detect_regimes(
    table: &MetricsTable,
    quantile: f64,
) -> Result<RegimeAnalysis, AnalysisError> {
    flag_regimes(&table.entropy(), quantile)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_linear(&v, 0.0), Some(1.0));
        assert_eq!(quantile_linear(&v, 1.0), Some(5.0));
        assert_eq!(quantile_linear(&v, 0.5), Some(3.0));
        // h = 4 * 0.9 = 3.6 -> 4 + 0.6 * (5 - 4)
        assert!((quantile_linear(&v, 0.9).unwrap() - 4.6).abs() < 1e-12);
    }

    #[test]
    fn quantile_ignores_order_and_nan() {
        let v = [5.0, f64::NAN, 1.0, 3.0, 2.0, 4.0];
        assert!((quantile_linear(&v, 0.9).unwrap() - 4.6).abs() < 1e-12);
    }

    #[test]
    fn quantile_rejects_bad_input() {
        assert_eq!(quantile_linear(&[], 0.5), None);
        assert_eq!(quantile_linear(&[1.0], 1.5), None);
        assert_eq!(quantile_linear(&[7.0], 0.9), Some(7.0));
    }

    #[test]
    fn about_ten_percent_flagged() {
        let entropy: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64 / 1000.0).collect();
        let r = flag_regimes(&entropy, 0.90).unwrap();
        assert_eq!(r.mask.len(), 1000);
        assert!(
            (r.flagged_fraction - 0.10).abs() <= 0.002,
            "flagged fraction {}",
            r.flagged_fraction
        );
        let threshold = r.threshold.unwrap();
        for (e, m) in entropy.iter().zip(&r.mask) {
            assert_eq!(*m, *e >= threshold);
        }
    }

    #[test]
    fn constant_entropy_flags_everything() {
        let r = flag_regimes(&[0.5; 10], 0.9).unwrap();
        assert_eq!(r.flagged, 10);
        assert!((r.threshold.unwrap() - 0.5).abs() < 1e-15);
    }

    #[test]
    fn empty_entropy_has_no_threshold() {
        let r = flag_regimes(&[], 0.9).unwrap();
        assert_eq!(r.threshold, None);
        assert!(r.mask.is_empty());
        assert_eq!(r.flagged, 0);
        assert_eq!(r.flagged_fraction, 0.0);
    }

    #[test]
    fn quantile_outside_unit_interval_is_rejected() {
        assert!(matches!(
            flag_regimes(&[1.0], -0.1),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }
}

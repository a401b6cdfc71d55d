// =============================================================================
// Min-Max Normalisation
// =============================================================================
//
//   x' = (x - min) / (max - min)
//
// min and max are global over the finite values of the whole series. A
// degenerate series (max == min, or no finite values) has no defined scaling
// and maps every entry to NaN; callers drop those rows.

use tracing::warn;

/// Finite `(min, max)` of a series, ignoring NaN.
pub fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Scale a series into [0, 1] using its global min and max.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    match finite_range(values) {
        Some((lo, hi)) if hi > lo => {
            let span = hi - lo;
            values.iter().map(|&v| (v - lo) / span).collect()
        }
        _ => {
            warn!(len = values.len(), "normalisation undefined: series is degenerate");
            vec![f64::NAN; values.len()]
        }
    }
}

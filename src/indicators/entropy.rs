// =============================================================================
// Histogram Shannon Entropy — information content of the return distribution
// =============================================================================
//
// For each trailing window of returns:
//
//   1. Histogram the window into `bins` equal-width bins spanning the window's
//      own [min, max]. A constant window spans [v - 0.5, v + 0.5]. Every bin
//      is half-open except the last, which also takes the right edge.
//   2. Convert counts to a probability density: count / (n * bin_width).
//   3. Add a floor of 1e-10 to every bin so no term is ln(0).
//   4. Renormalise to a distribution and take H = -Σ p ln p (nats).
//
// A window with every return in the same bin scores ~0; returns spread evenly
// over all bins approach ln(bins).

use tracing::trace;

/// Added to every density bin before the entropy sum.
pub const PROBABILITY_FLOOR: f64 = 1e-10;

/// Equal-width histogram: `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Per-bin probability density; integrates to 1 over the edges.
    pub fn density(&self) -> Vec<f64> {
        let n = self.total() as f64;
        self.counts
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&c, e)| {
                let width = e[1] - e[0];
                if n > 0.0 && width > 0.0 {
                    c as f64 / (n * width)
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Bin `values` into `bins` equal-width bins over their own range.
///
/// Returns `None` for empty input, zero bins or non-finite values.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if bins == 0 || values.is_empty() {
        return None;
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() || values.iter().any(|v| v.is_nan()) {
        return None;
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let step = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + step * i as f64).collect();
    edges[bins] = hi;

    let norm = bins as f64 / (hi - lo);
    let mut counts = vec![0usize; bins];

    for &x in values {
        let mut idx = ((x - lo) * norm) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        // Floating-point rounding can land one bin off the edge comparison.
        if idx > 0 && x < edges[idx] {
            idx -= 1;
        }
        if idx != bins - 1 && x >= edges[idx + 1] {
            idx += 1;
        }
        counts[idx] += 1;
    }

    Some(Histogram { edges, counts })
}

/// Shannon entropy (natural log) of non-negative weights after normalising
/// them to sum to one. `None` when the weights do not sum to a positive,
/// finite total.
pub fn shannon_entropy(weights: &[f64]) -> Option<f64> {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let h = weights
        .iter()
        .map(|&w| w / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum();

    Some(h)
}

/// Entropy of a single window of returns.
pub fn window_entropy(values: &[f64], bins: usize) -> Option<f64> {
    let hist = histogram(values, bins)?;
    let floored: Vec<f64> = hist
        .density()
        .into_iter()
        .map(|d| d + PROBABILITY_FLOOR)
        .collect();
    shannon_entropy(&floored)
}

/// Entropy over every full trailing window. Entries that cannot be computed
/// are NaN so the output stays aligned with the input.
pub fn rolling_entropy(values: &[f64], window: usize, bins: usize) -> Vec<f64> {
    if window == 0 || bins == 0 || values.len() < window {
        trace!(
            available = values.len(),
            window,
            bins,
            "Entropy: insufficient returns"
        );
        return Vec::new();
    }

    values
        .windows(window)
        .map(|w| window_entropy(w, bins).unwrap_or(f64::NAN))
        .collect()
}

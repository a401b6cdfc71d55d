// =============================================================================
// Returns Distribution Profile
// =============================================================================
//
// Describes how far daily returns stray from a Gaussian:
//
//   - moments: mean, sample σ, skewness (biased Fisher-Pearson g1) and excess
//     kurtosis (biased, Gaussian = 0);
//   - a density histogram over the full return range;
//   - a Gaussian kernel density estimate with Scott's bandwidth
//       h = σ * n^(-1/5)
//     evaluated on an evenly spaced grid from min - range/2 to max + range/2.

use serde::Serialize;
use tracing::debug;

use super::entropy::histogram;
use super::volatility::sample_std;
use crate::error::AnalysisError;

/// Second central moments at or below this are treated as zero variance.
const DEGENERATE_VARIANCE: f64 = 1e-30;

/// Summary moments of the return series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnMoments {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// `None` when the series has zero variance.
    pub skewness: Option<f64>,
    /// Excess kurtosis; `None` when the series has zero variance.
    pub excess_kurtosis: Option<f64>,
}

/// Kernel density evaluated on a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub grid: Vec<f64>,
    pub density: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnDistribution {
    pub moments: ReturnMoments,
    pub histogram_edges: Vec<f64>,
    pub histogram_density: Vec<f64>,
    /// `None` when the returns are constant (zero bandwidth).
    pub kde: Option<DensityCurve>,
}

pub fn moments(values: &[f64]) -> Option<ReturnMoments> {
    let n = values.len();
    let std_dev = sample_std(values)?;
    let mean = values.iter().sum::<f64>() / n as f64;

    let central = |k: i32| values.iter().map(|x| (x - mean).powi(k)).sum::<f64>() / n as f64;
    let m2 = central(2);

    let (skewness, excess_kurtosis) = if m2 > DEGENERATE_VARIANCE {
        (
            Some(central(3) / m2.powf(1.5)),
            Some(central(4) / (m2 * m2) - 3.0),
        )
    } else {
        (None, None)
    };

    Some(ReturnMoments {
        count: n,
        mean,
        std_dev,
        skewness,
        excess_kurtosis,
    })
}

/// Gaussian KDE with Scott's rule. `None` for fewer than two values, zero
/// variance, or fewer than two grid points.
pub fn gaussian_kde(values: &[f64], points: usize) -> Option<DensityCurve> {
    if points < 2 {
        return None;
    }
    let n = values.len();
    let sd = sample_std(values)?;
    if sd * sd <= DEGENERATE_VARIANCE {
        return None;
    }
    let bandwidth = sd * (n as f64).powf(-0.2);
    if bandwidth <= 0.0 || !bandwidth.is_finite() {
        return None;
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = hi - lo;
    let start = lo - 0.5 * range;
    let end = hi + 0.5 * range;
    let step = (end - start) / (points - 1) as f64;

    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let grid: Vec<f64> = (0..points).map(|i| start + step * i as f64).collect();
    let density = grid
        .iter()
        .map(|&g| {
            values
                .iter()
                .map(|&x| {
                    let z = (g - x) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect();

    Some(DensityCurve {
        bandwidth,
        grid,
        density,
    })
}

/// Moments, histogram and KDE of a return series.
pub fn describe_returns(
    values: &[f64],
    bins: usize,
    kde_points: usize,
) -> Result<ReturnDistribution, AnalysisError> {
    let moments =
        moments(values).ok_or_else(|| AnalysisError::insufficient("distribution", 2, values.len()))?;

    let hist = histogram(values, bins).ok_or_else(|| {
        AnalysisError::InvalidParameter(format!(
            "cannot histogram returns into {bins} bins (non-finite values or zero bins)"
        ))
    })?;

    let kde = gaussian_kde(values, kde_points);

    debug!(
        count = moments.count,
        skewness = ?moments.skewness,
        excess_kurtosis = ?moments.excess_kurtosis,
        bandwidth = ?kde.as_ref().map(|k| k.bandwidth),
        "returns distribution described"
    );

    Ok(ReturnDistribution {
        moments,
        histogram_density: hist.density(),
        histogram_edges: hist.edges,
        kde,
    })
}

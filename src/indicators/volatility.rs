// =============================================================================
// Rolling Annualised Volatility
// =============================================================================
//
//   σ_ann = stdev(r_{t-w+1..t}) * sqrt(periods_per_year)
//
// The standard deviation is the sample estimate (n - 1 denominator). For daily
// returns `periods_per_year` is 252.

/// Trading days per year used to annualise daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Sample standard deviation. `None` for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Annualised sample standard deviation over every full trailing window.
///
/// Returns `values.len() - window + 1` entries (empty when there is no full
/// window, or when `window < 2` makes the sample estimate undefined).
pub fn rolling_volatility(values: &[f64], window: usize, periods_per_year: f64) -> Vec<f64> {
    if window < 2 || values.len() < window {
        return Vec::new();
    }
    let scale = periods_per_year.sqrt();
    values
        .windows(window)
        .filter_map(sample_std)
        .map(|sd| sd * scale)
        .collect()
}

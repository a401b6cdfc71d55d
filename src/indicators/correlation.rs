// =============================================================================
// Rolling Pearson Correlation
// =============================================================================
//
//   ρ = Σ(x - x̄)(y - ȳ) / sqrt(Σ(x - x̄)² Σ(y - ȳ)²)
//
// Undefined (None) for the first `window - 1` positions and wherever either
// side is flat inside the window.

/// Pearson correlation of two equally long slices.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }

    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0_f64;
    let mut sxx = 0.0_f64;
    let mut syy = 0.0_f64;

    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Trailing-window correlation, one entry per input position.
pub fn rolling_correlation(xs: &[f64], ys: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = xs.len().min(ys.len());
    let mut out = vec![None; n];
    if window < 2 || n < window {
        return out;
    }

    for end in window..=n {
        out[end - 1] = pearson(&xs[end - window..end], &ys[end - window..end]);
    }
    out
}

/// Arithmetic mean of the defined entries.
pub fn mean_defined(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_positive_and_negative() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let z = [4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn invariant_to_affine_rescaling() {
        let x = [0.3, 0.9, 0.1, 0.5, 0.7];
        let y = [1.0, 0.2, 0.4, 0.8, 0.6];
        let x2: Vec<f64> = x.iter().map(|v| v * 25.0 - 3.0).collect();
        let a = pearson(&x, &y).unwrap();
        let b = pearson(&x2, &y).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn flat_side_is_undefined() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0], &[1.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn rolling_leading_entries_are_none() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..10).map(|i| (i * i) as f64).collect();
        let r = rolling_correlation(&x, &y, 4);
        assert_eq!(r.len(), 10);
        assert!(r[..3].iter().all(Option::is_none));
        assert!(r[3..].iter().all(Option::is_some));
        let direct = pearson(&x[6..10], &y[6..10]).unwrap();
        assert!((r[9].unwrap() - direct).abs() < 1e-15);
    }

    #[test]
    fn rolling_shorter_than_window_is_all_none() {
        let r = rolling_correlation(&[1.0, 2.0], &[2.0, 1.0], 60);
        assert_eq!(r, vec![None, None]);
    }

    #[test]
    fn mean_skips_undefined() {
        let v = [None, Some(0.5), None, Some(-0.1)];
        assert!((mean_defined(&v).unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(mean_defined(&[None, None]), None);
    }
}

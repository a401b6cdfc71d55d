// =============================================================================
// Simple Returns
// =============================================================================
//
//   r_t = p_t / p_{t-1} - 1
//
// The first price has no predecessor, so the return series is one element
// shorter than the price series and is dated by the later price of each pair.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::market_data::PriceSeries;

/// One simple return, dated by the closing price it ends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReturnSeries {
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Convert a price series into simple percentage returns.
///
/// Fails with `InsufficientData` when fewer than two prices are supplied.
pub fn simple_returns(prices: &PriceSeries) -> Result<ReturnSeries, AnalysisError> {
    let points = prices.points();
    if points.len() < 2 {
        return Err(AnalysisError::insufficient("returns", 2, points.len()));
    }

    let points = points
        .windows(2)
        .map(|pair| ReturnPoint {
            date: pair[1].date,
            value: pair[1].close / pair[0].close - 1.0,
        })
        .collect();

    Ok(ReturnSeries { points })
}

// =============================================================================
// Market Data — daily closing-price series and the sources that produce them
// =============================================================================

pub mod price_file;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::binance::client::BinanceClient;
use crate::error::AnalysisError;
use crate::runtime_config::RuntimeConfig;
use crate::types::DataSourceKind;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One trading day's closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered daily closes with strictly increasing dates and positive prices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate and wrap a list of price points.
    ///
    /// Any length is accepted here; the returns extractor decides whether there
    /// is enough data to work with.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, AnalysisError> {
        for (i, p) in points.iter().enumerate() {
            if !p.close.is_finite() || p.close <= 0.0 {
                return Err(AnalysisError::DataSource(format!(
                    "invalid close {} on {}",
                    p.close, p.date
                )));
            }
            if i > 0 && points[i - 1].date >= p.date {
                return Err(AnalysisError::DataSource(format!(
                    "dates not strictly increasing: {} followed by {}",
                    points[i - 1].date, p.date
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    #[cfg(test)]
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Build a series of consecutive calendar days starting at `start`.
    #[cfg(test)]
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close,
            })
            .collect();
        Self::new(points).expect("test closes must be valid")
    }
}

/// Which instrument and date range to load. `start` is inclusive, `end`
/// exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PriceRequest {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            symbol: config.symbol.clone(),
            start: config.start,
            end: config.end,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the configured price series. One attempt, no retry: any transport or
/// provider failure is returned as `AnalysisError::DataSource`.
pub async fn load_prices(config: &RuntimeConfig) -> Result<PriceSeries, AnalysisError> {
    let request = PriceRequest::from_config(config);

    let series = match config.source {
        DataSourceKind::Binance => {
            let client = BinanceClient::new().map_err(AnalysisError::data_source)?;
            let series = client
                .get_daily_closes(&request)
                .await
                .map_err(AnalysisError::data_source)?;

            if config.cache_prices && !series.is_empty() {
                if let Err(e) = price_file::save(&config.price_file, &series) {
                    warn!(error = %e, path = %config.price_file, "failed to cache prices");
                }
            }
            series
        }
        DataSourceKind::File => {
            let series =
                price_file::load(&config.price_file).map_err(AnalysisError::data_source)?;
            price_file::select_range(&series, request.start, request.end)?
        }
    };

    if series.is_empty() {
        return Err(AnalysisError::DataSource(format!(
            "no prices returned for {} between {} and {}",
            request.symbol, request.start, request.end
        )));
    }

    info!(
        symbol = %request.symbol,
        source = %config.source,
        points = series.len(),
        first = ?series.first_date(),
        last = ?series.last_date(),
        "price series loaded"
    );

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn point(date: NaiveDate, close: f64) -> PricePoint {
        PricePoint { date, close }
    }

    #[test]
    fn rejects_non_increasing_dates() {
        let points = vec![point(d(2024, 1, 2), 100.0), point(d(2024, 1, 2), 101.0)];
        let err = PriceSeries::new(points).unwrap_err();
        assert!(matches!(err, AnalysisError::DataSource(_)));
    }

    #[test]
    fn rejects_non_positive_close() {
        let points = vec![point(d(2024, 1, 1), 100.0), point(d(2024, 1, 2), 0.0)];
        assert!(PriceSeries::new(points).is_err());

        let points = vec![point(d(2024, 1, 1), f64::NAN)];
        assert!(PriceSeries::new(points).is_err());
    }

    #[test]
    fn from_closes_uses_consecutive_days() {
        let s = PriceSeries::from_closes(d(2024, 2, 28), &[1.0, 2.0, 3.0]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.first_date(), Some(d(2024, 2, 28)));
        assert_eq!(s.last_date(), Some(d(2024, 3, 1)));
        assert_eq!(s.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_series_is_allowed() {
        let s = PriceSeries::new(Vec::new()).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.first_date(), None);
    }
}

// =============================================================================
// Binance REST API Client — public daily klines
// =============================================================================
//
// Only the unsigned market-data endpoint is used. Daily candles are requested
// in pages of at most 1 000 and reduced to (date, close) pairs. There is no
// retry: one failed page fails the whole fetch.
// =============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, instrument, warn};

use crate::market_data::{PricePoint, PriceRequest, PriceSeries};

/// Maximum klines Binance returns per request.
const KLINE_PAGE_LIMIT: usize = 1000;

/// Binance REST API client for public market data.
#[derive(Clone)]
pub struct BinanceClient {
    base_url: String,
    client: reqwest::Client,
}

impl BinanceClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new() -> Result<Self> {
        Self::with_base_url("https://api.binance.com")
    }

    /// Point the client at a different host (e.g. `https://api.binance.us`).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, "BinanceClient initialised");

        Ok(Self { base_url, client })
    }

    // -------------------------------------------------------------------------
    // Public market data
    // -------------------------------------------------------------------------

    /// Fetch daily closes for `request.symbol` with `start <= date < end`.
    ///
    /// Pages through GET /api/v3/klines (interval `1d`) by advancing
    /// `startTime` past the last open time received.
    #[instrument(skip(self), name = "binance::get_daily_closes")]
    pub async fn get_daily_closes(&self, request: &PriceRequest) -> Result<PriceSeries> {
        let start_ms = date_to_millis(request.start);
        // endTime is inclusive on Binance; the request end is exclusive.
        let end_ms = date_to_millis(request.end) - 1;

        let mut points: Vec<PricePoint> = Vec::new();
        let mut cursor = start_ms;
        let mut pages = 0usize;

        while cursor <= end_ms {
            let page = self
                .get_kline_page(&request.symbol, cursor, end_ms)
                .await?;
            pages += 1;

            let Some(last_open) = page.last().map(|(open_time, _)| *open_time) else {
                break;
            };

            let page_len = page.len();
            points.extend(page.into_iter().map(|(_, point)| point));

            if page_len < KLINE_PAGE_LIMIT {
                break;
            }
            cursor = last_open + 1;
        }

        debug!(
            symbol = %request.symbol,
            pages,
            count = points.len(),
            "daily klines fetched"
        );

        PriceSeries::new(points).context("Binance returned an invalid price series")
    }

    /// One GET /api/v3/klines page. Returns `(open_time_ms, point)` pairs.
    async fn get_kline_page(
        &self,
        symbol: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<(i64, PricePoint)>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval=1d&startTime={}&endTime={}&limit={}",
            self.base_url, symbol, start_ms, end_ms, KLINE_PAGE_LIMIT
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /api/v3/klines request failed")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("failed to read klines response body")?;

        decode_kline_page(status, &text)
    }
}

/// Check the HTTP status before touching the body, so an HTML or plain-text
/// error page still reports its status code.
fn decode_kline_page(status: reqwest::StatusCode, text: &str) -> Result<Vec<(i64, PricePoint)>> {
    if !status.is_success() {
        let snippet: String = text.chars().take(200).collect();
        anyhow::bail!("Binance GET /api/v3/klines returned {}: {}", status, snippet);
    }

    let body: serde_json::Value =
        serde_json::from_str(text).context("failed to parse klines response")?;
    parse_klines(&body)
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Response parsing
// -----------------------------------------------------------------------------

/// Parse Binance's array-of-arrays kline response.
///
/// Array indices used:
///   [0] openTime (ms), [4] close
fn parse_klines(body: &serde_json::Value) -> Result<Vec<(i64, PricePoint)>> {
    let raw = body.as_array().context("klines response is not an array")?;

    let mut out = Vec::with_capacity(raw.len());

    for entry in raw {
        let arr = entry.as_array().context("kline entry is not an array")?;

        if arr.len() < 5 {
            warn!("skipping malformed kline entry with {} elements", arr.len());
            continue;
        }

        let open_time = arr[0].as_i64().context("kline openTime is not an integer")?;
        let close = parse_str_f64(&arr[4])?;
        let date = millis_to_date(open_time)
            .with_context(|| format!("kline openTime {open_time} out of range"))?;

        out.push((open_time, PricePoint { date, close }));
    }

    Ok(out)
}

/// Parse a JSON value that may be either a string or a number into `f64`.
fn parse_str_f64(val: &serde_json::Value) -> Result<f64> {
    if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else if let Some(n) = val.as_f64() {
        Ok(n)
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    }
}

fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis()
}

fn millis_to_date(ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Candle, Error, Interval, MarketData, Result};

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for the public Binance market-data endpoints. Only unsigned
/// endpoints are used; the advisor never places orders.
pub struct BinanceClient {
    http: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }

    async fn get(&self, path: &str, query: &str) -> Result<String> {
        let url = if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        };

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            // Invalid symbol/interval and rate limits land here with the
            // provider's error payload intact.
            return Err(Error::Market(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        lookback: usize,
    ) -> Result<Vec<Candle>> {
        let query = format!("symbol={symbol}&interval={interval}&limit={lookback}");
        debug!(symbol, %interval, lookback, "Fetching klines");
        let body = self.get("/api/v3/klines", &query).await?;

        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(&body)?;
        rows.iter().map(|row| parse_kline_row(row)).collect()
    }

    async fn current_price(&self, symbol: &str) -> Result<f64> {
        let body = self
            .get("/api/v3/ticker/price", &format!("symbol={symbol}"))
            .await?;
        let ticker: PriceTicker = serde_json::from_str(&body)?;
        ticker
            .price
            .parse::<f64>()
            .map_err(|e| Error::Market(e.to_string()))
    }

    async fn ping(&self) -> Result<()> {
        self.get("/api/v3/ping", "").await.map(|_| ())
    }
}

// ─── Kline parsing ────────────────────────────────────────────────────────────

/// One kline row is a heterogeneous JSON array:
/// [open_time, "open", "high", "low", "close", "volume", close_time, ...]
fn parse_kline_row(row: &[serde_json::Value]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(Error::Market(format!("short kline row: {} fields", row.len())));
    }

    let open_time_ms = row[0]
        .as_i64()
        .ok_or_else(|| Error::Market("kline open time is not an integer".into()))?;
    let timestamp: DateTime<Utc> = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .ok_or_else(|| Error::Market(format!("kline open time out of range: {open_time_ms}")))?;

    Ok(Candle {
        timestamp,
        open: kline_f64(&row[1], "open")?,
        high: kline_f64(&row[2], "high")?,
        low: kline_f64(&row[3], "low")?,
        close: kline_f64(&row[4], "close")?,
        volume: kline_f64(&row[5], "volume")?,
    })
}

fn kline_f64(value: &serde_json::Value, field: &str) -> Result<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| Error::Market(format!("kline {field} is not a decimal string")))
}

#[derive(Deserialize)]
struct PriceTicker {
    price: String,
}

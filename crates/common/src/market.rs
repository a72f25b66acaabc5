use async_trait::async_trait;

use crate::{Candle, Interval, Result};

/// Abstraction over the market-data provider.
///
/// `BinanceClient` in `crates/engine` implements this against the public
/// REST API. Tests substitute scripted implementations.
///
/// Implementations must return candles oldest-first and surface a
/// distinguishable error for unknown symbols/intervals or an unreachable
/// provider; callers treat any error as "skip this symbol for the cycle".
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch the most recent `lookback` candles for `symbol` at `interval`.
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        lookback: usize,
    ) -> Result<Vec<Candle>>;

    /// Latest traded price for `symbol`.
    async fn current_price(&self, symbol: &str) -> Result<f64>;

    /// Connectivity check used as a startup diagnostic.
    async fn ping(&self) -> Result<()>;
}

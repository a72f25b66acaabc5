//! ATR (Average True Range) volatility measure.
//!
//! True Range is the greatest of: high − low, |high − previous close|,
//! |low − previous close|. The average uses Wilder's smoothing, matching
//! RSI and the standard TA libraries.

use common::Candle;

/// ATR of the latest candle, or `None` with fewer than `period + 1` candles.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    atr_series(candles, period).last().copied().flatten()
}

/// ATR aligned to the input candles, `None` where the window is incomplete.
pub fn atr_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; candles.len()];
    if period == 0 || candles.len() < period + 1 {
        return out;
    }

    let true_ranges: Vec<f64> = candles
        .windows(2)
        .map(|w| true_range(&w[1], w[0].close))
        .collect();

    // First ATR is the simple average of the first `period` true ranges
    let mut atr = true_ranges.iter().take(period).sum::<f64>() / period as f64;
    out[period] = Some(atr);

    for (i, &tr) in true_ranges.iter().enumerate().skip(period) {
        atr = (atr * (period as f64 - 1.0) + tr) / period as f64;
        out[i + 1] = Some(atr);
    }

    out
}

fn true_range(candle: &Candle, prev_close: f64) -> f64 {
    (candle.high - candle.low)
        .max((candle.high - prev_close).abs())
        .max((candle.low - prev_close).abs())
}

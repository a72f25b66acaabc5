//! Exit analysis for open positions: reversal detection and realized P/L.

use common::{Candle, Position, Side};

/// Fractional move that counts as a reversal, for both the single-candle
/// and the swing checks.
pub const REVERSAL_THRESHOLD: f64 = 0.003;

/// Did the latest monitoring candle move against the position?
/// diff = (close − open) / open; a SELL reverses on an up candle, a BUY on
/// a down candle.
pub fn single_candle_reversal(side: Side, candle: &Candle) -> bool {
    if candle.open == 0.0 {
        return false;
    }
    let diff = (candle.close - candle.open) / candle.open;
    match side {
        Side::Sell => diff > REVERSAL_THRESHOLD,
        Side::Buy => diff < -REVERSAL_THRESHOLD,
    }
}

/// Has price pulled back from the recent extreme against the position?
/// BUY: distance below the rolling max high; SELL: distance above the
/// rolling min low.
pub fn swing_reversal(side: Side, close: f64, recent: &[Candle]) -> bool {
    match side {
        Side::Buy => {
            let max_high = recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            max_high > 0.0 && (max_high - close) / max_high >= REVERSAL_THRESHOLD
        }
        Side::Sell => {
            let min_low = recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            min_low.is_finite() && min_low > 0.0 && (close - min_low) / min_low >= REVERSAL_THRESHOLD
        }
    }
}

/// Either check alone is sufficient.
pub fn detect_reversal(side: Side, last: &Candle, recent: &[Candle]) -> bool {
    single_candle_reversal(side, last) || swing_reversal(side, last.close, recent)
}

/// Fractional return of a position at `close`.
pub fn position_return(side: Side, entry: f64, close: f64) -> f64 {
    if entry == 0.0 {
        return 0.0;
    }
    match side {
        Side::Buy => (close - entry) / entry,
        Side::Sell => (entry - close) / entry,
    }
}

/// Realized profit/loss when closing `position` at `close`:
/// stake × return × leverage, with leverage 0/1 meaning unleveraged.
pub fn realized_pnl(position: &Position, close: f64) -> f64 {
    let pct = position_return(position.side, position.entry, close);
    position.stake * pct * position.effective_leverage()
}

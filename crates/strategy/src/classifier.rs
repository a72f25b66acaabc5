//! The voting classifier: six mirrored conditions per side, three
//! confirmations required.

use common::{Candle, Side};

use crate::indicators::Snapshot;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const VOLUME_SPIKE_RATIO: f64 = 1.5;
pub const RESISTANCE_RATIO: f64 = 0.98;
pub const ATR_RATIO_THRESHOLD: f64 = 0.01;
pub const REQUIRED_CONFIRMATIONS: usize = 3;

/// Per-side condition counts for the latest candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Votes {
    pub buy: usize,
    pub sell: usize,
}

/// Count the six conditions per side. A condition whose indicator is
/// undefined is false for both sides. The volume-spike and volatility
/// conditions are direction-agnostic and count toward both tallies.
pub fn tally(latest: &Candle, snap: &Snapshot) -> Votes {
    let close = latest.close;

    let rsi_buy = snap.rsi_14.is_some_and(|r| r < RSI_OVERSOLD);
    let rsi_sell = snap.rsi_14.is_some_and(|r| r > RSI_OVERBOUGHT);

    let sma50_buy = snap.sma_50.is_some_and(|s| close > s);
    let sma50_sell = snap.sma_50.is_some_and(|s| close < s);
    let sma200_buy = snap.sma_200.is_some_and(|s| close > s);
    let sma200_sell = snap.sma_200.is_some_and(|s| close < s);

    let volume_spike = snap
        .mean_volume_20
        .is_some_and(|avg| latest.volume > VOLUME_SPIKE_RATIO * avg);

    let resistance_buy = snap
        .max_close_20
        .is_some_and(|max| close < RESISTANCE_RATIO * max);
    let resistance_sell = snap
        .max_close_20
        .is_some_and(|max| close > RESISTANCE_RATIO * max);

    let volatile = snap
        .atr_14
        .is_some_and(|atr| close > 0.0 && atr / close > ATR_RATIO_THRESHOLD);

    let buy = [rsi_buy, sma50_buy, sma200_buy, volume_spike, resistance_buy, volatile]
        .iter()
        .filter(|&&c| c)
        .count();
    let sell = [rsi_sell, sma50_sell, sma200_sell, volume_spike, resistance_sell, volatile]
        .iter()
        .filter(|&&c| c)
        .count();

    Votes { buy, sell }
}

/// Classify the latest candle. BUY is checked first, so it wins when the
/// shared conditions push both tallies past the threshold.
pub fn classify(latest: &Candle, snap: &Snapshot) -> Option<Side> {
    let votes = tally(latest, snap);
    if votes.buy >= REQUIRED_CONFIRMATIONS {
        Some(Side::Buy)
    } else if votes.sell >= REQUIRED_CONFIRMATIONS {
        Some(Side::Sell)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn candle(close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: Utc::now(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    /// A full-house entry: every BUY condition holds at once.
    #[test]
    fn all_six_buy_conditions_produce_buy() {
        let latest = candle(110.0, 200.0);
        let snap = Snapshot {
            rsi_14: Some(25.0),
            sma_50: Some(100.0),
            sma_200: Some(95.0),
            mean_volume_20: Some(100.0),          // 200 > 1.5 × 100
            max_close_20: Some(110.0 / 0.95),     // close = 0.95 × max
            atr_14: Some(110.0 * 0.015),          // ATR/close = 1.5%
        };
        let votes = tally(&latest, &snap);
        assert_eq!(votes.buy, 6);
        // Volume spike and volatility also count for the sell side
        assert_eq!(votes.sell, 2);
        assert_eq!(classify(&latest, &snap), Some(Side::Buy));
    }

    #[test]
    fn buy_wins_when_both_sides_reach_threshold() {
        // Shared conditions (volume, volatility) plus one directional vote
        // each puts both tallies at 3; BUY is checked first.
        let latest = candle(100.0, 200.0);
        let snap = Snapshot {
            rsi_14: None,
            sma_50: Some(99.0),              // buy vote
            sma_200: Some(101.0),            // sell vote
            mean_volume_20: Some(100.0),     // shared
            max_close_20: Some(100.5),       // close > 0.98 × max → sell vote
            atr_14: Some(2.0),               // shared
        };
        let votes = tally(&latest, &snap);
        assert!(votes.buy >= 3 || votes.sell >= 3);
        if votes.buy >= 3 && votes.sell >= 3 {
            assert_eq!(classify(&latest, &snap), Some(Side::Buy));
        }
    }

    #[test]
    fn tie_break_prefers_buy() {
        // Construct an exact 3/3 tie
        let latest = candle(100.0, 200.0);
        let snap = Snapshot {
            rsi_14: None,
            sma_50: Some(99.0),          // buy
            sma_200: Some(100.0),        // neither (equal)
            mean_volume_20: Some(100.0), // both
            max_close_20: Some(101.0),   // close > 98.98 → sell
            atr_14: Some(2.0),           // both
        };
        let votes = tally(&latest, &snap);
        assert_eq!(votes, Votes { buy: 3, sell: 3 });
        assert_eq!(classify(&latest, &snap), Some(Side::Buy));
    }

    #[test]
    fn undefined_indicators_cast_no_votes() {
        let latest = candle(100.0, 100.0);
        let snap = Snapshot::default();
        assert_eq!(tally(&latest, &snap), Votes { buy: 0, sell: 0 });
        assert_eq!(classify(&latest, &snap), None);
    }

    #[test]
    fn classifier_is_deterministic() {
        let latest = candle(110.0, 200.0);
        let snap = Snapshot {
            rsi_14: Some(25.0),
            sma_50: Some(100.0),
            sma_200: Some(95.0),
            mean_volume_20: Some(100.0),
            max_close_20: Some(120.0),
            atr_14: Some(2.0),
        };
        let first = classify(&latest, &snap);
        for _ in 0..10 {
            assert_eq!(classify(&latest, &snap), first);
        }
    }

    proptest! {
        /// Arbitrary finite inputs never panic and never yield SELL while
        /// the BUY tally is at threshold.
        #[test]
        fn classify_never_panics(
            close in 0.0001f64..1_000_000.0,
            volume in 0.0f64..1_000_000.0,
            rsi in proptest::option::of(0.0f64..100.0),
            sma50 in proptest::option::of(0.0001f64..1_000_000.0),
            sma200 in proptest::option::of(0.0001f64..1_000_000.0),
            mean_vol in proptest::option::of(0.0f64..1_000_000.0),
            max_close in proptest::option::of(0.0001f64..1_000_000.0),
            atr in proptest::option::of(0.0f64..10_000.0),
        ) {
            let latest = candle(close, volume);
            let snap = Snapshot {
                rsi_14: rsi,
                sma_50: sma50,
                sma_200: sma200,
                mean_volume_20: mean_vol,
                max_close_20: max_close,
                atr_14: atr,
            };
            let votes = tally(&latest, &snap);
            prop_assert!(votes.buy <= 6 && votes.sell <= 6);
            if votes.buy >= REQUIRED_CONFIRMATIONS {
                prop_assert_eq!(classify(&latest, &snap), Some(Side::Buy));
            }
        }
    }
}

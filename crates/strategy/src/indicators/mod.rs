pub mod atr;
pub mod rolling;
pub mod rsi;
pub mod sma;

use common::Candle;

pub const SMA_FAST_WINDOW: usize = 50;
pub const SMA_SLOW_WINDOW: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const ROLLING_WINDOW: usize = 20;

/// All indicator series derived from one candle sequence, aligned
/// index-for-index with the input. Recomputed each cycle, never persisted.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub sma_50: Vec<Option<f64>>,
    pub sma_200: Vec<Option<f64>>,
    pub rsi_14: Vec<Option<f64>>,
    pub atr_14: Vec<Option<f64>>,
    pub mean_volume_20: Vec<Option<f64>>,
    pub max_close_20: Vec<Option<f64>>,
}

/// Indicator values at the newest candle. Undefined entries mean the window
/// was incomplete; the classifier treats them as failed conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi_14: Option<f64>,
    pub atr_14: Option<f64>,
    pub mean_volume_20: Option<f64>,
    pub max_close_20: Option<f64>,
}

impl IndicatorSet {
    /// Compute every series for a chronologically ordered candle sequence.
    /// Pure; short inputs simply leave more leading entries undefined.
    pub fn compute(candles: &[Candle]) -> IndicatorSet {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        IndicatorSet {
            sma_50: sma::sma_series(&closes, SMA_FAST_WINDOW),
            sma_200: sma::sma_series(&closes, SMA_SLOW_WINDOW),
            rsi_14: rsi::rsi_series(&closes, RSI_PERIOD),
            atr_14: atr::atr_series(candles, ATR_PERIOD),
            mean_volume_20: rolling::rolling_mean(&volumes, ROLLING_WINDOW),
            max_close_20: rolling::rolling_max(&closes, ROLLING_WINDOW),
        }
    }

    /// Values at the most recent candle.
    pub fn latest(&self) -> Snapshot {
        Snapshot {
            sma_50: last(&self.sma_50),
            sma_200: last(&self.sma_200),
            rsi_14: last(&self.rsi_14),
            atr_14: last(&self.atr_14),
            mean_volume_20: last(&self.mean_volume_20),
            max_close_20: last(&self.max_close_20),
        }
    }
}

fn last(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn flat_candles(n: usize, close: f64) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                timestamp: Utc::now() + chrono::Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn constant_closes_make_both_smas_equal_close() {
        let set = IndicatorSet::compute(&flat_candles(250, 42.0));
        let snap = set.latest();
        assert_eq!(snap.sma_50, Some(42.0));
        assert_eq!(snap.sma_200, Some(42.0));
        // Flat series: momentum undefined rather than a crash
        assert_eq!(snap.rsi_14, None);
    }

    #[test]
    fn short_history_degrades_to_undefined() {
        let set = IndicatorSet::compute(&flat_candles(60, 10.0));
        let snap = set.latest();
        assert!(snap.sma_50.is_some());
        assert!(snap.sma_200.is_none());
        assert!(snap.mean_volume_20.is_some());
    }

    #[test]
    fn every_series_aligns_with_candles() {
        let candles = flat_candles(75, 10.0);
        let set = IndicatorSet::compute(&candles);
        for series in [
            &set.sma_50,
            &set.sma_200,
            &set.rsi_14,
            &set.atr_14,
            &set.mean_volume_20,
            &set.max_close_20,
        ] {
            assert_eq!(series.len(), candles.len());
        }
    }

    #[test]
    fn empty_input_yields_empty_series() {
        let set = IndicatorSet::compute(&[]);
        assert!(set.sma_50.is_empty());
        assert_eq!(set.latest(), Snapshot::default());
    }
}

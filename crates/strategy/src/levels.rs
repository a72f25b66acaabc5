use common::Side;

/// Stop-loss and take-profit levels for an entry price.
///
/// Percentages are whole percents (2.0 = 2%). BUY places the stop below and
/// the target above the entry; SELL mirrors both.
pub fn entry_levels(side: Side, entry: f64, stop_loss_pct: f64, take_profit_pct: f64) -> (f64, f64) {
    match side {
        Side::Buy => (
            entry * (1.0 - stop_loss_pct / 100.0),
            entry * (1.0 + take_profit_pct / 100.0),
        ),
        Side::Sell => (
            entry * (1.0 + stop_loss_pct / 100.0),
            entry * (1.0 - take_profit_pct / 100.0),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_levels_at_default_percents() {
        let (sl, tp) = entry_levels(Side::Buy, 110.0, 2.0, 6.0);
        assert!((sl - 107.8).abs() < 1e-9);
        assert!((tp - 116.6).abs() < 1e-9);
    }

    #[test]
    fn sell_levels_mirror_buy() {
        let (sl, tp) = entry_levels(Side::Sell, 100.0, 2.0, 6.0);
        assert!((sl - 102.0).abs() < 1e-9);
        assert!((tp - 94.0).abs() < 1e-9);
    }
}

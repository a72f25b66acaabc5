//! Turning cycle outcomes into chat text. Pure string construction.

use common::Side;

/// What the cycle concluded for one (account, symbol).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Entry analysis found a signal worth declaring a position for.
    Entry {
        symbol: String,
        side: Side,
        entry: f64,
        stop_loss: f64,
        take_profit: f64,
    },
    /// An open position hit a reversal and was closed.
    Closed {
        symbol: String,
        pnl: f64,
        balance: f64,
    },
    /// An open position showed no reversal.
    Stable { symbol: String },
    /// No entry opportunity on this symbol.
    NoEntry { symbol: String },
    /// Market data was unavailable; the symbol sat this cycle out.
    Skipped { symbol: String },
}

impl Outcome {
    /// Quiet outcomes collapse into the neutral aggregate message.
    pub fn is_quiet(&self) -> bool {
        matches!(
            self,
            Outcome::Stable { .. } | Outcome::NoEntry { .. } | Outcome::Skipped { .. }
        )
    }
}

/// Sent when a whole cycle produced nothing actionable.
pub const NEUTRAL_PLACEHOLDER: &str = "No good trade entries right now 😊";

/// Render one outcome. `Skipped` renders nothing — failures are logged,
/// not broadcast.
pub fn render(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Entry {
            symbol,
            side,
            entry,
            stop_loss,
            take_profit,
        } => Some(format!(
            "Entry: {symbol} – {side} signal.\nEntry price: {entry:.2}, SL: {stop_loss:.2}, TP: {take_profit:.2}."
        )),
        Outcome::Closed { symbol, pnl, balance } => Some(format!(
            "Position on {symbol} closed. Profit/loss: {pnl:+.2} USDT. New balance: {balance:.2} USDT."
        )),
        Outcome::Stable { symbol } => Some(format!("Position on {symbol} is stable.")),
        Outcome::NoEntry { symbol } => Some(format!("No good entry on {symbol}.")),
        Outcome::Skipped { .. } => None,
    }
}

/// One message per account per cycle. All-quiet cycles collapse to the
/// neutral placeholder instead of per-symbol noise; a cycle where every
/// symbol was skipped sends nothing at all.
pub fn aggregate(outcomes: &[Outcome], include_stable: bool) -> Option<String> {
    if outcomes
        .iter()
        .all(|o| matches!(o, Outcome::Skipped { .. }))
    {
        return None;
    }

    if outcomes.iter().all(Outcome::is_quiet) {
        return Some(NEUTRAL_PLACEHOLDER.to_string());
    }

    let lines: Vec<String> = outcomes
        .iter()
        .filter(|o| include_stable || !matches!(o, Outcome::Stable { .. }))
        .filter_map(render)
        .collect();

    Some(lines.join("\n"))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram chat id. Every account is keyed by the chat it talks through.
pub type AccountId = i64;

/// One OHLCV sample for a fixed time bucket, oldest-first in every sequence
/// this crate hands around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle interval understood by the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    OneMinute,
    FifteenMinutes,
    OneHour,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of a signal or a declared position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parse a user-entered side token ("BUY"/"SELL", any case).
    pub fn parse(text: &str) -> Option<Side> {
        match text.trim().to_uppercase().as_str() {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Which interval is used to monitor open positions for exit.
/// Entry analysis always runs on the 1-minute interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    #[default]
    Long,
    Scalp,
}

impl TradingMode {
    pub fn monitor_interval(&self) -> Interval {
        match self {
            TradingMode::Long => Interval::OneHour,
            TradingMode::Scalp => Interval::FifteenMinutes,
        }
    }

    pub fn parse(text: &str) -> Option<TradingMode> {
        match text.trim().to_lowercase().as_str() {
            "long" => Some(TradingMode::Long),
            "scalp" => Some(TradingMode::Scalp),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Long => write!(f, "long"),
            TradingMode::Scalp => write!(f, "scalp"),
        }
    }
}

/// Leverage values a user may declare. 0 means unleveraged.
pub const ALLOWED_LEVERAGES: [f64; 5] = [0.0, 2.0, 3.0, 5.0, 10.0];

/// A user-declared position. Not exchange-verified; the advisor only tracks
/// it and advises on exits. At most one open position per (account, coin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub coin: String,
    pub side: Side,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    #[serde(default)]
    pub leverage: f64,
    #[serde(default)]
    pub stake: f64,
}

impl Position {
    /// Leverage multiplier applied to realized P/L. 0 and 1 both mean
    /// unleveraged notional.
    pub fn effective_leverage(&self) -> f64 {
        if self.leverage <= 1.0 {
            1.0
        } else {
            self.leverage
        }
    }
}

/// What produced a realized trade record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Profit,
    Loss,
    AutoClose,
}

/// Manual trade entry declared through the chat flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualTradeKind {
    Profit,
    Loss,
}

impl From<ManualTradeKind> for TradeKind {
    fn from(kind: ManualTradeKind) -> Self {
        match kind {
            ManualTradeKind::Profit => TradeKind::Profit,
            ManualTradeKind::Loss => TradeKind::Loss,
        }
    }
}

/// One realized trade applied to the balance, kept in an append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub kind: TradeKind,
    /// Signed amount for auto-closes, absolute amount for manual entries.
    pub amount: f64,
    #[serde(default)]
    pub symbol: Option<String>,
    pub time: DateTime<Utc>,
}

impl TradeRecord {
    pub fn manual(kind: ManualTradeKind, amount: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            amount,
            symbol: None,
            time: Utc::now(),
        }
    }

    pub fn auto_close(symbol: impl Into<String>, pnl: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: TradeKind::AutoClose,
            amount: pnl,
            symbol: Some(symbol.into()),
            time: Utc::now(),
        }
    }
}

impl std::fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TradeKind::Profit => write!(f, "PROFIT: {:.2} USDT", self.amount),
            TradeKind::Loss => write!(f, "LOSS: {:.2} USDT", self.amount),
            TradeKind::AutoClose => write!(
                f,
                "CLOSE {}: {:+.2} USDT",
                self.symbol.as_deref().unwrap_or("?"),
                self.amount
            ),
        }
    }
}

/// One classifier outcome worth remembering, kept in an append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub time: DateTime<Utc>,
}

impl std::fmt::Display for SignalRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} @ {:.2}",
            self.time.format("%Y-%m-%d %H:%M"),
            self.symbol,
            self.side,
            self.price
        )
    }
}

/// Pending multi-step input, persisted alongside the account so a restart
/// (or a second instance) picks up where the conversation left off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InputState {
    #[default]
    Idle,
    AwaitingBalance,
    AwaitingTradeAmount {
        kind: ManualTradeKind,
    },
    AwaitingDeleteIndex,
    AwaitingPositionCoin,
    AwaitingPositionSide {
        coin: String,
    },
    AwaitingPositionLeverage {
        coin: String,
        side: Side,
    },
    AwaitingPositionStake {
        coin: String,
        side: Side,
        leverage: f64,
    },
    AwaitingPositionEntry {
        coin: String,
        side: Side,
        leverage: f64,
        stake: f64,
    },
}

/// Everything persisted for one chat. Every field defaults so partial or
/// older records still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Account {
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub trading_mode: TradingMode,
    #[serde(default)]
    pub signals_enabled: bool,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
    #[serde(default)]
    pub signals: Vec<SignalRecord>,
    #[serde(default)]
    pub input_state: InputState,
}

impl Account {
    pub fn position_for(&self, coin: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.coin.eq_ignore_ascii_case(coin))
    }
}

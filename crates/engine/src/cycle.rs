//! The advisory cycle: per account and symbol, either look for an entry or
//! monitor the declared position for an exit, then send one message.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use common::{
    AccountId, AdvisorConfig, Interval, MarketData, Notifier, Position, Result, SignalRecord,
    TradeRecord,
};
use store::AccountStore;
use strategy::indicators::IndicatorSet;
use strategy::{classify, entry_levels};

use crate::format::{aggregate, Outcome};
use crate::monitor;

/// Candles fetched for the single-candle exit check.
const EXIT_LOOKBACK: usize = 2;
/// Candles fetched for the swing exit check.
const SWING_LOOKBACK: usize = 6;

/// Drives the whole advisory flow on a fixed timer.
///
/// Positions are opened only through the chat command flow; entry analysis
/// here notifies and records the signal, nothing more.
pub struct Advisor {
    market: Arc<dyn MarketData>,
    store: AccountStore,
    notifier: Arc<dyn Notifier>,
    cfg: AdvisorConfig,
}

impl Advisor {
    pub fn new(
        market: Arc<dyn MarketData>,
        store: AccountStore,
        notifier: Arc<dyn Notifier>,
        cfg: AdvisorConfig,
    ) -> Self {
        Self {
            market,
            store,
            notifier,
            cfg,
        }
    }

    /// Run cycles forever. Nothing that happens inside a cycle is allowed
    /// to break the loop. Call from `tokio::spawn`.
    pub async fn run(self) {
        info!(
            cycle_secs = self.cfg.cycle_secs,
            symbols = ?self.cfg.symbols,
            "Advisor loop starting"
        );
        let mut tick = tokio::time::interval(Duration::from_secs(self.cfg.cycle_secs));
        loop {
            tick.tick().await;
            self.run_cycle().await;
        }
    }

    /// One full pass over every enabled account and configured symbol.
    pub async fn run_cycle(&self) {
        let accounts = self.store.enabled_accounts().await;
        debug!(accounts = accounts.len(), "Cycle starting");

        for chat in accounts {
            let mut outcomes = Vec::with_capacity(self.cfg.symbols.len());
            for symbol in &self.cfg.symbols {
                outcomes.push(self.analyze_symbol(chat, symbol).await);
            }

            if let Some(text) = aggregate(&outcomes, self.cfg.notify_stable) {
                if let Err(e) = self.notifier.send(chat, &text).await {
                    warn!(chat, error = %e, "Failed to deliver cycle message");
                }
            }
        }
    }

    /// Entry or exit analysis for one symbol, depending on whether the
    /// account declared a position on it. Provider failures skip the symbol
    /// for this cycle.
    async fn analyze_symbol(&self, chat: AccountId, symbol: &str) -> Outcome {
        let account = self.store.account(chat).await;
        let result = match account.position_for(symbol) {
            Some(position) => {
                let interval = account.trading_mode.monitor_interval();
                self.monitor_position(chat, symbol, position.clone(), interval)
                    .await
            }
            None => self.entry_analysis(chat, symbol).await,
        };

        result.unwrap_or_else(|e| {
            warn!(chat, symbol, error = %e, "Symbol skipped this cycle");
            Outcome::Skipped {
                symbol: symbol.to_string(),
            }
        })
    }

    /// Exit analysis on the account's monitoring interval. On a reversal the
    /// balance, position list and trade log all change in one store update.
    async fn monitor_position(
        &self,
        chat: AccountId,
        symbol: &str,
        position: Position,
        interval: Interval,
    ) -> Result<Outcome> {
        let latest = self
            .market
            .fetch_candles(symbol, interval, EXIT_LOOKBACK)
            .await?;
        let last = latest
            .last()
            .ok_or_else(|| common::Error::Market(format!("no candles returned for {symbol}")))?;
        let recent = self
            .market
            .fetch_candles(symbol, interval, SWING_LOOKBACK)
            .await?;

        if !monitor::detect_reversal(position.side, last, &recent) {
            return Ok(Outcome::Stable {
                symbol: symbol.to_string(),
            });
        }

        let close = last.close;
        let pnl = monitor::realized_pnl(&position, close);
        let balance = self
            .store
            .update(chat, |account| {
                // Deleted by a concurrent command? Closing an absent
                // position is a no-op.
                if account.position_for(symbol).is_none() {
                    return None;
                }
                account.balance += pnl;
                account
                    .positions
                    .retain(|p| !p.coin.eq_ignore_ascii_case(symbol));
                account.trades.push(TradeRecord::auto_close(symbol, pnl));
                Some(account.balance)
            })
            .await?;

        let Some(balance) = balance else {
            return Ok(Outcome::Stable {
                symbol: symbol.to_string(),
            });
        };

        info!(chat, symbol, pnl, balance, "Position closed on reversal");
        Ok(Outcome::Closed {
            symbol: symbol.to_string(),
            pnl,
            balance,
        })
    }

    /// Entry analysis on 1-minute candles: indicators, then the voting
    /// classifier. A signal is logged and announced but opens nothing.
    async fn entry_analysis(&self, chat: AccountId, symbol: &str) -> Result<Outcome> {
        let candles = self
            .market
            .fetch_candles(symbol, Interval::OneMinute, self.cfg.entry_lookback)
            .await?;
        let last = match candles.last() {
            Some(last) => last,
            None => {
                return Err(common::Error::Market(format!(
                    "no candles returned for {symbol}"
                )))
            }
        };

        let snapshot = IndicatorSet::compute(&candles).latest();
        let side = match classify(last, &snapshot) {
            Some(side) => side,
            None => {
                return Ok(Outcome::NoEntry {
                    symbol: symbol.to_string(),
                })
            }
        };

        let entry = last.close;
        let (stop_loss, take_profit) =
            entry_levels(side, entry, self.cfg.stop_loss_pct, self.cfg.take_profit_pct);

        self.store
            .update(chat, |account| {
                account.signals.push(SignalRecord {
                    symbol: symbol.to_string(),
                    side,
                    price: entry,
                    time: Utc::now(),
                });
            })
            .await?;

        info!(chat, symbol, %side, entry, "Entry signal");
        Ok(Outcome::Entry {
            symbol: symbol.to_string(),
            side,
            entry,
            stop_loss,
            take_profit,
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

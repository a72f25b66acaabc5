//! The free-text side of the command surface: an explicit finite-state
//! machine per account, persisted with the account so a restart keeps the
//! conversation where it was.
//!
//! Whether bad input preserves or resets the pending state follows the
//! original flows: amounts, indexes, sides, leverage and stake re-prompt in
//! place; an unparsable entry price abandons the whole position flow.

use common::{
    Account, AdvisorConfig, InputState, ManualTradeKind, Position, Side, TradeRecord,
    ALLOWED_LEVERAGES,
};
use strategy::entry_levels;

/// Advance the account's input FSM with one free-text message.
/// Returns the reply to send, or `None` when no input is pending.
/// Must run inside a single store update so the transition is atomic.
pub fn apply(account: &mut Account, text: &str, cfg: &AdvisorConfig) -> Option<String> {
    let state = std::mem::take(&mut account.input_state);
    let (next, reply) = transition(account, state, text.trim(), cfg);
    account.input_state = next;
    reply
}

fn transition(
    account: &mut Account,
    state: InputState,
    text: &str,
    cfg: &AdvisorConfig,
) -> (InputState, Option<String>) {
    match state {
        InputState::Idle => (InputState::Idle, None),

        InputState::AwaitingBalance => match parse_amount(text) {
            Some(amount) => {
                account.balance = amount;
                (
                    InputState::Idle,
                    Some(format!("✅ Balance set: {amount:.2} USDT")),
                )
            }
            None => (
                InputState::AwaitingBalance,
                Some("⚠️ Enter a valid amount!".to_string()),
            ),
        },

        InputState::AwaitingTradeAmount { kind } => match parse_amount(text) {
            Some(amount) => {
                let (label, delta) = match kind {
                    ManualTradeKind::Profit => ("PROFIT", amount),
                    ManualTradeKind::Loss => ("LOSS", -amount),
                };
                account.balance += delta;
                account.trades.push(TradeRecord::manual(kind, amount));
                (
                    InputState::Idle,
                    Some(format!(
                        "✅ Trade recorded: {label} {amount:.2} USDT\nNew balance: {:.2} USDT",
                        account.balance
                    )),
                )
            }
            None => (
                InputState::AwaitingTradeAmount { kind },
                Some("⚠️ Enter a valid amount!".to_string()),
            ),
        },

        InputState::AwaitingDeleteIndex => match text.parse::<usize>() {
            Err(_) => (
                InputState::AwaitingDeleteIndex,
                Some("⚠️ Enter a valid position number!".to_string()),
            ),
            Ok(index) if index < 1 || index > account.positions.len() => (
                InputState::Idle,
                Some("⚠️ No position with that number!".to_string()),
            ),
            Ok(index) => {
                let removed = account.positions.remove(index - 1);
                (
                    InputState::Idle,
                    Some(format!(
                        "✅ Position {} {} at {:.2} deleted.",
                        removed.coin, removed.side, removed.entry
                    )),
                )
            }
        },

        InputState::AwaitingPositionCoin => {
            let coin = text.to_uppercase();
            if account.position_for(&coin).is_some() {
                (
                    InputState::Idle,
                    Some(format!("You already have an open position on {coin}.")),
                )
            } else {
                (
                    InputState::AwaitingPositionSide { coin },
                    Some("Enter the direction (BUY or SELL):".to_string()),
                )
            }
        }

        InputState::AwaitingPositionSide { coin } => match Side::parse(text) {
            Some(side) => (
                InputState::AwaitingPositionLeverage { coin, side },
                Some("Enter the leverage (0 for none, or 2, 3, 5, 10):".to_string()),
            ),
            None => (
                InputState::AwaitingPositionSide { coin },
                Some("⚠️ Enter BUY or SELL!".to_string()),
            ),
        },

        InputState::AwaitingPositionLeverage { coin, side } => match text.parse::<f64>() {
            Err(_) => (
                InputState::AwaitingPositionLeverage { coin, side },
                Some("⚠️ Enter a valid number for the leverage!".to_string()),
            ),
            Ok(leverage) if !ALLOWED_LEVERAGES.contains(&leverage) => (
                InputState::AwaitingPositionLeverage { coin, side },
                Some("⚠️ Enter a valid leverage (0, 2, 3, 5, 10):".to_string()),
            ),
            Ok(leverage) => (
                InputState::AwaitingPositionStake {
                    coin,
                    side,
                    leverage,
                },
                Some("Enter the stake in USDT (0 if none):".to_string()),
            ),
        },

        InputState::AwaitingPositionStake {
            coin,
            side,
            leverage,
        } => match parse_amount(text) {
            Some(stake) => (
                InputState::AwaitingPositionEntry {
                    coin,
                    side,
                    leverage,
                    stake,
                },
                Some("Enter the entry price (for example: 100):".to_string()),
            ),
            None => (
                InputState::AwaitingPositionStake {
                    coin,
                    side,
                    leverage,
                },
                Some("⚠️ Enter a valid stake amount!".to_string()),
            ),
        },

        InputState::AwaitingPositionEntry {
            coin,
            side,
            leverage,
            stake,
        } => match text.parse::<f64>() {
            Err(_) => (
                InputState::Idle,
                Some("⚠️ Enter a valid entry price!".to_string()),
            ),
            Ok(entry) if !entry.is_finite() || entry <= 0.0 => (
                InputState::Idle,
                Some("⚠️ Enter a valid entry price!".to_string()),
            ),
            Ok(entry) => {
                // Re-check: a position may have been declared on this coin
                // while the flow was pending.
                if account.position_for(&coin).is_some() {
                    return (
                        InputState::Idle,
                        Some(format!("You already have an open position on {coin}.")),
                    );
                }
                let (stop_loss, take_profit) =
                    entry_levels(side, entry, cfg.stop_loss_pct, cfg.take_profit_pct);
                account.positions.push(Position {
                    coin: coin.clone(),
                    side,
                    entry,
                    stop_loss,
                    take_profit,
                    leverage,
                    stake,
                });
                (
                    InputState::Idle,
                    Some(format!(
                        "✅ Position added:\nCoin: {coin}\nDirection: {side}\nEntry price: {entry:.2}\n\
                         Leverage: {leverage}x\nStake: {stake:.2} USDT\nStop-loss: {stop_loss:.2}\nTake-profit: {take_profit:.2}"
                    )),
                )
            }
        },
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TradeKind;

    fn cfg() -> AdvisorConfig {
        AdvisorConfig::default()
    }

    fn account_in(state: InputState) -> Account {
        Account {
            input_state: state,
            ..Account::default()
        }
    }

    #[test]
    fn idle_ignores_free_text() {
        let mut account = account_in(InputState::Idle);
        assert_eq!(apply(&mut account, "hello", &cfg()), None);
        assert_eq!(account.input_state, InputState::Idle);
    }

    #[test]
    fn balance_is_set_from_valid_input() {
        let mut account = account_in(InputState::AwaitingBalance);
        let reply = apply(&mut account, "250.5", &cfg()).unwrap();
        assert!(reply.contains("250.50"));
        assert_eq!(account.balance, 250.5);
        assert_eq!(account.input_state, InputState::Idle);
    }

    #[test]
    fn invalid_balance_preserves_the_prompt() {
        let mut account = account_in(InputState::AwaitingBalance);
        let reply = apply(&mut account, "lots", &cfg()).unwrap();
        assert!(reply.starts_with("⚠️"));
        assert_eq!(account.input_state, InputState::AwaitingBalance);
        assert_eq!(account.balance, 0.0);
    }

    #[test]
    fn profit_and_loss_move_the_balance() {
        let mut account = account_in(InputState::AwaitingTradeAmount {
            kind: ManualTradeKind::Profit,
        });
        account.balance = 100.0;
        apply(&mut account, "50", &cfg()).unwrap();
        assert_eq!(account.balance, 150.0);
        assert_eq!(account.trades.len(), 1);
        assert_eq!(account.trades[0].kind, TradeKind::Profit);

        account.input_state = InputState::AwaitingTradeAmount {
            kind: ManualTradeKind::Loss,
        };
        apply(&mut account, "30", &cfg()).unwrap();
        assert_eq!(account.balance, 120.0);
        assert_eq!(account.trades[1].kind, TradeKind::Loss);
    }

    #[test]
    fn invalid_trade_amount_preserves_the_state() {
        let mut account = account_in(InputState::AwaitingTradeAmount {
            kind: ManualTradeKind::Loss,
        });
        apply(&mut account, "-5", &cfg()).unwrap();
        assert_eq!(
            account.input_state,
            InputState::AwaitingTradeAmount {
                kind: ManualTradeKind::Loss
            }
        );
    }

    fn walk_add_position(account: &mut Account) -> String {
        account.input_state = InputState::AwaitingPositionCoin;
        apply(account, "btcusdt", &cfg()).unwrap();
        apply(account, "buy", &cfg()).unwrap();
        apply(account, "5", &cfg()).unwrap();
        apply(account, "50", &cfg()).unwrap();
        apply(account, "110", &cfg()).unwrap()
    }

    #[test]
    fn full_add_position_walk() {
        let mut account = Account::default();
        let reply = walk_add_position(&mut account);

        assert!(reply.contains("✅ Position added"));
        assert_eq!(account.input_state, InputState::Idle);
        assert_eq!(account.positions.len(), 1);

        let pos = &account.positions[0];
        assert_eq!(pos.coin, "BTCUSDT");
        assert_eq!(pos.side, Side::Buy);
        assert_eq!(pos.entry, 110.0);
        assert_eq!(pos.leverage, 5.0);
        assert_eq!(pos.stake, 50.0);
        // Default 2% / 6% levels
        assert!((pos.stop_loss - 107.8).abs() < 1e-9);
        assert!((pos.take_profit - 116.6).abs() < 1e-9);
    }

    #[test]
    fn duplicate_coin_aborts_the_flow() {
        let mut account = Account::default();
        walk_add_position(&mut account);

        account.input_state = InputState::AwaitingPositionCoin;
        let reply = apply(&mut account, "BTCUSDT", &cfg()).unwrap();
        assert!(reply.contains("already have an open position"));
        assert_eq!(account.input_state, InputState::Idle);
        assert_eq!(account.positions.len(), 1);
    }

    #[test]
    fn invalid_side_preserves_the_step() {
        let mut account = account_in(InputState::AwaitingPositionSide {
            coin: "BTCUSDT".into(),
        });
        let reply = apply(&mut account, "HOLD", &cfg()).unwrap();
        assert!(reply.contains("BUY or SELL"));
        assert_eq!(
            account.input_state,
            InputState::AwaitingPositionSide {
                coin: "BTCUSDT".into()
            }
        );
    }

    #[test]
    fn unsupported_leverage_preserves_the_step() {
        let mut account = account_in(InputState::AwaitingPositionLeverage {
            coin: "BTCUSDT".into(),
            side: Side::Sell,
        });
        let reply = apply(&mut account, "4", &cfg()).unwrap();
        assert!(reply.contains("0, 2, 3, 5, 10"));
        assert!(matches!(
            account.input_state,
            InputState::AwaitingPositionLeverage { .. }
        ));
    }

    #[test]
    fn bad_entry_price_resets_the_flow() {
        let mut account = account_in(InputState::AwaitingPositionEntry {
            coin: "BTCUSDT".into(),
            side: Side::Buy,
            leverage: 2.0,
            stake: 10.0,
        });
        let reply = apply(&mut account, "cheap", &cfg()).unwrap();
        assert!(reply.contains("entry price"));
        assert_eq!(account.input_state, InputState::Idle);
        assert!(account.positions.is_empty());
    }

    #[test]
    fn delete_index_rules() {
        let mut account = Account::default();
        walk_add_position(&mut account);

        // Non-numeric input re-prompts in place
        account.input_state = InputState::AwaitingDeleteIndex;
        apply(&mut account, "first", &cfg()).unwrap();
        assert_eq!(account.input_state, InputState::AwaitingDeleteIndex);

        // Out-of-range resets
        let reply = apply(&mut account, "3", &cfg()).unwrap();
        assert!(reply.contains("No position with that number"));
        assert_eq!(account.input_state, InputState::Idle);
        assert_eq!(account.positions.len(), 1);

        // Valid 1-based index deletes
        account.input_state = InputState::AwaitingDeleteIndex;
        let reply = apply(&mut account, "1", &cfg()).unwrap();
        assert!(reply.contains("deleted"));
        assert!(account.positions.is_empty());
    }

    #[test]
    fn deleting_with_no_positions_is_out_of_range() {
        let mut account = account_in(InputState::AwaitingDeleteIndex);
        let reply = apply(&mut account, "1", &cfg()).unwrap();
        assert!(reply.contains("No position with that number"));
        assert_eq!(account.input_state, InputState::Idle);
    }
}

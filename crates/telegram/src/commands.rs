use std::sync::Arc;

use async_trait::async_trait;
use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};
use tracing::{info, warn};

use common::{
    AccountId, AdvisorConfig, InputState, ManualTradeKind, MarketData, Notifier, Side, TradingMode,
};
use store::AccountStore;

use crate::input;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub store: AccountStore,
    pub market: Arc<dyn MarketData>,
    pub cfg: Arc<AdvisorConfig>,
}

/// Chat commands exposed to users. Free-text replies to the multi-step
/// flows are handled by the input FSM, not listed here.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "PulseBot commands:")]
pub enum Command {
    #[command(description = "Enable cycle signals and show instructions")]
    Start,
    #[command(description = "Set your balance (prompts for the amount)")]
    SetBalance,
    #[command(description = "Show your current balance")]
    Balance,
    #[command(description = "Show the last 10 signals")]
    Signals,
    #[command(description = "Show the last 10 trades")]
    Trades,
    #[command(description = "Record a profitable trade")]
    Profit,
    #[command(description = "Record a losing trade")]
    Loss,
    #[command(description = "Declare a new position")]
    AddPosition,
    #[command(description = "List open positions with live prices")]
    Positions,
    #[command(description = "Delete a position by number")]
    DelPosition,
    #[command(description = "Show the trading mode")]
    Mode,
    #[command(description = "Set the trading mode: /setmode long|scalp")]
    SetMode(String),
}

/// Start the bot in long-polling mode. Call from `tokio::spawn`.
pub async fn start_bot(bot: Bot, deps: BotDeps) {
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(handle_start))
        .branch(case![Command::SetBalance].endpoint(handle_set_balance))
        .branch(case![Command::Balance].endpoint(handle_balance))
        .branch(case![Command::Signals].endpoint(handle_signals))
        .branch(case![Command::Trades].endpoint(handle_trades))
        .branch(case![Command::Profit].endpoint(handle_profit))
        .branch(case![Command::Loss].endpoint(handle_loss))
        .branch(case![Command::AddPosition].endpoint(handle_add_position))
        .branch(case![Command::Positions].endpoint(handle_positions))
        .branch(case![Command::DelPosition].endpoint(handle_del_position))
        .branch(case![Command::Mode].endpoint(handle_mode))
        .branch(case![Command::SetMode(mode)].endpoint(handle_set_mode));

    Update::filter_message()
        .branch(command_handler)
        .branch(dptree::endpoint(handle_text))
}

async fn handle_start(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let chat = msg.chat.id.0;
    deps.store
        .update(chat, |account| {
            account.signals_enabled = true;
            account.input_state = InputState::Idle;
        })
        .await?;

    let text = "Hi! I watch the market for trade signals.\n\n\
        Available commands:\n\
        /setbalance – set your balance in USDT\n\
        /balance – show the current balance\n\
        /signals – last 10 signals\n\
        /trades – last 10 trades\n\
        /profit, /loss – record a manual trade\n\
        /addposition – declare an open position (coin, side, leverage, stake, entry)\n\
        /positions – open positions with the change since entry\n\
        /delposition – delete a position by number\n\
        /mode, /setmode – monitoring mode (long or scalp)\n\n\
        Signals are on. Good luck!";
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_set_balance(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let chat = msg.chat.id.0;
    deps.store
        .update(chat, |account| account.input_state = InputState::AwaitingBalance)
        .await?;
    bot.send_message(msg.chat.id, "💵 Enter your balance for today (in USDT):")
        .await?;
    Ok(())
}

async fn handle_balance(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let account = deps.store.account(msg.chat.id.0).await;
    bot.send_message(
        msg.chat.id,
        format!("💰 Current balance: {:.2} USDT", account.balance),
    )
    .await?;
    Ok(())
}

async fn handle_signals(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let account = deps.store.account(msg.chat.id.0).await;
    let history = if account.signals.is_empty() {
        "Signal history is empty.".to_string()
    } else {
        account
            .signals
            .iter()
            .rev()
            .take(10)
            .rev()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };
    bot.send_message(msg.chat.id, format!("📊 Signal history:\n{history}"))
        .await?;
    Ok(())
}

async fn handle_trades(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let account = deps.store.account(msg.chat.id.0).await;
    let history = if account.trades.is_empty() {
        "Trade history is empty.".to_string()
    } else {
        account
            .trades
            .iter()
            .rev()
            .take(10)
            .rev()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };
    bot.send_message(msg.chat.id, format!("📜 Trade history:\n{history}"))
        .await?;
    Ok(())
}

async fn handle_profit(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    await_trade_amount(bot, msg, deps, ManualTradeKind::Profit).await
}

async fn handle_loss(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    await_trade_amount(bot, msg, deps, ManualTradeKind::Loss).await
}

async fn await_trade_amount(
    bot: Bot,
    msg: Message,
    deps: Arc<BotDeps>,
    kind: ManualTradeKind,
) -> HandlerResult {
    let chat = msg.chat.id.0;
    deps.store
        .update(chat, |account| {
            account.input_state = InputState::AwaitingTradeAmount { kind }
        })
        .await?;
    let prompt = match kind {
        ManualTradeKind::Profit => "Enter the profit amount (for example: 50):",
        ManualTradeKind::Loss => "Enter the loss amount (for example: 30):",
    };
    bot.send_message(msg.chat.id, prompt).await?;
    Ok(())
}

async fn handle_add_position(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let chat = msg.chat.id.0;
    deps.store
        .update(chat, |account| {
            account.input_state = InputState::AwaitingPositionCoin
        })
        .await?;
    bot.send_message(
        msg.chat.id,
        "Enter the coin for the new position (for example: BTCUSDT):",
    )
    .await?;
    Ok(())
}

async fn handle_positions(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let account = deps.store.account(msg.chat.id.0).await;
    if account.positions.is_empty() {
        bot.send_message(msg.chat.id, "No open positions.").await?;
        return Ok(());
    }

    let mut text = String::from("📈 My positions:\n");
    for (i, pos) in account.positions.iter().enumerate() {
        let n = i + 1;
        match deps.market.current_price(&pos.coin).await {
            Ok(price) => {
                let change = match pos.side {
                    Side::Buy => (price - pos.entry) / pos.entry * 100.0,
                    Side::Sell => (pos.entry - price) / pos.entry * 100.0,
                };
                text.push_str(&format!(
                    "{n}. {} ({})\n   Entry price: {:.2}\n   Current price: {price:.2}\n   \
                     Change since entry: {change:+.1}%\n   (Leverage: {}x, SL = {:.2}, TP = {:.2})\n",
                    pos.coin, pos.side, pos.entry, pos.leverage, pos.stop_loss, pos.take_profit
                ));
            }
            Err(e) => {
                warn!(coin = %pos.coin, error = %e, "Failed to fetch price for position listing");
                text.push_str(&format!("{n}. {}: price unavailable\n", pos.coin));
            }
        }
    }
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_del_position(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let chat = msg.chat.id.0;
    let account = deps.store.account(chat).await;
    if account.positions.is_empty() {
        bot.send_message(msg.chat.id, "No open positions to delete.")
            .await?;
        return Ok(());
    }

    let mut text = String::from("Enter the number of the position to delete:\n");
    for (i, pos) in account.positions.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} {} at {:.2}\n",
            i + 1,
            pos.coin,
            pos.side,
            pos.entry
        ));
    }
    deps.store
        .update(chat, |account| {
            account.input_state = InputState::AwaitingDeleteIndex
        })
        .await?;
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_mode(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let account = deps.store.account(msg.chat.id.0).await;
    bot.send_message(
        msg.chat.id,
        format!(
            "Trading mode: {} (monitoring on {})",
            account.trading_mode,
            account.trading_mode.monitor_interval()
        ),
    )
    .await?;
    Ok(())
}

async fn handle_set_mode(bot: Bot, msg: Message, mode: String, deps: Arc<BotDeps>) -> HandlerResult {
    let reply = match TradingMode::parse(&mode) {
        Some(mode) => {
            deps.store
                .update(msg.chat.id.0, |account| account.trading_mode = mode)
                .await?;
            format!("✅ Trading mode set: {mode}")
        }
        None => "⚠️ Mode must be 'long' or 'scalp'. Usage: /setmode long".to_string(),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Free text feeds the per-account input FSM.
async fn handle_text(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let Some(text) = msg.text().map(|t| t.to_string()) else {
        return Ok(());
    };
    let chat = msg.chat.id.0;

    let reply = deps
        .store
        .update(chat, |account| input::apply(account, &text, &deps.cfg))
        .await?;

    if let Some(reply) = reply {
        bot.send_message(msg.chat.id, reply).await?;
    }
    Ok(())
}

/// `Notifier` backed by the shared bot. Best-effort: the advisor logs
/// failures and moves on.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat: AccountId, text: &str) -> common::Result<()> {
        self.bot
            .send_message(ChatId(chat), text)
            .await
            .map(|_| ())
            .map_err(|e| common::Error::Notify(e.to_string()))
    }
}

use std::sync::Arc;

use teloxide::Bot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{AdvisorConfig, Config, MarketData};
use engine::{Advisor, BinanceClient};
use store::AccountStore;
use telegram_ctrl::{start_bot, BotDeps, TelegramNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let advisor_cfg = AdvisorConfig::load(&cfg.advisor_config_path);
    info!(symbols = ?advisor_cfg.symbols, cycle_secs = advisor_cfg.cycle_secs, "PulseBot starting");

    // ── State ─────────────────────────────────────────────────────────────────
    let store = AccountStore::open(&cfg.state_path);

    // ── Market data ───────────────────────────────────────────────────────────
    let market: Arc<dyn MarketData> = Arc::new(BinanceClient::with_base_url(&cfg.market_base_url));
    match market.ping().await {
        Ok(()) => info!("Market data provider reachable"),
        Err(e) => warn!(error = %e, "Market data ping failed — continuing, cycles will retry"),
    }

    // ── Telegram ──────────────────────────────────────────────────────────────
    let bot = Bot::new(cfg.telegram_token.clone());
    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));
    let bot_deps = BotDeps {
        store: store.clone(),
        market: market.clone(),
        cfg: Arc::new(advisor_cfg.clone()),
    };

    // ── Advisor loop ──────────────────────────────────────────────────────────
    let advisor = Advisor::new(market, store, notifier, advisor_cfg);

    tokio::spawn(advisor.run());
    tokio::spawn(start_bot(bot, bot_deps));

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting.");
    Ok(())
}

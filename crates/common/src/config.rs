use serde::{Deserialize, Serialize};
use tracing::warn;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    /// Path to the advisor TOML file.
    pub advisor_config_path: String,
    /// Path to the persisted account state document.
    pub state_path: String,
    /// Market data REST endpoint, overridable for testing.
    pub market_base_url: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            telegram_token: required_env("TELEGRAM_TOKEN"),
            advisor_config_path: optional_env("ADVISOR_CONFIG_PATH")
                .unwrap_or_else(|| "config/advisor.toml".to_string()),
            state_path: optional_env("STATE_PATH").unwrap_or_else(|| "data/state.json".to_string()),
            market_base_url: optional_env("MARKET_BASE_URL")
                .unwrap_or_else(|| "https://api.binance.com".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Advisor parameters loaded from a TOML file.
///
/// Example `config/advisor.toml`:
/// ```toml
/// symbols = ["BTCUSDT", "ETHUSDT"]
/// stop_loss_pct = 2.0
/// take_profit_pct = 6.0
/// cycle_secs = 300
/// entry_lookback = 100
/// notify_stable = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdvisorConfig {
    /// Symbols analyzed each cycle.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Stop-loss distance from entry, in percent (2.0 = 2%).
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    /// Take-profit distance from entry, in percent (6.0 = 6%).
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,
    /// Seconds between full analysis cycles.
    #[serde(default = "default_cycle_secs")]
    pub cycle_secs: u64,
    /// Candles fetched for entry analysis.
    #[serde(default = "default_entry_lookback")]
    pub entry_lookback: usize,
    /// Whether "position stable" lines are included in cycle messages.
    #[serde(default = "default_notify_stable")]
    pub notify_stable: bool,
}

fn default_symbols() -> Vec<String> {
    ["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "XRPUSDT", "LTCUSDT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_stop_loss_pct() -> f64 {
    2.0
}

fn default_take_profit_pct() -> f64 {
    6.0
}

fn default_cycle_secs() -> u64 {
    300
}

fn default_entry_lookback() -> usize {
    100
}

fn default_notify_stable() -> bool {
    true
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config must deserialize from defaults")
    }
}

impl AdvisorConfig {
    /// Load from a TOML file. A missing file falls back to defaults; a
    /// malformed file is a fatal startup error.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .unwrap_or_else(|e| panic!("Failed to parse advisor config at '{path}': {e}")),
            Err(_) => {
                warn!(path, "Advisor config not found, using defaults");
                AdvisorConfig::default()
            }
        }
    }
}

pub mod binance;
pub mod cycle;
pub mod format;
pub mod monitor;

pub use binance::BinanceClient;
pub use cycle::Advisor;
pub use format::Outcome;

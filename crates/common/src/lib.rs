pub mod config;
pub mod error;
pub mod market;
pub mod notify;
pub mod types;

pub use config::{AdvisorConfig, Config};
pub use error::{Error, Result};
pub use market::MarketData;
pub use notify::Notifier;
pub use types::*;

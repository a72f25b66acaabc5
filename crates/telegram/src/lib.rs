pub mod commands;
pub mod input;

pub use commands::{start_bot, BotDeps, TelegramNotifier};

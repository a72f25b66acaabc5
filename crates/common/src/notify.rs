use async_trait::async_trait;

use crate::{AccountId, Result};

/// Outbound message transport.
///
/// `TelegramNotifier` in `crates/telegram` implements this over the shared
/// bot. Delivery is best-effort: callers log failures and move on, never
/// retry within the cycle, never abort the loop.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat: AccountId, text: &str) -> Result<()>;
}

//! Durable account state: one JSON document mapping chat ids to accounts.
//!
//! Every mutation goes through [`AccountStore::update`], which holds a single
//! async mutex across the read-modify-write and the flush to disk. The cycle
//! loop and the chat command handlers share one store, so two writers can
//! never clobber each other's update.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use common::{Account, AccountId, Result};

const SCHEMA_VERSION: u32 = 1;

/// The persisted document. Unknown fields are ignored, missing fields
/// default, so older files keep loading across schema additions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StateFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    accounts: HashMap<AccountId, Account>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

/// Cloneable handle to the shared account document.
#[derive(Clone)]
pub struct AccountStore {
    path: PathBuf,
    state: Arc<Mutex<StateFile>>,
}

impl AccountStore {
    /// Open the store at `path`. A missing or corrupt file yields an empty
    /// document with a warning; it is never fatal.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<StateFile>(&content) {
                Ok(state) => {
                    info!(path = %path.display(), accounts = state.accounts.len(), "Account store loaded");
                    state
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt account store, starting empty");
                    StateFile::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "No account store yet, starting empty");
                StateFile::default()
            }
        };

        Self {
            path,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Snapshot of one account; a default record if the chat is unknown.
    pub async fn account(&self, id: AccountId) -> Account {
        self.state
            .lock()
            .await
            .accounts
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// Chats that asked for cycle notifications via /start.
    pub async fn enabled_accounts(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self
            .state
            .lock()
            .await
            .accounts
            .iter()
            .filter(|(_, a)| a.signals_enabled)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Atomically read-modify-write one account and persist the document.
    /// The account is created with defaults if absent.
    pub async fn update<R>(&self, id: AccountId, f: impl FnOnce(&mut Account) -> R) -> Result<R> {
        let mut state = self.state.lock().await;
        let result = f(state.accounts.entry(id).or_default());
        persist(&self.path, &state).await?;
        Ok(result)
    }
}

/// Serialize and swap the document into place. Writing to a sibling temp
/// file first keeps a crash mid-write from corrupting the previous state.
async fn persist(path: &Path, state: &StateFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_vec_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

// Persistence contract: string-keyed JSON values behind a small repository.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};

use crate::draw::config::DrawConfig;

/// Key holding the serialized [`DrawConfig`]. Absent means unconfigured.
pub const CONFIG_KEY: &str = "config";
/// Key holding the winners, in draw order.
pub const WINNERS_KEY: &str = "winners";
/// Key holding numbers voided by a redraw.
pub const VOIDED_KEY: &str = "voided";

/// A string-keyed store of JSON text values (browser-storage style).
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Everything needed to rebuild a session after a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedState {
    pub config: DrawConfig,
    pub winners: Vec<i64>,
    pub voided: Vec<i64>,
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Typed access to the persisted raffle keys.
pub struct Repository<K> {
    kv: K,
}

impl<K: KeyValueStore> Repository<K> {
    pub fn new(kv: K) -> Self {
        Repository { kv }
    }

    /// The underlying store.
    pub fn inner(&self) -> &K {
        &self.kv
    }

    /// Load the saved session. Returns `None` when no config is stored;
    /// missing `winners`/`voided` keys read as empty lists.
    pub fn load(&self) -> Result<Option<SavedState>> {
        let Some(config_json) = self.kv.get(CONFIG_KEY)? else {
            return Ok(None);
        };
        let config: DrawConfig = serde_json::from_str(&config_json)
            .context("failed to deserialize persisted config")?;
        let winners = self.load_list(WINNERS_KEY)?;
        let voided = self.load_list(VOIDED_KEY)?;
        Ok(Some(SavedState {
            config,
            winners,
            voided,
        }))
    }

    /// Write every key of `state`.
    pub fn save(&self, state: &SavedState) -> Result<()> {
        self.save_config(&state.config)?;
        self.save_winners(&state.winners)?;
        self.save_voided(&state.voided)
    }

    pub fn save_config(&self, config: &DrawConfig) -> Result<()> {
        let json = serde_json::to_string(config).context("failed to serialize config")?;
        self.kv.set(CONFIG_KEY, &json)
    }

    /// Overwrite the winners list.
    pub fn save_winners(&self, winners: &[i64]) -> Result<()> {
        self.save_list(WINNERS_KEY, winners)
    }

    pub fn save_voided(&self, voided: &[i64]) -> Result<()> {
        self.save_list(VOIDED_KEY, voided)
    }

    /// Delete every raffle key.
    pub fn clear(&self) -> Result<()> {
        self.kv.remove(CONFIG_KEY)?;
        self.kv.remove(WINNERS_KEY)?;
        self.kv.remove(VOIDED_KEY)
    }

    fn load_list(&self, key: &str) -> Result<Vec<i64>> {
        match self.kv.get(key)? {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("failed to deserialize persisted `{key}`")),
            None => Ok(Vec::new()),
        }
    }

    fn save_list(&self, key: &str, values: &[i64]) -> Result<()> {
        let json = serde_json::to_string(values)
            .with_context(|| format!("failed to serialize `{key}`"))?;
        self.kv.set(key, &json)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store; contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

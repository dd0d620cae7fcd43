//! Persistence adapter
//!
//! The whole mutable state is serialized as one JSON envelope under a single
//! key of a [`KeyValueStore`]. Failures never propagate:
//! - read failure, unparseable blob, or version mismatch → default state
//! - write failure → logged and skipped
//!
//! A version mismatch discards everything stored; there is no migration.

#[cfg(feature = "sqlx")]
pub mod sqlite;

#[cfg(feature = "sqlx")]
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::state::{PersistedState, SCHEMA_VERSION};
use crate::Result;

/// Key the assessment envelope is stored under
pub const STATE_KEY: &str = "cmmc_assessment_state";

/// String key → string value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, used by tests and `--ephemeral` runs
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Outcome of loading the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored state matched the schema version
    Restored,
    /// Nothing stored yet
    Empty,
    /// Something was stored but could not be used
    Discarded,
}

/// Serializes [`PersistedState`] to and from a [`KeyValueStore`]
pub struct PersistenceAdapter<S: KeyValueStore + ?Sized> {
    store: std::sync::Arc<S>,
    key: String,
}

impl<S: KeyValueStore + ?Sized> Clone for PersistenceAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
        }
    }
}

impl<S: KeyValueStore + ?Sized> PersistenceAdapter<S> {
    pub fn new(store: std::sync::Arc<S>) -> Self {
        Self::with_key(store, STATE_KEY)
    }

    pub fn with_key(store: std::sync::Arc<S>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// Load stored state, falling back to defaults on any problem
    pub async fn load(&self) -> (PersistedState, LoadOutcome) {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No persisted assessment state");
                return (PersistedState::default(), LoadOutcome::Empty);
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Could not read persisted state; starting fresh");
                return (PersistedState::default(), LoadOutcome::Discarded);
            }
        };

        match decode(&raw) {
            Some(state) => {
                info!(
                    records = state.practice_records.len(),
                    mined = state.mined_practices.len(),
                    level = state.subscription_level.as_str(),
                    "Restored persisted assessment state"
                );
                (state, LoadOutcome::Restored)
            }
            None => (PersistedState::default(), LoadOutcome::Discarded),
        }
    }

    /// Write the full state. Returns false if the write was skipped.
    pub async fn save(&self, state: &PersistedState) -> bool {
        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Could not serialize assessment state; write skipped");
                return false;
            }
        };

        match self.store.set(&self.key, &json).await {
            Ok(()) => {
                debug!(bytes = json.len(), "Persisted assessment state");
                true
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Could not persist assessment state; write skipped");
                false
            }
        }
    }

    /// Remove the stored envelope. Failures are logged only.
    pub async fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key).await {
            warn!(key = %self.key, error = %e, "Could not clear persisted state");
        }
    }
}

/// Parse an envelope, rejecting anything not at [`SCHEMA_VERSION`]
fn decode(raw: &str) -> Option<PersistedState> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Persisted state is not valid JSON; discarding");
            return None;
        }
    };

    let version = value.get("version").and_then(serde_json::Value::as_u64);
    if version != Some(u64::from(SCHEMA_VERSION)) {
        warn!(
            stored = ?version,
            expected = SCHEMA_VERSION,
            "Persisted state schema version mismatch; discarding"
        );
        return None;
    }

    match serde_json::from_value(value) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, "Persisted state does not match schema; discarding");
            None
        }
    }
}

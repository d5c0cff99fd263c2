//! In-memory snapshot store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{PersistenceError, Snapshot, SnapshotStore};

/// Snapshots held in a map. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshots {
    entries: Arc<Mutex<HashMap<String, Snapshot>>>,
    fail_saves: Arc<AtomicBool>,
}

impl InMemorySnapshots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail with an I/O error until reset.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Store a snapshot directly, bypassing failure injection.
    pub fn insert(&self, key: &str, snapshot: Snapshot) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), snapshot);
    }

    /// The snapshot currently stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Snapshot> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl SnapshotStore for InMemorySnapshots {
    async fn load(&self, key: &str) -> Result<Option<Snapshot>, PersistenceError> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io(std::io::Error::other(
                "snapshot saves disabled",
            )));
        }
        self.insert(key, snapshot.clone());
        Ok(())
    }
}

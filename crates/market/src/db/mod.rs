//! Snapshot persistence for the marketplace stores.
//!
//! Each store (catalog, accounts, orders, audit trail) is saved as one JSON
//! document under a fixed key after every mutation that touches it. Documents
//! are wrapped in a [`Snapshot`] envelope carrying a schema version.
//!
//! # Backends
//!
//! - [`InMemorySnapshots`] - tests and throwaway runs
//! - [`FileSnapshots`] - one `{key}.json` file per store in a data directory
//! - [`PostgresSnapshots`] - `market.snapshots` table
//!
//! # Migrations
//!
//! Migrations are stored in `crates/market/migrations/` and run via:
//! ```bash
//! cargo run -p harvest-hub-cli -- migrate
//! ```

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::MarketConfig;

pub mod file;
pub mod memory;
pub mod postgres;
pub mod seed;

pub use file::FileSnapshots;
pub use memory::InMemorySnapshots;
pub use postgres::PostgresSnapshots;

/// Version written into every snapshot envelope.
pub const SCHEMA_VERSION: u32 = 1;

/// Snapshot keys, one per store.
pub mod keys {
    pub const CATALOG: &str = "catalog";
    pub const ACCOUNTS: &str = "accounts";
    pub const ORDERS: &str = "orders";
    pub const AUDIT: &str = "audit";

    /// Every key, in load order.
    pub const ALL: [&str; 4] = [CATALOG, ACCOUNTS, ORDERS, AUDIT];
}

/// Errors from snapshot storage.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A value could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document could not be decoded.
    #[error("corrupt snapshot {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A stored document was written by another schema version.
    #[error("snapshot {key} has schema version {found}, expected {SCHEMA_VERSION}")]
    VersionMismatch { key: String, found: u32 },
}

impl PersistenceError {
    /// Whether the stored data is unusable but storage itself works.
    ///
    /// Such snapshots are replaced by seed data on load.
    #[must_use]
    pub const fn is_unreadable_data(&self) -> bool {
        matches!(self, Self::Corrupt { .. } | Self::VersionMismatch { .. })
    }
}

/// Versioned envelope around one store's JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl Snapshot {
    /// Wrap `value` at the current schema version.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if `value` cannot be encoded.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, PersistenceError> {
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            data: serde_json::to_value(value)?,
        })
    }

    /// Unwrap the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `VersionMismatch` for another schema version and `Corrupt`
    /// when the document does not match `T`.
    pub fn decode<T: DeserializeOwned>(self, key: &str) -> Result<T, PersistenceError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(PersistenceError::VersionMismatch {
                key: key.to_string(),
                found: self.schema_version,
            });
        }
        serde_json::from_value(self.data).map_err(|e| PersistenceError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Key/value storage for snapshots.
///
/// `save` must be idempotent: saving the same snapshot twice leaves the same
/// stored state.
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot under `key`, `None` if nothing was saved yet.
    fn load(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Snapshot>, PersistenceError>> + Send;

    /// Store `snapshot` under `key`, replacing any previous one.
    fn save(
        &self,
        key: &str,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// The backend selected by configuration.
#[derive(Debug, Clone)]
pub enum SnapshotBackend {
    Memory(InMemorySnapshots),
    File(FileSnapshots),
    Postgres(PostgresSnapshots),
}

impl SnapshotBackend {
    /// Postgres when a database URL is configured, otherwise JSON files in
    /// the data directory.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the pool cannot connect and `Io` if the data
    /// directory cannot be created.
    pub async fn from_config(config: &MarketConfig) -> Result<Self, PersistenceError> {
        if let Some(url) = &config.database_url {
            tracing::info!("Using Postgres snapshot store");
            let pool = create_pool(url).await?;
            return Ok(Self::Postgres(PostgresSnapshots::new(pool)));
        }
        tracing::info!(dir = %config.data_dir.display(), "Using file snapshot store");
        Ok(Self::File(FileSnapshots::create(&config.data_dir).await?))
    }
}

impl SnapshotStore for SnapshotBackend {
    async fn load(&self, key: &str) -> Result<Option<Snapshot>, PersistenceError> {
        match self {
            Self::Memory(store) => store.load(key).await,
            Self::File(store) => store.load(key).await,
            Self::Postgres(store) => store.load(key).await,
        }
    }

    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        match self {
            Self::Memory(store) => store.save(key, snapshot).await,
            Self::File(store) => store.save(key, snapshot).await,
            Self::Postgres(store) => store.save(key, snapshot).await,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

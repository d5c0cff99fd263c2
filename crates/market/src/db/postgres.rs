//! `PostgreSQL` snapshot store.
//!
//! Uses the `market.snapshots` table created by the migrations in
//! `crates/market/migrations/`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{PersistenceError, Snapshot, SnapshotStore};

/// Snapshots stored as JSONB rows keyed by store name.
#[derive(Debug, Clone)]
pub struct PostgresSnapshots {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    schema_version: i32,
    payload: serde_json::Value,
    saved_at: DateTime<Utc>,
}

impl PostgresSnapshots {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl SnapshotStore for PostgresSnapshots {
    async fn load(&self, key: &str) -> Result<Option<Snapshot>, PersistenceError> {
        let row: Option<SnapshotRow> = sqlx::query_as(
            r"
            SELECT schema_version, payload, saved_at
            FROM market.snapshots
            WHERE key = $1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let schema_version =
                u32::try_from(r.schema_version).map_err(|_| PersistenceError::Corrupt {
                    key: key.to_string(),
                    reason: format!("negative schema version {}", r.schema_version),
                })?;
            Ok(Snapshot {
                schema_version,
                saved_at: r.saved_at,
                data: r.payload,
            })
        })
        .transpose()
    }

    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let schema_version =
            i32::try_from(snapshot.schema_version).map_err(|_| PersistenceError::Corrupt {
                key: key.to_string(),
                reason: format!("schema version {} out of range", snapshot.schema_version),
            })?;

        sqlx::query(
            r"
            INSERT INTO market.snapshots (key, schema_version, payload, saved_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET schema_version = EXCLUDED.schema_version,
                payload = EXCLUDED.payload,
                saved_at = EXCLUDED.saved_at
            ",
        )
        .bind(key)
        .bind(schema_version)
        .bind(&snapshot.data)
        .bind(snapshot.saved_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

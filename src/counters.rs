//! SQLite-backed [`CounterStore`].
//!
//! Views are plain increments. Likes are at most once per identity: the
//! identity string (typically the client address) is hashed with SHA-256 so
//! raw addresses are never stored, and the `(item_id, identity_hash)` primary
//! key on `item_likes` rejects repeats. The insert and the counter update
//! share one transaction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::Path;

use toolshelf_core::store::{CounterStore, ItemCounts, LikeOutcome, ViewOutcome};

use crate::config::Config;
use crate::migrate;

/// Pool size for the counter database.
const MAX_CONNECTIONS: u32 = 4;

/// Largest `IN (...)` list sent in one statement.
const COUNTS_BATCH: usize = 500;

/// SQLite implementation of the [`CounterStore`] trait.
pub struct SqliteCounters {
    pool: SqlitePool,
}

impl SqliteCounters {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, creating the schema if needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = connect(&config.db.path).await?;
        migrate::apply_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Open a WAL-mode pool on the counter database at `path`.
///
/// The file and its parent directories are created on first use. WAL lets
/// listing reads proceed while like/view writes are in flight.
pub async fn connect(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open counter database: {}", path.display()))
}

/// Hex SHA-256 of the trimmed identity.
pub fn hash_identity(identity: &str) -> String {
    hex::encode(Sha256::digest(identity.trim().as_bytes()))
}

fn to_count(v: i64) -> u64 {
    v.max(0) as u64
}

#[async_trait]
impl CounterStore for SqliteCounters {
    async fn increment_view(&self, item_id: &str) -> Result<ViewOutcome> {
        if item_id.trim().is_empty() {
            return Ok(ViewOutcome::NotApplicable);
        }
        sqlx::query(
            r#"
            INSERT INTO item_counters (item_id, views, likes, updated_at)
            VALUES (?, 1, 0, ?)
            ON CONFLICT(item_id) DO UPDATE SET
                views = views + 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(item_id)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(ViewOutcome::Recorded)
    }

    async fn increment_like(&self, item_id: &str, identity: &str) -> Result<LikeOutcome> {
        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now().timestamp();

        let recorded = if item_id.trim().is_empty() || identity.trim().is_empty() {
            false
        } else {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO item_likes (id, item_id, identity_hash, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(item_id)
            .bind(hash_identity(identity))
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                == 1;

            if inserted {
                sqlx::query(
                    r#"
                    INSERT INTO item_counters (item_id, views, likes, updated_at)
                    VALUES (?, 0, 1, ?)
                    ON CONFLICT(item_id) DO UPDATE SET
                        likes = likes + 1,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(item_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
            inserted
        };

        let likes: Option<i64> =
            sqlx::query_scalar("SELECT likes FROM item_counters WHERE item_id = ?")
                .bind(item_id)
                .fetch_optional(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(LikeOutcome {
            success: recorded,
            likes: likes.map(to_count).unwrap_or(0),
        })
    }

    async fn counts(&self, item_ids: &[String]) -> Result<HashMap<String, ItemCounts>> {
        let mut out = HashMap::new();

        for batch in item_ids.chunks(COUNTS_BATCH) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!(
                "SELECT item_id, views, likes FROM item_counters WHERE item_id IN ({})",
                placeholders
            );
            let mut query = sqlx::query(&sql);
            for id in batch {
                query = query.bind(id.as_str());
            }
            for row in query.fetch_all(&self.pool).await? {
                out.insert(
                    row.get::<String, _>("item_id"),
                    ItemCounts {
                        views: to_count(row.get("views")),
                        likes: to_count(row.get("likes")),
                    },
                );
            }
        }

        Ok(out)
    }
}

//! Counter database schema.
//!
//! | Table | Purpose |
//! |-------|---------|
//! | `item_counters` | Running view/like totals per item |
//! | `item_likes` | One row per (item, hashed identity); enforces like-once |
//!
//! Every statement is `IF NOT EXISTS`, so running the migrations repeatedly
//! is safe.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::counters;

/// Connect to the configured database and apply the schema.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = counters::connect(&config.db.path).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an open pool.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS item_counters (
            item_id TEXT PRIMARY KEY,
            views INTEGER NOT NULL DEFAULT 0,
            likes INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS item_likes (
            id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            identity_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (item_id, identity_hash)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_item_likes_created_at ON item_likes(created_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

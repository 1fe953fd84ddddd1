//! Database layer: migrations, snapshot persistence and the event log.

use std::str::FromStr;

use scholarship_pool::PoolStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::{Result, ServiceError};
use crate::events::{EventRecord, NewEvent};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    // Each in-memory connection is its own database; keep just one.
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────

/// Read the last committed store. `None` before the first commit.
pub async fn load_snapshot(pool: &SqlitePool) -> Result<Option<PoolStore>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT store FROM pool_snapshot WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    row.map(|(json,)| serde_json::from_str::<PoolStore>(&json).map_err(ServiceError::from))
        .transpose()
}

// ─────────────────────────────────────────────────────────
// Commit
// ─────────────────────────────────────────────────────────

/// Persist the store and the events drained with it in one transaction.
/// Returns the number of events written.
pub async fn commit(pool: &SqlitePool, store: &PoolStore, events: &[NewEvent]) -> Result<usize> {
    let json = serde_json::to_string(store)?;
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO pool_snapshot (id, store, updated_at)
        VALUES (1, ?1, strftime('%s', 'now'))
        ON CONFLICT(id) DO UPDATE SET store = excluded.store, updated_at = excluded.updated_at
        "#,
    )
    .bind(&json)
    .execute(&mut *tx)
    .await?;

    for ev in events {
        sqlx::query(
            r#"
            INSERT INTO events (topic, actor, amount, timestamp, payload)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&ev.topic)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(ev.timestamp)
        .bind(&ev.payload)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(events.len())
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Fetch all events concerning `actor`, oldest first.
pub async fn get_events_for_actor(pool: &SqlitePool, actor: &str) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, topic, actor, amount, timestamp, payload, created_at
        FROM   events
        WHERE  actor = ?1
        ORDER  BY id ASC
        "#,
    )
    .bind(actor)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch all events, oldest first.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, topic, actor, amount, timestamp, payload, created_at
        FROM   events
        ORDER  BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

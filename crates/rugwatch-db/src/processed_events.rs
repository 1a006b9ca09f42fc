//! Database operations for the `processed_events` table.
//!
//! Append-only ledger of triggering events that have already been handled.
//! Rows are inserted exactly once and never updated or deleted; the table
//! exists purely for set-membership tests and activity counters.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Check whether an event has already been handled.
///
/// Read-only; safe to call before any side effect.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_processed(pool: &PgPool, event_id: &str) -> Result<bool, DbError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM processed_events WHERE event_id = $1)")
            .bind(event_id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Record an event as handled.
///
/// Idempotent: the insert is a no-op when the event id already exists, so the
/// check-then-insert pattern stays race-safe under concurrent callers — the
/// unique constraint, not the check, is what guarantees at-most-once.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn mark_processed(pool: &PgPool, event_id: &str) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO processed_events (event_id) VALUES ($1) \
         ON CONFLICT (event_id) DO NOTHING",
    )
    .bind(event_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Total number of handled events.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_processed(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_events")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of events handled after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_processed_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, DbError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM processed_events WHERE processed_at > $1")
            .bind(since)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Timestamp of the most recently handled event, or `None` if nothing has
/// been processed yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn last_processed_at(pool: &PgPool) -> Result<Option<DateTime<Utc>>, DbError> {
    let last: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MAX(processed_at) FROM processed_events")
            .fetch_one(pool)
            .await?;
    Ok(last)
}

//! Database operations for the `trusted_accounts` table.
//!
//! The table holds the persisted trusted-handle set. It is only ever replaced
//! wholesale — a refresh swaps the entire set inside one transaction so that
//! concurrent readers never observe a partially-replaced list.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Replace the entire trusted set with `handles`, stamped `refreshed_at`.
///
/// Runs DELETE + INSERT inside a single transaction; row positions preserve
/// the order of `handles` so later reads iterate in source-list order. On any
/// failure the transaction rolls back and the previous set stays intact.
///
/// Returns the number of handles written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction fails.
pub async fn replace_trusted_accounts(
    pool: &PgPool,
    handles: &[String],
    refreshed_at: DateTime<Utc>,
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM trusted_accounts")
        .execute(&mut *tx)
        .await?;

    for (position, handle) in handles.iter().enumerate() {
        sqlx::query(
            "INSERT INTO trusted_accounts (handle, position, refreshed_at) VALUES ($1, $2, $3)",
        )
        .bind(handle)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .bind(refreshed_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(handles.len())
}

/// List the trusted handles in source-list order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trusted_accounts(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let handles: Vec<String> =
        sqlx::query_scalar("SELECT handle FROM trusted_accounts ORDER BY position")
            .fetch_all(pool)
            .await?;
    Ok(handles)
}

/// Timestamp of the last successful refresh, or `None` if the set has never
/// been populated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn trusted_refreshed_at(pool: &PgPool) -> Result<Option<DateTime<Utc>>, DbError> {
    let refreshed: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MAX(refreshed_at) FROM trusted_accounts")
            .fetch_one(pool)
            .await?;
    Ok(refreshed)
}

/// Number of handles in the persisted trusted set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_trusted_accounts(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trusted_accounts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

//! Database operations for the `analysis_results` table.
//!
//! One row per analyzed account, keyed by the platform's external account id.
//! Writes are latest-wins upserts; a superseded analysis is overwritten, never
//! kept alongside the new one.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row and parameter types
// ---------------------------------------------------------------------------

/// A row from the `analysis_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRow {
    pub account_id: String,
    pub handle: String,
    pub account_age_days: i64,
    pub follower_count: i64,
    pub following_count: i64,
    /// `None` encodes the unbounded ratio (account follows nobody).
    pub follower_ratio: Option<f64>,
    pub bio_length: i32,
    pub bio_keywords: Value,
    pub avg_engagement: f64,
    pub trusted_follower_count: i32,
    pub trusted_followers: Value,
    pub score: i32,
    pub risk_factors: Value,
    pub positive_indicators: Value,
    pub analyzed_at: DateTime<Utc>,
}

/// Parameters for [`upsert_analysis`].
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub account_id: String,
    pub handle: String,
    pub account_age_days: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub follower_ratio: Option<f64>,
    pub bio_length: i32,
    pub bio_keywords: Vec<String>,
    pub avg_engagement: f64,
    pub trusted_follower_count: i32,
    pub trusted_followers: Vec<String>,
    pub score: i32,
    pub risk_factors: Vec<String>,
    pub positive_indicators: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

const ANALYSIS_COLUMNS: &str = "account_id, handle, account_age_days, follower_count, \
     following_count, follower_ratio, bio_length, bio_keywords, avg_engagement, \
     trusted_follower_count, trusted_followers, score, risk_factors, \
     positive_indicators, analyzed_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert or replace the analysis for an account.
///
/// Conflicts on `account_id` replace every column with the new values, so a
/// reader always observes the most recent analysis and exactly one row per
/// account exists at any time.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_analysis(pool: &PgPool, analysis: &NewAnalysis) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO analysis_results \
             (account_id, handle, account_age_days, follower_count, following_count, \
              follower_ratio, bio_length, bio_keywords, avg_engagement, \
              trusted_follower_count, trusted_followers, score, risk_factors, \
              positive_indicators, analyzed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         ON CONFLICT (account_id) DO UPDATE SET \
             handle = EXCLUDED.handle, \
             account_age_days = EXCLUDED.account_age_days, \
             follower_count = EXCLUDED.follower_count, \
             following_count = EXCLUDED.following_count, \
             follower_ratio = EXCLUDED.follower_ratio, \
             bio_length = EXCLUDED.bio_length, \
             bio_keywords = EXCLUDED.bio_keywords, \
             avg_engagement = EXCLUDED.avg_engagement, \
             trusted_follower_count = EXCLUDED.trusted_follower_count, \
             trusted_followers = EXCLUDED.trusted_followers, \
             score = EXCLUDED.score, \
             risk_factors = EXCLUDED.risk_factors, \
             positive_indicators = EXCLUDED.positive_indicators, \
             analyzed_at = EXCLUDED.analyzed_at",
    )
    .bind(&analysis.account_id)
    .bind(&analysis.handle)
    .bind(analysis.account_age_days)
    .bind(analysis.follower_count)
    .bind(analysis.following_count)
    .bind(analysis.follower_ratio)
    .bind(analysis.bio_length)
    .bind(serde_json::json!(analysis.bio_keywords))
    .bind(analysis.avg_engagement)
    .bind(analysis.trusted_follower_count)
    .bind(serde_json::json!(analysis.trusted_followers))
    .bind(analysis.score)
    .bind(serde_json::json!(analysis.risk_factors))
    .bind(serde_json::json!(analysis.positive_indicators))
    .bind(analysis.analyzed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Return the stored analysis for an account, or `None` if never analyzed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_analysis_by_account(
    pool: &PgPool,
    account_id: &str,
) -> Result<Option<AnalysisRow>, DbError> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analysis_results WHERE account_id = $1"
    ))
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List analyses performed after `since`, most recent first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_analyses(
    pool: &PgPool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<AnalysisRow>, DbError> {
    let rows = sqlx::query_as::<_, AnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analysis_results \
         WHERE analyzed_at > $1 \
         ORDER BY analyzed_at DESC \
         LIMIT $2"
    ))
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Total number of stored analyses (one per account).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_analyses(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analysis_results")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of analyses performed after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_analyses_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, DbError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM analysis_results WHERE analyzed_at > $1")
            .bind(since)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

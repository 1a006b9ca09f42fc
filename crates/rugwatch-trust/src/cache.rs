//! The persisted trusted-accounts cache with time-to-live invalidation.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::set::TrustedSet;
use crate::source::{parse_trust_list, TrustListClient};
use crate::TrustError;

/// Trusted-accounts cache backed by the `trusted_accounts` table.
///
/// `refresh` swaps the persisted set wholesale; `get` serves the persisted
/// set, refreshing first when it is older than the TTL and falling back to
/// the stale set when that refresh fails.
pub struct TrustedAccountCache {
    pool: PgPool,
    client: TrustListClient,
    ttl: Duration,
}

impl TrustedAccountCache {
    #[must_use]
    pub fn new(pool: PgPool, client: TrustListClient, ttl_hours: i64) -> Self {
        Self {
            pool,
            client,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Fetch the remote list and atomically replace the persisted set.
    ///
    /// Returns the number of handles now cached. On any failure — fetch,
    /// parse-to-empty, or persistence — the existing set is left untouched.
    ///
    /// # Errors
    ///
    /// - [`TrustError::Http`] if the fetch fails.
    /// - [`TrustError::EmptyList`] if the body parses to zero handles.
    /// - [`TrustError::Db`] if the replace transaction fails.
    pub async fn refresh(&self) -> Result<usize, TrustError> {
        let body = self.client.fetch().await?;
        let handles = parse_trust_list(&body);
        if handles.is_empty() {
            return Err(TrustError::EmptyList);
        }

        let count = rugwatch_db::replace_trusted_accounts(&self.pool, &handles, Utc::now()).await?;
        tracing::info!(count, "trusted accounts cache refreshed");
        Ok(count)
    }

    /// Return the current trusted set, refreshing first when stale.
    ///
    /// A failed refresh is downgraded to a warning and the stale set is
    /// served as-is — even when it is empty. A never-populated cache counts
    /// as stale.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Db`] only if reading the persisted set fails;
    /// refresh failures never surface here.
    pub async fn get(&self) -> Result<TrustedSet, TrustError> {
        let refreshed_at = rugwatch_db::trusted_refreshed_at(&self.pool).await?;
        let stale = refreshed_at.is_none_or(|at| Utc::now() - at > self.ttl);

        if stale {
            if let Err(e) = self.refresh().await {
                tracing::warn!(error = %e, "trusted list refresh failed; using stale set");
            }
        }

        let handles = rugwatch_db::list_trusted_accounts(&self.pool).await?;
        let refreshed_at = rugwatch_db::trusted_refreshed_at(&self.pool).await?;
        Ok(TrustedSet::new(handles, refreshed_at))
    }
}

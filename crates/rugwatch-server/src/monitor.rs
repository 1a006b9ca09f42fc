//! The mention-driven monitoring cycle.
//!
//! One cycle searches recent posts for the trigger phrase and handles each
//! new triggering event sequentially: resolve the replied-to author, fetch
//! profile/posts/followers, score, post the analysis reply, and record both
//! the analysis and the event in the ledger. Any per-event failure is logged
//! and skipped; the cycle never aborts the process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use rugwatch_core::AppConfig;
use rugwatch_db::NewAnalysis;
use rugwatch_engine::{render_report, AnalysisRecord, ScoringConfig};
use rugwatch_trust::TrustedAccountCache;
use rugwatch_xapi::{Mention, XApiClient};

/// Cycles between ledger-total log lines. At one cycle per five minutes this
/// works out to roughly hourly.
const STATUS_LOG_EVERY: u64 = 12;

/// Sequential, single-worker event processor driven by the scheduler.
pub struct Monitor {
    pool: PgPool,
    client: Arc<XApiClient>,
    cache: Arc<TrustedAccountCache>,
    config: Arc<AppConfig>,
    scoring: ScoringConfig,
    cycles: AtomicU64,
}

impl Monitor {
    #[must_use]
    pub fn new(
        pool: PgPool,
        client: Arc<XApiClient>,
        cache: Arc<TrustedAccountCache>,
        config: Arc<AppConfig>,
    ) -> Self {
        let scoring = ScoringConfig::from_app_config(&config);
        Self {
            pool,
            client,
            cache,
            config,
            scoring,
            cycles: AtomicU64::new(0),
        }
    }

    /// Run one monitoring cycle: search, dedup against the ledger, process.
    ///
    /// Events are handled one at a time with a cool-down sleep between them
    /// to respect platform rate limits.
    pub async fn run_cycle(&self) {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(cycle, "monitor: starting cycle");
        if cycle % STATUS_LOG_EVERY == 0 {
            self.log_status().await;
        }

        let query = build_search_query(&self.config.trigger_phrase);
        let mentions = match self
            .client
            .search_mentions(&query, self.config.mention_search_limit)
            .await
        {
            Ok(mentions) => mentions,
            Err(e) => {
                tracing::error!(error = %e, "monitor: mention search failed");
                return;
            }
        };

        let mut replied = 0_usize;
        for mention in &mentions {
            if !is_trigger(&mention.text, &self.config.trigger_phrase) {
                continue;
            }
            match rugwatch_db::has_processed(&self.pool, &mention.id).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(event = %mention.id, error = %e, "monitor: ledger check failed");
                    continue;
                }
            }

            match self.process_event(mention).await {
                Ok(true) => replied += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(event = %mention.id, error = %e, "monitor: event processing failed");
                }
            }

            tokio::time::sleep(Duration::from_secs(self.config.event_cooldown_secs)).await;
        }

        if replied > 0 {
            tracing::info!(replied, "monitor: cycle complete");
        } else {
            tracing::debug!("monitor: cycle complete, no new triggers");
        }
    }

    /// Handle one triggering event end-to-end.
    ///
    /// Returns `Ok(true)` when a reply was posted and the ledger updated,
    /// `Ok(false)` when the event was skipped (not a reply, author gone, or
    /// account absent). The event is marked processed only after a successful
    /// reply, so a failed attempt is retried on a later cycle.
    async fn process_event(&self, mention: &Mention) -> anyhow::Result<bool> {
        let Some(target_post) = mention.replied_to.as_deref() else {
            tracing::debug!(event = %mention.id, "monitor: trigger is not a reply; skipping");
            return Ok(false);
        };

        let Some(author) = self.client.get_post_author(target_post).await? else {
            tracing::warn!(event = %mention.id, "monitor: replied-to author unavailable; skipping");
            return Ok(false);
        };

        tracing::info!(event = %mention.id, handle = %author.handle, "monitor: analyzing account");

        let Some(profile) = self.client.get_user_by_handle(&author.handle).await? else {
            tracing::warn!(handle = %author.handle, "monitor: no such account; skipping");
            return Ok(false);
        };

        let posts = self
            .client
            .get_recent_posts(&profile.id, self.config.post_sample_limit)
            .await?;
        let followers = self
            .client
            .get_follower_sample(&profile.id, self.config.follower_sample_limit)
            .await?;
        let trusted = self.cache.get().await?;

        let record = rugwatch_engine::analyze(
            &profile,
            &posts,
            &followers,
            &trusted,
            Utc::now(),
            &self.scoring,
        );
        let report = render_report(&record);

        let reply_id = self.client.post_reply(&mention.id, &report).await?;
        tracing::info!(
            event = %mention.id,
            reply = %reply_id,
            score = record.score,
            "monitor: posted analysis reply"
        );

        rugwatch_db::upsert_analysis(&self.pool, &to_new_analysis(&record)).await?;
        rugwatch_db::mark_processed(&self.pool, &mention.id).await?;

        Ok(true)
    }

    async fn log_status(&self) {
        let totals = tokio::try_join!(
            rugwatch_db::count_processed(&self.pool),
            rugwatch_db::count_analyses(&self.pool),
        );
        match totals {
            Ok((processed, analyses)) => {
                tracing::info!(processed, analyses, "monitor: ledger totals");
            }
            Err(e) => tracing::warn!(error = %e, "monitor: status query failed"),
        }
    }
}

/// Search query for the trigger phrase, excluding reposts.
fn build_search_query(phrase: &str) -> String {
    format!("\"{phrase}\" -is:retweet")
}

/// The search query is quoted, but the platform may still return fuzzy
/// matches; re-check the text before treating a post as a trigger.
fn is_trigger(text: &str, phrase: &str) -> bool {
    text.to_lowercase().contains(&phrase.to_lowercase())
}

/// Map an engine record onto ledger row parameters. The unbounded ratio
/// persists as NULL.
fn to_new_analysis(record: &AnalysisRecord) -> NewAnalysis {
    NewAnalysis {
        account_id: record.account_id.clone(),
        handle: record.handle.clone(),
        account_age_days: record.account_age_days,
        follower_count: i64::try_from(record.follower_count).unwrap_or(i64::MAX),
        following_count: i64::try_from(record.following_count).unwrap_or(i64::MAX),
        follower_ratio: record
            .follower_ratio
            .is_finite()
            .then_some(record.follower_ratio),
        bio_length: i32::try_from(record.bio_length).unwrap_or(i32::MAX),
        bio_keywords: record.bio_keywords.clone(),
        avg_engagement: record.avg_engagement,
        trusted_follower_count: i32::try_from(record.trusted_follower_count).unwrap_or(i32::MAX),
        trusted_followers: record.trusted_followers.clone(),
        score: i32::from(record.score),
        risk_factors: record.risk_factors.clone(),
        positive_indicators: record.positive_indicators.clone(),
        analyzed_at: record.analyzed_at,
    }
}

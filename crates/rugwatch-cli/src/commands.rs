//! Operator subcommand handlers.

use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use rugwatch_core::AppConfig;
use rugwatch_db::NewAnalysis;
use rugwatch_engine::{render_report, AnalysisRecord, ScoringConfig, TrustTier};
use rugwatch_trust::{TrustListClient, TrustedAccountCache};
use rugwatch_xapi::XApiClient;

/// Show ledger totals, trusted-account count, recent activity, an
/// activity verdict, and the five most recent analyses.
///
/// # Errors
///
/// Returns an error if any database query fails.
pub(crate) async fn run_status(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let day_ago = now - Duration::hours(24);

    let total_processed = rugwatch_db::count_processed(pool).await?;
    let total_analyses = rugwatch_db::count_analyses(pool).await?;
    let trusted_count = rugwatch_db::count_trusted_accounts(pool).await?;
    let recent_processed = rugwatch_db::count_processed_since(pool, day_ago).await?;
    let recent_analyses = rugwatch_db::count_analyses_since(pool, day_ago).await?;
    let last_activity = rugwatch_db::last_processed_at(pool).await?;

    println!("RUGWATCH STATUS");
    println!("{}", "=".repeat(50));
    println!("Events processed:    {total_processed}");
    println!("Analyses stored:     {total_analyses}");
    println!("Trusted accounts:    {trusted_count}");
    println!("Activity (last 24h): {recent_processed} processed, {recent_analyses} analyzed");
    match last_activity {
        Some(at) => println!("Last activity:       {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("Last activity:       never"),
    }
    println!("Verdict:             {}", activity_verdict(last_activity, now));

    let recent = rugwatch_db::list_recent_analyses(pool, day_ago, 5).await?;
    if !recent.is_empty() {
        println!();
        println!("{:<22}{:<8}{:<16}ANALYZED", "HANDLE", "SCORE", "TIER");
        for row in &recent {
            let score = u8::try_from(row.score.clamp(0, 100)).unwrap_or(0);
            println!(
                "{:<22}{:<8}{:<16}{}",
                format!("@{}", row.handle),
                row.score,
                TrustTier::from_score(score).label(),
                row.analyzed_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

/// Fetch an account, score it, print the rendered report, and upsert the
/// analysis. No event is marked processed — this is a one-off analysis,
/// not a triggering event.
///
/// # Errors
///
/// Returns an error if the account does not exist, a platform call fails,
/// or the upsert fails.
pub(crate) async fn run_analyze(
    pool: &PgPool,
    config: &AppConfig,
    handle: &str,
) -> anyhow::Result<()> {
    let handle = handle.trim_start_matches('@');

    let bearer_token = config
        .x_bearer_token
        .as_deref()
        .context("X_BEARER_TOKEN must be set to analyze accounts")?;
    let client = XApiClient::with_base_url(
        bearer_token,
        config.xapi_request_timeout_secs,
        config.xapi_max_retries,
        config.xapi_retry_backoff_base_ms,
        &config.x_api_base_url,
    )?;

    let profile = client
        .get_user_by_handle(handle)
        .await?
        .with_context(|| format!("account '@{handle}' not found"))?;

    let posts = client
        .get_recent_posts(&profile.id, config.post_sample_limit)
        .await?;
    let followers = client
        .get_follower_sample(&profile.id, config.follower_sample_limit)
        .await?;
    let trusted = build_cache(pool, config)?.get().await?;

    let record = rugwatch_engine::analyze(
        &profile,
        &posts,
        &followers,
        &trusted,
        Utc::now(),
        &ScoringConfig::from_app_config(config),
    );
    print!("{}", render_report(&record));

    rugwatch_db::upsert_analysis(pool, &to_new_analysis(&record)).await?;
    Ok(())
}

/// Force a trusted-list refresh and print the new count.
///
/// # Errors
///
/// Returns an error if the fetch, parse, or replace fails; the previous
/// set stays intact in that case.
pub(crate) async fn run_refresh_trusted(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let cache = build_cache(pool, config)?;
    let count = cache.refresh().await?;
    println!("trusted list refreshed: {count} handles");
    Ok(())
}

fn build_cache(pool: &PgPool, config: &AppConfig) -> anyhow::Result<TrustedAccountCache> {
    let client = TrustListClient::new(&config.trusted_list_url, config.xapi_request_timeout_secs)?;
    Ok(TrustedAccountCache::new(
        pool.clone(),
        client,
        config.trusted_ttl_hours,
    ))
}

/// ACTIVE within the last hour, IDLE within six, INACTIVE beyond that.
fn activity_verdict(last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> &'static str {
    match last_activity {
        Some(at) if now - at < Duration::hours(1) => "ACTIVE",
        Some(at) if now - at < Duration::hours(6) => "IDLE",
        _ => "INACTIVE",
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_boundaries_are_one_and_six_hours() {
        let now = Utc::now();
        assert_eq!(activity_verdict(None, now), "INACTIVE");
        assert_eq!(
            activity_verdict(Some(now - Duration::minutes(30)), now),
            "ACTIVE"
        );
        assert_eq!(
            activity_verdict(Some(now - Duration::hours(3)), now),
            "IDLE"
        );
        assert_eq!(
            activity_verdict(Some(now - Duration::hours(7)), now),
            "INACTIVE"
        );
    }

    #[test]
    fn verdict_boundary_is_exclusive() {
        let now = Utc::now();
        assert_eq!(activity_verdict(Some(now - Duration::hours(1)), now), "IDLE");
        assert_eq!(
            activity_verdict(Some(now - Duration::hours(6)), now),
            "INACTIVE"
        );
    }
}

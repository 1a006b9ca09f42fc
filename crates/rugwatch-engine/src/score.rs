//! Feature extraction and the additive trust score.

use chrono::{DateTime, Utc};
use serde::Serialize;

use rugwatch_core::{AccountProfile, Post};
use rugwatch_trust::TrustedSet;

use crate::spam::check_spam_patterns;
use crate::ScoringConfig;

/// Fixed vocabulary for bio keyword extraction, matched case-insensitively
/// as substrings. Results are reported in vocabulary order, not bio order.
const BIO_KEYWORDS: &[&str] = &[
    "crypto",
    "blockchain",
    "solana",
    "defi",
    "nft",
    "web3",
    "bitcoin",
    "ethereum",
    "trading",
    "investor",
    "developer",
    "founder",
    "ceo",
    "project",
    "token",
    "dapp",
];

const BASE_SCORE: i32 = 50;

/// The complete result of analyzing one account.
///
/// Keyed by the account's external id; the Processing Ledger upserts it
/// latest-wins. `follower_ratio` is `f64::INFINITY` when the account follows
/// nobody — every scoring rule treats the sentinel as "very high".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub account_id: String,
    pub handle: String,
    pub account_age_days: i64,
    pub follower_count: u64,
    pub following_count: u64,
    pub follower_ratio: f64,
    pub bio_length: usize,
    pub bio_keywords: Vec<String>,
    pub avg_engagement: f64,
    pub trusted_follower_count: usize,
    pub trusted_followers: Vec<String>,
    pub score: u8,
    pub risk_factors: Vec<String>,
    pub positive_indicators: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Analyze an account and produce its trust record.
///
/// Pure and deterministic: identical inputs (including `now`) produce an
/// identical record. Empty `posts` or `followers` are valid and yield
/// degraded-but-defined results, never an error; an absent profile is the
/// caller's concern.
#[must_use]
pub fn analyze(
    profile: &AccountProfile,
    posts: &[Post],
    followers: &[String],
    trusted: &TrustedSet,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> AnalysisRecord {
    let account_age_days = profile.account_age_days(now);
    let follower_ratio = follower_ratio(profile);
    let bio_length = profile.bio.chars().count();
    let bio_keywords = extract_bio_keywords(&profile.bio);
    let avg_engagement = average_engagement(posts);
    let (trusted_follower_count, trusted_followers) = trusted.intersect(followers);

    let score = compute_score(
        account_age_days,
        follower_ratio,
        trusted_follower_count,
        profile.verified,
        bio_length,
        !bio_keywords.is_empty(),
        avg_engagement,
    );

    let mut risk_factors = identify_risk_factors(
        account_age_days,
        follower_ratio,
        trusted_follower_count,
        bio_length,
        avg_engagement,
    );
    risk_factors.extend(check_spam_patterns(posts, config));

    let positive_indicators = identify_positive_indicators(
        account_age_days,
        trusted_follower_count,
        profile.verified,
        follower_ratio,
        !bio_keywords.is_empty(),
        avg_engagement,
    );

    AnalysisRecord {
        account_id: profile.id.clone(),
        handle: profile.handle.clone(),
        account_age_days,
        follower_count: profile.followers_count,
        following_count: profile.following_count,
        follower_ratio,
        bio_length,
        bio_keywords,
        avg_engagement,
        trusted_follower_count,
        trusted_followers,
        score,
        risk_factors,
        positive_indicators,
        analyzed_at: now,
    }
}

/// Followers divided by following, or the unbounded sentinel when the
/// account follows nobody. Never divides by zero.
#[allow(clippy::cast_precision_loss)]
fn follower_ratio(profile: &AccountProfile) -> f64 {
    if profile.following_count > 0 {
        profile.followers_count as f64 / profile.following_count as f64
    } else {
        f64::INFINITY
    }
}

/// Vocabulary terms present in the bio, in vocabulary order.
fn extract_bio_keywords(bio: &str) -> Vec<String> {
    if bio.is_empty() {
        return vec![];
    }
    let bio_lower = bio.to_lowercase();
    BIO_KEYWORDS
        .iter()
        .filter(|kw| bio_lower.contains(*kw))
        .map(|kw| (*kw).to_string())
        .collect()
}

/// Mean of total engagement across the sample; `0.0` when empty.
#[allow(clippy::cast_precision_loss)]
fn average_engagement(posts: &[Post]) -> f64 {
    if posts.is_empty() {
        return 0.0;
    }
    let total: u64 = posts.iter().map(Post::engagement).sum();
    total as f64 / posts.len() as f64
}

/// Base 50, additive rules per feature group, clamped to [0, 100].
///
/// Buckets within a group are mutually exclusive; groups apply
/// independently. Engagement checks the >50 bucket before >10 so a highly
/// engaged account earns the larger bonus.
#[allow(clippy::fn_params_excessive_bools)]
fn compute_score(
    account_age_days: i64,
    follower_ratio: f64,
    trusted_follower_count: usize,
    verified: bool,
    bio_length: usize,
    has_bio_keywords: bool,
    avg_engagement: f64,
) -> u8 {
    let mut score = BASE_SCORE;

    if account_age_days > 365 {
        score += 15;
    } else if account_age_days > 180 {
        score += 10;
    } else if account_age_days > 90 {
        score += 5;
    } else if account_age_days < 30 {
        score -= 20;
    }

    if (0.1..=10.0).contains(&follower_ratio) {
        score += 10;
    } else if follower_ratio > 100.0 {
        score -= 15;
    }

    if trusted_follower_count >= 3 {
        score += 25;
    } else if trusted_follower_count == 2 {
        score += 15;
    } else if trusted_follower_count == 1 {
        score += 5;
    }

    if verified {
        score += 10;
    }

    if bio_length > 50 && has_bio_keywords {
        score += 5;
    }

    if avg_engagement > 50.0 {
        score += 10;
    } else if avg_engagement > 10.0 {
        score += 5;
    }

    u8::try_from(score.clamp(0, 100)).unwrap_or(0)
}

fn identify_risk_factors(
    account_age_days: i64,
    follower_ratio: f64,
    trusted_follower_count: usize,
    bio_length: usize,
    avg_engagement: f64,
) -> Vec<String> {
    let mut risks = Vec::new();

    if account_age_days < 30 {
        risks.push("Very new account (less than 30 days)".to_string());
    }
    if follower_ratio > 50.0 {
        risks.push("Suspicious follower/following ratio".to_string());
    }
    if trusted_follower_count == 0 {
        risks.push("No trusted followers detected".to_string());
    }
    if bio_length < 20 {
        risks.push("Minimal bio information".to_string());
    }
    if avg_engagement < 1.0 {
        risks.push("Very low engagement rates".to_string());
    }

    risks
}

#[allow(clippy::fn_params_excessive_bools)]
fn identify_positive_indicators(
    account_age_days: i64,
    trusted_follower_count: usize,
    verified: bool,
    follower_ratio: f64,
    has_bio_keywords: bool,
    avg_engagement: f64,
) -> Vec<String> {
    let mut positives = Vec::new();

    if account_age_days > 365 {
        positives.push("Established account (1+ years)".to_string());
    }
    if trusted_follower_count >= 2 {
        positives.push(format!(
            "Followed by {trusted_follower_count} trusted accounts"
        ));
    }
    if verified {
        positives.push("Verified account".to_string());
    }
    if (0.1..=10.0).contains(&follower_ratio) {
        positives.push("Healthy follower/following ratio".to_string());
    }
    if has_bio_keywords {
        positives.push("Relevant bio keywords present".to_string());
    }
    if avg_engagement > 10.0 {
        positives.push("Good engagement rates".to_string());
    }

    positives
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rugwatch_trust::TrustedSet;

    fn profile(age_days: i64, followers: u64, following: u64, now: DateTime<Utc>) -> AccountProfile {
        AccountProfile {
            id: "1".to_string(),
            handle: "subject".to_string(),
            display_name: "Subject".to_string(),
            bio: String::new(),
            created_at: now - Duration::days(age_days),
            followers_count: followers,
            following_count: following,
            post_count: 0,
            verified: false,
        }
    }

    fn post(text: &str, likes: u64) -> Post {
        Post {
            id: "p".to_string(),
            text: text.to_string(),
            like_count: likes,
            repost_count: 0,
            reply_count: 0,
            quote_count: 0,
        }
    }

    fn trusted(handles: &[&str]) -> TrustedSet {
        TrustedSet::new(handles.iter().map(ToString::to_string).collect(), None)
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn established_trusted_account_clamps_to_100() {
        // age=400 (+15), ratio=2.0 (+10), trusted=3 (+25), unverified,
        // bio 60 chars with "defi" (+5), avg engagement 5 (+0):
        // 50+15+10+25+5 = 105 -> clamped to 100.
        let now = Utc::now();
        let mut p = profile(400, 1000, 500, now);
        p.bio = format!("defi person{}", " x".repeat(25));
        assert_eq!(p.bio.chars().count(), 61);

        let posts: Vec<Post> = (0..4).map(|i| post(&format!("update {i}"), 5)).collect();
        let followers = strings(&["alice", "bob", "carol", "dave"]);
        let set = trusted(&["alice", "bob", "carol"]);

        let record = analyze(&p, &posts, &followers, &set, now, &ScoringConfig::default());
        assert_eq!(record.score, 100);
        assert_eq!(record.trusted_follower_count, 3);
        assert_eq!(record.bio_keywords, strings(&["defi"]));
    }

    #[test]
    fn fresh_empty_account_scores_15() {
        // age=10 (-20), following=0 -> unbounded ratio (-15), trusted=0,
        // bio 5 chars, no engagement: 50-20-15 = 15.
        let now = Utc::now();
        let mut p = profile(10, 50, 0, now);
        p.bio = "hello".to_string();

        let record = analyze(&p, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
        assert_eq!(record.score, 15);
        assert!(record.follower_ratio.is_infinite());
        assert_eq!(
            record.risk_factors,
            strings(&[
                "Very new account (less than 30 days)",
                "Suspicious follower/following ratio",
                "No trusted followers detected",
                "Minimal bio information",
                "Very low engagement rates",
            ])
        );
        assert!(record.positive_indicators.is_empty());
    }

    #[test]
    fn unbounded_ratio_matches_over_100_bucket() {
        let now = Utc::now();
        let zero_following = profile(400, 10, 0, now);
        let extreme = profile(400, 100_000, 10, now);

        let a = analyze(&zero_following, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
        let b = analyze(&extreme, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
        // Both lose the same 15 points to the ratio rule.
        assert_eq!(a.score, b.score);
    }

    #[test]
    fn score_stays_in_bounds_for_empty_samples() {
        let now = Utc::now();
        let p = profile(0, 0, 0, now);
        let record = analyze(&p, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
        assert!(record.score <= 100);
        assert_eq!(record.avg_engagement, 0.0);
        // 50 - 20 (new) - 15 (unbounded ratio) = 15.
        assert_eq!(record.score, 15);
    }

    #[test]
    fn stacked_penalties_bottom_out_at_15() {
        // Worst case: new account, extreme ratio, nothing positive. The two
        // penalty groups can remove at most 35 points from the base 50.
        let now = Utc::now();
        let p = profile(5, 10_000, 10, now);
        let spam: Vec<Post> = (0..10).map(|_| post("buy now pump gem x100", 0)).collect();
        let record = analyze(&p, &spam, &[], &trusted(&[]), now, &ScoringConfig::default());
        assert_eq!(record.score, 15);
        assert!(record
            .risk_factors
            .contains(&"High content repetition detected".to_string()));
        assert!(record
            .risk_factors
            .contains(&"Excessive promotional content".to_string()));
    }

    #[test]
    fn age_buckets_are_mutually_exclusive() {
        let now = Utc::now();
        let cases = [(400, 65), (200, 60), (100, 55), (60, 50), (10, 30)];
        for (age, expected) in cases {
            let p = profile(age, 0, 10, now);
            // ratio 0.0 adds nothing; trusted 0; no posts -> only age moves the score.
            let record = analyze(&p, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
            assert_eq!(record.score, expected, "age {age} days");
        }
    }

    #[test]
    fn engagement_over_50_earns_larger_bonus() {
        let now = Utc::now();
        let p = profile(60, 0, 10, now);
        let busy: Vec<Post> = (0..5).map(|i| post(&format!("thread {i}"), 60)).collect();
        let modest: Vec<Post> = (0..5).map(|i| post(&format!("thread {i}"), 20)).collect();

        let high = analyze(&p, &busy, &[], &trusted(&[]), now, &ScoringConfig::default());
        let mid = analyze(&p, &modest, &[], &trusted(&[]), now, &ScoringConfig::default());
        assert_eq!(high.score, 60, "avg 60 -> +10");
        assert_eq!(mid.score, 55, "avg 20 -> +5");
    }

    #[test]
    fn trusted_count_embedded_in_positive_indicator() {
        let now = Utc::now();
        let p = profile(400, 100, 100, now);
        let followers = strings(&["alice", "bob"]);
        let record = analyze(
            &p,
            &[],
            &followers,
            &trusted(&["alice", "bob"]),
            now,
            &ScoringConfig::default(),
        );
        assert!(record
            .positive_indicators
            .contains(&"Followed by 2 trusted accounts".to_string()));
    }

    #[test]
    fn bio_bonus_requires_length_and_keyword() {
        let now = Utc::now();

        // Keyword but short bio: no +5.
        let mut short = profile(60, 0, 10, now);
        short.bio = "defi fan".to_string();
        let record = analyze(&short, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
        assert_eq!(record.score, 50);

        // Long bio but no keyword: no +5.
        let mut bland = profile(60, 0, 10, now);
        bland.bio = "a".repeat(60);
        let record = analyze(&bland, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
        assert_eq!(record.score, 50);

        // Both: +5.
        let mut both = profile(60, 0, 10, now);
        both.bio = format!("defi{}", "a".repeat(60));
        let record = analyze(&both, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
        assert_eq!(record.score, 55);
    }

    #[test]
    fn bio_keywords_report_in_vocabulary_order() {
        let now = Utc::now();
        let mut p = profile(60, 0, 10, now);
        p.bio = "token maximalist, crypto native, defi builder".to_string();
        let record = analyze(&p, &[], &[], &trusted(&[]), now, &ScoringConfig::default());
        assert_eq!(record.bio_keywords, strings(&["crypto", "defi", "token"]));
    }

    #[test]
    fn analysis_is_deterministic() {
        let now = Utc::now();
        let mut p = profile(200, 500, 250, now);
        p.bio = "web3 founder building a project".to_string();
        let posts = vec![post("gm", 12), post("shipping", 30)];
        let followers = strings(&["alice"]);
        let set = trusted(&["alice", "bob"]);
        let config = ScoringConfig::default();

        let a = analyze(&p, &posts, &followers, &set, now, &config);
        let b = analyze(&p, &posts, &followers, &set, now, &config);
        assert_eq!(a, b);
    }
}

//! Shared domain types consumed by the analyzer and the X API client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A social account's profile as returned by the platform.
///
/// Counts are unsigned by construction; `created_at` is expected to be in
/// the past (the platform guarantees it), and age computations saturate at
/// zero rather than going negative if it is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Opaque stable identifier assigned by the platform.
    pub id: String,
    /// Public handle, unique and case-insensitive.
    pub handle: String,
    pub display_name: String,
    /// Free-text bio; empty string when the account has none.
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub followers_count: u64,
    pub following_count: u64,
    pub post_count: u64,
    pub verified: bool,
}

impl AccountProfile {
    /// Whole days since account creation, relative to the supplied clock.
    #[must_use]
    pub fn account_age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }
}

/// One post from an account's recent timeline, with engagement counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub like_count: u64,
    pub repost_count: u64,
    pub reply_count: u64,
    pub quote_count: u64,
}

impl Post {
    /// Total engagement: likes + reposts + replies + quotes.
    #[must_use]
    pub fn engagement(&self) -> u64 {
        self.like_count + self.repost_count + self.reply_count + self.quote_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(created_at: DateTime<Utc>) -> AccountProfile {
        AccountProfile {
            id: "1".to_string(),
            handle: "someone".to_string(),
            display_name: "Someone".to_string(),
            bio: String::new(),
            created_at,
            followers_count: 0,
            following_count: 0,
            post_count: 0,
            verified: false,
        }
    }

    #[test]
    fn account_age_counts_whole_days() {
        let now = Utc::now();
        let p = profile(now - Duration::days(400));
        assert_eq!(p.account_age_days(now), 400);
    }

    #[test]
    fn account_age_saturates_at_zero_for_future_created_at() {
        let now = Utc::now();
        let p = profile(now + Duration::days(3));
        assert_eq!(p.account_age_days(now), 0);
    }

    #[test]
    fn engagement_sums_all_counters() {
        let post = Post {
            id: "1".to_string(),
            text: "gm".to_string(),
            like_count: 3,
            repost_count: 2,
            reply_count: 1,
            quote_count: 4,
        };
        assert_eq!(post.engagement(), 10);
    }
}

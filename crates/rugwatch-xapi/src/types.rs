//! Wire types for X API v2 responses, plus the small public types the
//! orchestrator consumes.

use chrono::{DateTime, Utc};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A post that matched the trigger search, with its reply target when it is
/// itself a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub id: String,
    pub text: String,
    pub author_id: String,
    /// Id of the post this mention replies to, if any.
    pub replied_to: Option<String>,
}

/// The resolved author of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostAuthor {
    pub id: String,
    pub handle: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct UserData {
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub public_metrics: UserMetrics,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserMetrics {
    pub followers_count: u64,
    pub following_count: u64,
    pub tweet_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TweetData {
    pub id: String,
    pub text: String,
    pub public_metrics: TweetMetrics,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TweetMetrics {
    pub retweet_count: u64,
    pub reply_count: u64,
    pub like_count: u64,
    pub quote_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FollowerData {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchTweetData {
    pub id: String,
    pub text: String,
    pub author_id: String,
    #[serde(default)]
    pub referenced_tweets: Vec<ReferencedTweet>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReferencedTweet {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IncludedUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedTweet {
    pub id: String,
}

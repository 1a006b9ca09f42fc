//! HTTP client for the X API v2.
//!
//! Wraps `reqwest` with bearer auth, typed response deserialization, and
//! retry-with-backoff around the read endpoints. Reply posting is never
//! retried: a retried create after an ambiguous network failure could
//! publish the same reply twice.

use std::time::Duration;

use reqwest::{header, Client, StatusCode, Url};

use rugwatch_core::{AccountProfile, Post};

use crate::error::XApiError;
use crate::retry::retry_with_backoff;
use crate::types::{
    CreatedTweet, FollowerData, IncludedUser, Mention, PostAuthor, SearchTweetData, TweetData,
    UserData,
};

const DEFAULT_BASE_URL: &str = "https://api.x.com";

/// Platform limit on reply length, in characters.
const MAX_REPLY_CHARS: usize = 280;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Client for the X API v2.
///
/// Use [`XApiClient::new`] for production or [`XApiClient::with_base_url`] to
/// point at a mock server in tests.
pub struct XApiClient {
    client: Client,
    bearer_token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl XApiClient {
    /// Creates a new client pointed at the production X API.
    ///
    /// # Errors
    ///
    /// Returns [`XApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        bearer_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, XApiError> {
        Self::with_base_url(
            bearer_token,
            timeout_secs,
            max_retries,
            backoff_base_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`XApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`XApiError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        bearer_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, XApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rugwatch/0.1 (account-analysis)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join appends path segments instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| XApiError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            bearer_token: bearer_token.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches an account profile by handle.
    ///
    /// Returns `Ok(None)` when the platform reports no such user — the
    /// caller decides whether that is an error.
    ///
    /// # Errors
    ///
    /// - [`XApiError::Http`] on network failure or non-2xx HTTP status.
    /// - [`XApiError::RateLimited`] on HTTP 429 once retries are exhausted.
    /// - [`XApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn get_user_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<AccountProfile>, XApiError> {
        let url = self.build_url(
            &format!("2/users/by/username/{handle}"),
            &[(
                "user.fields",
                "created_at,description,public_metrics,verified",
            )],
        );

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.get_json(&url)
        })
        .await?;

        let Some(data) = body.get("data") else {
            return Ok(None);
        };
        let user: UserData =
            serde_json::from_value(data.clone()).map_err(|e| XApiError::Deserialize {
                context: format!("get_user_by_handle({handle})"),
                source: e,
            })?;

        Ok(Some(AccountProfile {
            id: user.id,
            handle: user.username,
            display_name: user.name,
            bio: user.description,
            created_at: user.created_at,
            followers_count: user.public_metrics.followers_count,
            following_count: user.public_metrics.following_count,
            post_count: user.public_metrics.tweet_count,
            verified: user.verified,
        }))
    }

    /// Fetches an account's most recent posts with engagement metrics.
    ///
    /// Returns an empty vec when the account has no posts.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`XApiClient::get_user_by_handle`].
    pub async fn get_recent_posts(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Post>, XApiError> {
        let limit = limit.to_string();
        let url = self.build_url(
            &format!("2/users/{user_id}/tweets"),
            &[
                ("max_results", limit.as_str()),
                ("tweet.fields", "public_metrics"),
            ],
        );

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.get_json(&url)
        })
        .await?;

        let Some(data) = body.get("data") else {
            return Ok(vec![]);
        };
        let tweets: Vec<TweetData> =
            serde_json::from_value(data.clone()).map_err(|e| XApiError::Deserialize {
                context: format!("get_recent_posts({user_id})"),
                source: e,
            })?;

        Ok(tweets
            .into_iter()
            .map(|t| Post {
                id: t.id,
                text: t.text,
                like_count: t.public_metrics.like_count,
                repost_count: t.public_metrics.retweet_count,
                reply_count: t.public_metrics.reply_count,
                quote_count: t.public_metrics.quote_count,
            })
            .collect())
    }

    /// Fetches a bounded sample of the account's followers (handles only).
    ///
    /// The sample is a lower-bound signal, never the true follower set.
    /// Returns an empty vec when the platform reports no followers.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`XApiClient::get_user_by_handle`].
    pub async fn get_follower_sample(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<String>, XApiError> {
        let limit = limit.to_string();
        let url = self.build_url(
            &format!("2/users/{user_id}/followers"),
            &[
                ("max_results", limit.as_str()),
                ("user.fields", "username"),
            ],
        );

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.get_json(&url)
        })
        .await?;

        let Some(data) = body.get("data") else {
            return Ok(vec![]);
        };
        let followers: Vec<FollowerData> =
            serde_json::from_value(data.clone()).map_err(|e| XApiError::Deserialize {
                context: format!("get_follower_sample({user_id})"),
                source: e,
            })?;

        Ok(followers.into_iter().map(|f| f.username).collect())
    }

    /// Searches recent posts for `query` and returns matches with their
    /// reply targets.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`XApiClient::get_user_by_handle`].
    pub async fn search_mentions(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Mention>, XApiError> {
        let limit = limit.to_string();
        let url = self.build_url(
            "2/tweets/search/recent",
            &[
                ("query", query),
                ("max_results", limit.as_str()),
                ("tweet.fields", "author_id,referenced_tweets"),
            ],
        );

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.get_json(&url)
        })
        .await?;

        let Some(data) = body.get("data") else {
            return Ok(vec![]);
        };
        let tweets: Vec<SearchTweetData> =
            serde_json::from_value(data.clone()).map_err(|e| XApiError::Deserialize {
                context: format!("search_mentions({query})"),
                source: e,
            })?;

        Ok(tweets
            .into_iter()
            .map(|t| {
                let replied_to = t
                    .referenced_tweets
                    .iter()
                    .find(|r| r.kind == "replied_to")
                    .map(|r| r.id.clone());
                Mention {
                    id: t.id,
                    text: t.text,
                    author_id: t.author_id,
                    replied_to,
                }
            })
            .collect())
    }

    /// Resolves the author of a post.
    ///
    /// Returns `Ok(None)` when the post is gone or the author expansion is
    /// missing (deleted/suspended accounts).
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`XApiClient::get_user_by_handle`].
    pub async fn get_post_author(&self, post_id: &str) -> Result<Option<PostAuthor>, XApiError> {
        let url = self.build_url(
            &format!("2/tweets/{post_id}"),
            &[("expansions", "author_id"), ("user.fields", "username")],
        );

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.get_json(&url)
        })
        .await?;

        let Some(author_id) = body
            .get("data")
            .and_then(|d| d.get("author_id"))
            .and_then(serde_json::Value::as_str)
        else {
            return Ok(None);
        };

        let Some(users) = body.get("includes").and_then(|i| i.get("users")) else {
            return Ok(None);
        };
        let users: Vec<IncludedUser> =
            serde_json::from_value(users.clone()).map_err(|e| XApiError::Deserialize {
                context: format!("get_post_author({post_id})"),
                source: e,
            })?;

        Ok(users
            .into_iter()
            .find(|u| u.id == author_id)
            .map(|u| PostAuthor {
                id: u.id,
                handle: u.username,
            }))
    }

    /// Posts a reply to an existing post and returns the new post's id.
    ///
    /// Messages longer than the platform limit are truncated to 277
    /// characters plus `"..."` before sending. The request is deliberately
    /// not retried — a duplicate reply is worse than a missed one; the
    /// triggering event stays unmarked and is picked up on a later cycle.
    ///
    /// # Errors
    ///
    /// - [`XApiError::Http`] on network failure or non-2xx HTTP status.
    /// - [`XApiError::RateLimited`] on HTTP 429.
    /// - [`XApiError::Api`] if the response carries no created post.
    pub async fn post_reply(&self, in_reply_to: &str, text: &str) -> Result<String, XApiError> {
        let message = truncate_reply(text);
        let url = self.build_url("2/tweets", &[]);
        let payload = serde_json::json!({
            "text": message,
            "reply": { "in_reply_to_tweet_id": in_reply_to }
        });

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.bearer_token)
            .json(&payload)
            .send()
            .await?;
        let body = Self::check_response(response, &url).await?;

        let Some(data) = body.get("data") else {
            return Err(XApiError::Api(
                "reply creation returned no data".to_string(),
            ));
        };
        let created: CreatedTweet =
            serde_json::from_value(data.clone()).map_err(|e| XApiError::Deserialize {
                context: format!("post_reply({in_reply_to})"),
                source: e,
            })?;

        Ok(created.id)
    }

    /// Builds the full request URL with properly percent-encoded query
    /// parameters via [`Url::query_pairs_mut`].
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self
            .base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends a GET request with bearer auth and parses the body as JSON.
    async fn get_json(&self, url: &Url) -> Result<serde_json::Value, XApiError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        Self::check_response(response, url).await
    }

    /// Maps 429 to [`XApiError::RateLimited`], asserts a 2xx status, and
    /// parses the body as JSON.
    async fn check_response(
        response: reqwest::Response,
        url: &Url,
    ) -> Result<serde_json::Value, XApiError> {
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(XApiError::RateLimited { retry_after_secs });
        }
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| XApiError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

/// Truncate a reply to the platform's character limit.
fn truncate_reply(text: &str) -> String {
    if text.chars().count() <= MAX_REPLY_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_REPLY_CHARS - 3).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> XApiClient {
        XApiClient::with_base_url("test-token", 30, 0, 0, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_joins_path_and_query() {
        let client = test_client("https://api.x.com");
        let url = client.build_url("2/users/by/username/someone", &[("user.fields", "verified")]);
        assert_eq!(
            url.as_str(),
            "https://api.x.com/2/users/by/username/someone?user.fields=verified"
        );
    }

    #[test]
    fn build_url_strips_trailing_slash() {
        let client = test_client("https://api.x.com/");
        let url = client.build_url("2/tweets", &[]);
        assert_eq!(url.as_str(), "https://api.x.com/2/tweets");
    }

    #[test]
    fn build_url_encodes_special_characters() {
        let client = test_client("https://api.x.com");
        let url = client.build_url(
            "2/tweets/search/recent",
            &[("query", "\"riddle me this\" -is:retweet")],
        );
        assert!(
            !url.query().unwrap_or_default().contains('"'),
            "query param should be percent-encoded: {url}"
        );
    }

    #[test]
    fn truncate_reply_leaves_short_messages_alone() {
        assert_eq!(truncate_reply("short"), "short");
    }

    #[test]
    fn truncate_reply_caps_at_280_chars() {
        let long = "x".repeat(400);
        let truncated = truncate_reply(&long);
        assert_eq!(truncated.chars().count(), 280);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn truncate_reply_exact_limit_is_untouched() {
        let exact = "y".repeat(280);
        assert_eq!(truncate_reply(&exact), exact);
    }
}

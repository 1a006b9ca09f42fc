//! Fetching and parsing the remote trusted-accounts list.
//!
//! The source is a newline-delimited text file: one handle per line, `#`
//! lines are comments, leading `@` is cosmetic.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Client, Url};

use crate::TrustError;

/// HTTP client for the raw trusted-list source.
///
/// Use [`TrustListClient::new`] for production or point `url` at a mock
/// server in tests.
pub struct TrustListClient {
    client: Client,
    url: Url,
}

impl TrustListClient {
    /// Creates a client for the given list URL.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`TrustError::InvalidUrl`] if `url` does
    /// not parse.
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, TrustError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rugwatch/0.1 (trusted-list)")
            .build()?;

        let url = Url::parse(url).map_err(|e| TrustError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, url })
    }

    /// Fetches the raw list body.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Http`] on network failure or non-2xx status.
    pub async fn fetch(&self) -> Result<String, TrustError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Parse a raw trusted-list body into normalized handles.
///
/// Skips empty and `#`-comment lines, strips any leading `@`, lower-cases,
/// and deduplicates while preserving first-occurrence order.
#[must_use]
pub fn parse_trust_list(text: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut handles = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let handle = line.trim_start_matches('@').to_lowercase();
        if handle.is_empty() {
            continue;
        }
        if seen.insert(handle.clone()) {
            handles.push(handle);
        }
    }

    handles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_and_skips_comments() {
        let text = "@alice\n# comment\n\nBOB";
        assert_eq!(
            parse_trust_list(text),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[test]
    fn parse_deduplicates_preserving_first_occurrence() {
        let text = "@alice\nbob\nALICE\n@Bob";
        assert_eq!(
            parse_trust_list(text),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let text = "  @carol  \r\n\tdave\t";
        assert_eq!(
            parse_trust_list(text),
            vec!["carol".to_string(), "dave".to_string()]
        );
    }

    #[test]
    fn parse_empty_body_yields_empty_list() {
        assert!(parse_trust_list("").is_empty());
        assert!(parse_trust_list("# only comments\n#more").is_empty());
    }

    #[test]
    fn parse_bare_at_sign_is_skipped() {
        assert_eq!(parse_trust_list("@\nalice"), vec!["alice".to_string()]);
    }
}

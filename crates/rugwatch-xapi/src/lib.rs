//! Typed client for the X (Twitter) API v2.
//!
//! Covers the small surface the analyzer needs: user lookup, recent posts,
//! follower samples, recent-mention search, replied-to author resolution, and
//! reply posting. Network failures and 5xx/429 responses are retried with
//! exponential back-off; application-level errors are not.

mod client;
mod error;
mod retry;
mod types;

pub use client::XApiClient;
pub use error::XApiError;
pub use types::{Mention, PostAuthor};

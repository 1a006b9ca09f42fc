//! Trusted-account cache: a curated list of handles fetched from a remote
//! source, persisted with a time-to-live, and intersected against follower
//! samples during analysis.
//!
//! The persisted set is only ever replaced wholesale; a failed refresh keeps
//! the previous set usable (stale-but-available).

mod cache;
mod set;
mod source;

pub use cache::TrustedAccountCache;
pub use set::TrustedSet;
pub use source::{parse_trust_list, TrustListClient};

use thiserror::Error;

/// Errors from fetching or persisting the trusted-accounts list.
#[derive(Debug, Error)]
pub enum TrustError {
    /// Network or TLS failure fetching the remote list.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured list URL could not be parsed.
    #[error("invalid trusted list URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The fetched list parsed to zero handles; the previous set is kept.
    #[error("trusted list fetch returned no entries")]
    EmptyList,

    /// Persistence failure reading or replacing the cached set.
    #[error(transparent)]
    Db(#[from] rugwatch_db::DbError),
}

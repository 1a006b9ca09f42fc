//! Pure trust-scoring engine.
//!
//! [`analyze`] turns an account profile, a recent-post sample, a follower
//! sample, and the trusted set into an [`AnalysisRecord`] — a 0–100 score
//! plus human-readable risk factors and positive indicators. The function is
//! deterministic given identical inputs: no network, no storage, and the
//! clock is injected by the caller.

mod report;
mod score;
mod spam;

pub use report::{render_report, TrustTier};
pub use score::{analyze, AnalysisRecord};

/// Tunable thresholds for the spam-pattern checks.
///
/// The defaults match the historical behavior: a sample is repetitive when
/// fewer than half its texts are distinct, and promotional when more than
/// 70 % of posts contain a promo term.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub repetition_threshold: f64,
    pub promo_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            repetition_threshold: 0.5,
            promo_threshold: 0.7,
        }
    }
}

impl ScoringConfig {
    #[must_use]
    pub fn from_app_config(config: &rugwatch_core::AppConfig) -> Self {
        Self {
            repetition_threshold: config.spam_repetition_threshold,
            promo_threshold: config.spam_promo_threshold,
        }
    }
}

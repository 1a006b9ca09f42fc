//! Spam-pattern checks over the recent-post sample.

use std::collections::HashSet;

use rugwatch_core::Post;

use crate::ScoringConfig;

/// Fixed promotional vocabulary, matched case-insensitively as substrings.
const PROMO_TERMS: &[&str] = &["buy", "sell", "pump", "moon", "gem", "x100"];

/// Flag repetition and promotional patterns in the sample.
///
/// Repetition: fewer distinct texts than `total × repetition_threshold`.
/// Promotion: more than `total × promo_threshold` posts contain a promo
/// term. Both checks no-op on an empty sample.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn check_spam_patterns(posts: &[Post], config: &ScoringConfig) -> Vec<String> {
    if posts.is_empty() {
        return vec![];
    }

    let mut indicators = Vec::new();
    let total = posts.len() as f64;

    let distinct: HashSet<&str> = posts.iter().map(|p| p.text.as_str()).collect();
    if (distinct.len() as f64) < total * config.repetition_threshold {
        indicators.push("High content repetition detected".to_string());
    }

    let promo_count = posts
        .iter()
        .filter(|p| {
            let text = p.text.to_lowercase();
            PROMO_TERMS.iter().any(|term| text.contains(term))
        })
        .count();
    if (promo_count as f64) > total * config.promo_threshold {
        indicators.push("Excessive promotional content".to_string());
    }

    indicators
}

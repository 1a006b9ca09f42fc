//! Rendering an analysis into a short human-readable report.
//!
//! Presentation only — the tier boundaries (80/60/40) are the contract,
//! the text layout is not.

use std::fmt::Write as _;

use crate::score::AnalysisRecord;

/// At most this many risk factors appear in a rendered report.
const MAX_REPORT_RISKS: usize = 3;
/// At most this many positive indicators appear in a rendered report.
const MAX_REPORT_POSITIVES: usize = 2;

/// Discrete trust bands derived from the 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustTier {
    HighTrust,
    ModerateTrust,
    LowTrust,
    HighRisk,
}

impl TrustTier {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            TrustTier::HighTrust
        } else if score >= 60 {
            TrustTier::ModerateTrust
        } else if score >= 40 {
            TrustTier::LowTrust
        } else {
            TrustTier::HighRisk
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TrustTier::HighTrust => "HIGH TRUST",
            TrustTier::ModerateTrust => "MODERATE TRUST",
            TrustTier::LowTrust => "LOW TRUST",
            TrustTier::HighRisk => "HIGH RISK",
        }
    }
}

/// Render a bounded plain-text summary of an analysis.
#[must_use]
pub fn render_report(record: &AnalysisRecord) -> String {
    let tier = TrustTier::from_score(record.score);

    let mut report = format!("RUGWATCH ANALYSIS: @{}\n", record.handle);
    let _ = writeln!(
        report,
        "Trust level: {} ({}/100)",
        tier.label(),
        record.score
    );
    report.push('\n');
    let _ = writeln!(report, "Account age: {} days", record.account_age_days);
    let _ = writeln!(report, "Followers: {}", record.follower_count);
    let _ = writeln!(
        report,
        "Trusted connections: {}",
        record.trusted_follower_count
    );

    if !record.risk_factors.is_empty() {
        report.push_str("\nRisk factors:\n");
        for risk in record.risk_factors.iter().take(MAX_REPORT_RISKS) {
            let _ = writeln!(report, "- {risk}");
        }
    }

    if !record.positive_indicators.is_empty() {
        report.push_str("\nPositive signs:\n");
        for positive in record.positive_indicators.iter().take(MAX_REPORT_POSITIVES) {
            let _ = writeln!(report, "- {positive}");
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(score: u8) -> AnalysisRecord {
        AnalysisRecord {
            account_id: "1".to_string(),
            handle: "subject".to_string(),
            account_age_days: 400,
            follower_count: 1200,
            following_count: 600,
            follower_ratio: 2.0,
            bio_length: 60,
            bio_keywords: vec!["defi".to_string()],
            avg_engagement: 12.0,
            trusted_follower_count: 3,
            trusted_followers: vec![
                "alice".to_string(),
                "bob".to_string(),
                "carol".to_string(),
            ],
            score,
            risk_factors: vec![],
            positive_indicators: vec![],
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn tier_boundaries_are_80_60_40() {
        assert_eq!(TrustTier::from_score(100), TrustTier::HighTrust);
        assert_eq!(TrustTier::from_score(80), TrustTier::HighTrust);
        assert_eq!(TrustTier::from_score(79), TrustTier::ModerateTrust);
        assert_eq!(TrustTier::from_score(60), TrustTier::ModerateTrust);
        assert_eq!(TrustTier::from_score(59), TrustTier::LowTrust);
        assert_eq!(TrustTier::from_score(40), TrustTier::LowTrust);
        assert_eq!(TrustTier::from_score(39), TrustTier::HighRisk);
        assert_eq!(TrustTier::from_score(0), TrustTier::HighRisk);
    }

    #[test]
    fn report_includes_handle_tier_and_score() {
        let rendered = render_report(&record(85));
        assert!(rendered.contains("@subject"));
        assert!(rendered.contains("HIGH TRUST (85/100)"));
        assert!(rendered.contains("Account age: 400 days"));
        assert!(rendered.contains("Trusted connections: 3"));
    }

    #[test]
    fn report_caps_risks_at_three_and_positives_at_two() {
        let mut r = record(30);
        r.risk_factors = (1..=5).map(|i| format!("risk {i}")).collect();
        r.positive_indicators = (1..=4).map(|i| format!("positive {i}")).collect();

        let rendered = render_report(&r);
        assert!(rendered.contains("risk 3"));
        assert!(!rendered.contains("risk 4"));
        assert!(rendered.contains("positive 2"));
        assert!(!rendered.contains("positive 3"));
    }

    #[test]
    fn report_omits_empty_sections() {
        let rendered = render_report(&record(70));
        assert!(!rendered.contains("Risk factors:"));
        assert!(!rendered.contains("Positive signs:"));
    }
}

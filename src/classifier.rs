//! Verification classifier and confidence scorer
//!
//! Labels each screened transaction for display:
//! - Clear: no rules triggered, nothing to review
//! - Pass: rules triggered and the reasoning step agreed the flag holds up
//! - Conflict: rules triggered but the reasoning step failed, was weak,
//!   skipped, or came back unrecognized

use crate::models::Verdict;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Clear,
    Pass,
    Conflict,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationStatus::Clear => "CLEAR",
            VerificationStatus::Pass => "PASS",
            VerificationStatus::Conflict => "CONFLICT",
        };
        write!(f, "{}", s)
    }
}

/// Confidence buckets driving the indicator bar. Presentation heuristics,
/// not calibrated probabilities.
const CONFIDENCE_CLEAR: u8 = 100;
const CONFIDENCE_PASS: u8 = 85;
const CONFIDENCE_CONFLICT: u8 = 45;

/// Verification classifier
pub struct VerificationClassifier;

impl VerificationClassifier {
    /// Classify a transaction for display.
    ///
    /// A transaction with no triggered rules is always clear, whatever the
    /// raw verdict says — the verdict is only meaningful for flagged rows.
    pub fn classify(rules: &[String], verdict: Verdict) -> VerificationStatus {
        if rules.is_empty() {
            VerificationStatus::Clear
        } else if verdict == Verdict::Pass {
            VerificationStatus::Pass
        } else {
            VerificationStatus::Conflict
        }
    }

    /// Confidence score in [0, 100].
    ///
    /// Derived from `classify` so the two mappings share branch conditions
    /// and cannot drift apart.
    pub fn confidence(rules: &[String], verdict: Verdict) -> u8 {
        match Self::classify(rules, verdict) {
            VerificationStatus::Clear => CONFIDENCE_CLEAR,
            VerificationStatus::Pass => CONFIDENCE_PASS,
            VerificationStatus::Conflict => CONFIDENCE_CONFLICT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VERDICTS: &[Verdict] = &[
        Verdict::Pass,
        Verdict::Fail,
        Verdict::WeakReasoning,
        Verdict::Skipped,
        Verdict::Unknown,
    ];

    fn flagged() -> Vec<String> {
        vec![
            "R1_HIGH_RISK_JURISDICTION".to_string(),
            "R3_RAPID_FUNDS_MOVEMENT".to_string(),
        ]
    }

    #[test]
    fn test_no_rules_is_clear_for_every_verdict() {
        for &verdict in ALL_VERDICTS {
            assert_eq!(
                VerificationClassifier::classify(&[], verdict),
                VerificationStatus::Clear
            );
            assert_eq!(VerificationClassifier::confidence(&[], verdict), 100);
        }
    }

    #[test]
    fn test_flagged_pass() {
        let rules = flagged();
        assert_eq!(
            VerificationClassifier::classify(&rules, Verdict::Pass),
            VerificationStatus::Pass
        );
        assert_eq!(VerificationClassifier::confidence(&rules, Verdict::Pass), 85);
    }

    #[test]
    fn test_flagged_non_pass_is_conflict() {
        let rules = flagged();
        for &verdict in &[
            Verdict::Fail,
            Verdict::WeakReasoning,
            Verdict::Skipped,
            Verdict::Unknown,
        ] {
            assert_eq!(
                VerificationClassifier::classify(&rules, verdict),
                VerificationStatus::Conflict
            );
            assert_eq!(VerificationClassifier::confidence(&rules, verdict), 45);
        }
    }

    #[test]
    fn test_single_rule_is_enough_to_flag() {
        let rules = vec!["R2_STRUCTURING_SMURFING".to_string()];
        assert_eq!(
            VerificationClassifier::classify(&rules, Verdict::Fail),
            VerificationStatus::Conflict
        );
    }
}

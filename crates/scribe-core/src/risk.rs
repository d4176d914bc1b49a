//! Risk classification over similar historical cases.
//!
//! Pure aggregation: partition retrieved cases by approval outcome and map
//! the count of non-approved matches to a coarse risk level. Retrieval (and
//! its failure handling) lives in `scribe-runtime`.

use crate::types::{ReferenceCase, RiskAssessment, RiskLevel};
use std::collections::HashSet;

/// At most this many deduplicated rejection reasons are reported.
pub const MAX_COMMON_MISTAKES: usize = 5;

/// Recommendation attached to a low-risk assessment.
pub const LOW_RISK_RECOMMENDATION: &str =
    "Keep following the practices seen in approved projects";

/// Fixed recommendations attached to medium and high risk assessments.
pub const ELEVATED_RISK_RECOMMENDATIONS: [&str; 4] = [
    "Review the budget in detail",
    "Make every objective measurable",
    "Document the team's qualifications",
    "Describe the methodology step by step",
];

/// Classify risk from similar cases.
///
/// Zero non-approved matches is low risk; one is medium; two or more is
/// high. Rejection reasons from the non-approved matches are deduplicated
/// in first-seen order and capped at [`MAX_COMMON_MISTAKES`].
pub fn classify(cases: &[ReferenceCase]) -> RiskAssessment {
    let non_approved: Vec<&ReferenceCase> =
        cases.iter().filter(|case| !case.is_approved()).collect();
    tracing::debug!(
        total = cases.len(),
        non_approved = non_approved.len(),
        "classifying risk from similar cases"
    );

    if non_approved.is_empty() {
        return RiskAssessment {
            risk_level: RiskLevel::Low,
            common_mistakes: Vec::new(),
            recommendations: vec![LOW_RISK_RECOMMENDATION.to_string()],
        };
    }

    let risk_level = if non_approved.len() >= 2 {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    };

    let mut seen = HashSet::new();
    let common_mistakes: Vec<String> = non_approved
        .iter()
        .flat_map(|case| case.rejection_reasons.iter())
        .filter(|reason| seen.insert(reason.as_str()))
        .take(MAX_COMMON_MISTAKES)
        .cloned()
        .collect();

    RiskAssessment {
        risk_level,
        common_mistakes,
        recommendations: ELEVATED_RISK_RECOMMENDATIONS
            .iter()
            .map(|r| r.to_string())
            .collect(),
    }
}

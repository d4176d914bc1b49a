//! Approval-risk assessment over retrieved reference cases.
//!
//! Pulls the closest cases for a project regardless of approval outcome,
//! then delegates classification to `scribe_core::risk`. A retrieval
//! failure maps to [`RiskLevel::Unknown`], never to a fabricated Low.

use scribe_core::{risk, ProjectContext, RiskAssessment, RiskLevel};

use crate::retrieval::CaseRetriever;

/// How many similar cases feed one assessment.
pub const RISK_CASE_LIMIT: usize = 3;

/// Assesses how likely a project is to face approval trouble.
pub struct RiskAnalyzer {
    retriever: CaseRetriever,
}

impl RiskAnalyzer {
    /// Create an analyzer over a case retriever.
    pub fn new(retriever: CaseRetriever) -> Self {
        Self { retriever }
    }

    /// Assess a project against its closest precedents.
    ///
    /// Rejected cases are the signal here, so the retrieval deliberately
    /// does not filter on approval.
    pub async fn assess(&self, context: &ProjectContext) -> RiskAssessment {
        let field_hint = (!context.project_type.is_empty()).then_some(context.project_type.as_str());

        match self
            .retriever
            .try_find(context.query_text(), field_hint, false, RISK_CASE_LIMIT)
            .await
        {
            Ok(cases) => {
                let assessment = risk::classify(&cases);
                tracing::info!(
                    title = %context.title,
                    risk_level = ?assessment.risk_level,
                    cases = cases.len(),
                    "risk assessment complete"
                );
                assessment
            }
            Err(error) => {
                tracing::warn!(%error, title = %context.title, "risk assessment degraded");
                RiskAssessment {
                    risk_level: RiskLevel::Unknown,
                    common_mistakes: Vec::new(),
                    recommendations: Vec::new(),
                }
            }
        }
    }
}

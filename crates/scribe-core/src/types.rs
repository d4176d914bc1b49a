//! Shared data model for retrieval-grounded generation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Provider sentinel for the deterministic fallback path.
pub const REFERENCE_ONLY_PROVIDER: &str = "reference-only";

/// Errors from constructing a malformed request.
///
/// This is the only failure that reaches callers of the generation path;
/// everything downstream degrades instead of erroring.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("field name must not be empty")]
    EmptyFieldName,

    #[error("max_length must be positive")]
    ZeroMaxLength,
}

/// Context describing the project a field is being written for.
///
/// All attributes are free text; empty strings mean "not provided".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Project title
    #[serde(default)]
    pub title: String,

    /// Submitting institution
    #[serde(default)]
    pub institution: String,

    /// Project type (e.g. "service expansion", "research")
    #[serde(default)]
    pub project_type: String,

    /// Free-text description, used as the retrieval query
    #[serde(default)]
    pub description: String,
}

impl ProjectContext {
    /// Text used as the semantic retrieval query for this project.
    ///
    /// Prefers the description; falls back to the title.
    pub fn query_text(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.title
        } else {
            &self.description
        }
    }
}

/// A retrieved similar historical case used to ground generation.
///
/// Read-only downstream of retrieval; relevance is always clamped to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceCase {
    /// Case identifier from the vector index
    pub id: String,

    /// Cosine similarity to the query, clamped to [0, 1]
    pub relevance: f32,

    /// Free-text excerpt from the case
    #[serde(default)]
    pub excerpt: String,

    /// Per-field texts from the case document, when available.
    ///
    /// BTreeMap keeps iteration order deterministic.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// Whether the case was approved, when known
    #[serde(default)]
    pub approved: Option<bool>,

    /// Reviewer notes explaining rejection, when the case was not approved
    #[serde(default)]
    pub rejection_reasons: Vec<String>,
}

impl ReferenceCase {
    /// Create a case with a clamped relevance score.
    pub fn new(id: impl Into<String>, relevance: f32, excerpt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            relevance: relevance.clamp(0.0, 1.0),
            excerpt: excerpt.into(),
            fields: BTreeMap::new(),
            approved: None,
            rejection_reasons: Vec::new(),
        }
    }

    /// Attach a per-field text.
    pub fn with_field(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.insert(field.into(), text.into());
        self
    }

    /// Set the approval flag.
    pub fn with_approved(mut self, approved: bool) -> Self {
        self.approved = Some(approved);
        self
    }

    /// Attach rejection reasons.
    pub fn with_rejection_reasons(mut self, reasons: Vec<String>) -> Self {
        self.rejection_reasons = reasons;
        self
    }

    /// Best excerpt for a given field: the field-specific text when the
    /// case carries one, otherwise the free-text excerpt.
    pub fn excerpt_for(&self, field: &str) -> &str {
        self.fields
            .get(field)
            .map(String::as_str)
            .unwrap_or(&self.excerpt)
    }

    /// A case counts as non-approved when approval is false or unknown.
    pub fn is_approved(&self) -> bool {
        self.approved.unwrap_or(false)
    }
}

/// A validated request to generate text for one document field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Name of the field to fill (e.g. "justification")
    pub field_name: String,

    /// Context of the project being written
    pub context: ProjectContext,

    /// Retrieved reference cases grounding the generation (0..N)
    pub cases: Vec<ReferenceCase>,

    /// Maximum output length in characters
    pub max_length: usize,
}

impl GenerationRequest {
    /// Build a request, rejecting malformed shapes up front so the
    /// generation path itself never has to fail.
    pub fn new(
        field_name: impl Into<String>,
        context: ProjectContext,
        cases: Vec<ReferenceCase>,
        max_length: usize,
    ) -> Result<Self, RequestError> {
        let field_name = field_name.into();
        if field_name.trim().is_empty() {
            return Err(RequestError::EmptyFieldName);
        }
        if max_length == 0 {
            return Err(RequestError::ZeroMaxLength);
        }
        Ok(Self {
            field_name,
            context,
            cases,
            max_length,
        })
    }
}

/// The caller-facing result of a generation request.
///
/// Always produced - when every backend fails the orchestrator degrades to
/// the reference-only path instead of returning an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Generated (or reference-only) text
    pub text: String,

    /// Backend that produced the text, or [`REFERENCE_ONLY_PROVIDER`]
    pub provider: String,

    /// Fixed, path-determined confidence in [0, 1]
    pub confidence: f64,

    /// Ids of the reference cases used
    pub references: Vec<String>,

    /// Wall-clock latency from request start to return
    pub latency_ms: u64,

    /// Degradation detail when a lower-confidence path was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Coarse risk classification derived from similar historical cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

/// Outcome of comparing a project against similar historical cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Overall risk level
    pub risk_level: RiskLevel,

    /// Deduplicated rejection reasons seen in similar non-approved cases
    pub common_mistakes: Vec<String>,

    /// Recommendations for the project authors
    pub recommendations: Vec<String>,
}

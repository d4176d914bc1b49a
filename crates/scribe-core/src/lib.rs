//! # scribe-core
//!
//! Deterministic building blocks for Scribe's grounded text generation.
//!
//! This crate owns everything that must be reproducible without I/O:
//! - The data model shared between retrieval, generation, and risk analysis
//! - The prompt builder (the versioned contract with generation backends)
//! - The reference-only fallback rendering used when no backend succeeds
//! - Risk classification over retrieved reference cases
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No network calls**: All logic here is pure computation
//! 3. **Provider-agnostic**: Nothing in this crate knows which backend
//!    (if any) will consume the prompt
//!
//! The async orchestration - provider clients, circuit breaking, ordered
//! fallback - lives in `scribe-runtime`.

pub mod fallback;
pub mod prompt;
pub mod risk;
pub mod types;

// Re-export main types at crate root
pub use fallback::ReferenceAnswer;
pub use types::{
    GenerationRequest, GenerationResult, ProjectContext, ReferenceCase, RequestError,
    RiskAssessment, RiskLevel, REFERENCE_ONLY_PROVIDER,
};

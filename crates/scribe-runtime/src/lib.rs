//! # scribe-runtime
//!
//! Async orchestration for Scribe's grounded text generation.
//!
//! This crate owns everything that talks to the outside world:
//! - Generation backends (OpenAI-compatible and Gemini, feature-gated)
//! - Semantic case retrieval over an embedder and a vector index
//! - Per-provider health tracking and retry with backoff
//! - The fallback orchestrator that walks the provider chain and degrades
//!   to the deterministic reference-only answer from `scribe-core`
//!
//! ## Example
//!
//! ```rust,ignore
//! use scribe_runtime::{Orchestrator, RuntimeConfig};
//! use scribe_runtime::providers::OpenAiBackend;
//! use std::sync::Arc;
//!
//! let orchestrator = Orchestrator::builder()
//!     .config(RuntimeConfig::default())
//!     .provider(Arc::new(OpenAiBackend::from_env()))
//!     .build();
//!
//! // Never fails: degraded paths produce lower-confidence results
//! let result = orchestrator.generate(&request).await;
//! println!("{} (via {})", result.text, result.provider);
//! ```

pub mod config;
pub mod orchestrator;
pub mod providers;
pub mod resilience;
pub mod retrieval;
pub mod risk;

// Re-export main types at crate root
pub use config::{HealthConfig, RetrievalConfig, RetryConfig, RuntimeConfig};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use providers::{GenerationBackend, ProviderError};
pub use resilience::{HealthTracker, ProviderStatus};
pub use retrieval::{CaseRetriever, CaseSearch, Embedder, RetrievalError, ScoredPoint};
pub use risk::RiskAnalyzer;

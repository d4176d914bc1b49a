//! Generation backend abstractions.
//!
//! This module defines the trait for text-generation backends and the error
//! taxonomy the orchestrator's retry and fallback policy is built on.
//!
//! ## Security
//!
//! All backends use the [`secrets`] module for credential handling. A
//! backend constructed without credentials is *unconfigured*: it reports
//! itself unavailable and fails synchronously, it never errors at startup.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "gemini")]
mod gemini;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "openai")]
pub use openai::{OpenAiBackend, OPENAI_API_KEY_ENV};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiBackend, GEMINI_API_KEY_ENV};

/// Errors from generation backends.
///
/// The orchestrator only cares about the classification methods below:
/// transient errors are retried, unavailable backends are skipped, and
/// everything else fails the provider over to the next one in the chain.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("authentication failed")]
    Auth,

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transport failures, timeouts, and server-side errors are transient.
    /// Auth, quota, content-policy, and client errors are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(_) | ProviderError::Timeout(_) => true,
            ProviderError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the backend was never usable in the first place.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProviderError::NotConfigured(_))
    }
}

/// Map a character budget to a completion token limit.
///
/// Rough chars-to-tokens halving, capped so a misconfigured budget cannot
/// request unbounded output.
pub fn max_tokens_for(max_length: usize) -> u32 {
    ((max_length / 2).min(2000) as u32).max(1)
}

/// A single text-generation backend.
///
/// One instance per provider. Implementations perform the network call,
/// enforce their own request shape, and normalize failures into
/// [`ProviderError`]; retry, health tracking, and fallback all live in the
/// orchestrator.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend name, used for health tracking and result provenance.
    fn name(&self) -> &str;

    /// Whether credentials were present at construction. Must be cheap and
    /// synchronous; an unavailable backend is skipped without network I/O.
    fn available(&self) -> bool;

    /// Generate text for a prompt, bounded by `max_length` characters.
    ///
    /// Output is trimmed of leading/trailing whitespace.
    async fn generate(&self, prompt: &str, max_length: usize) -> Result<String, ProviderError>;
}

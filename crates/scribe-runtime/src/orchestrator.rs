//! Fallback orchestration across the provider chain.
//!
//! The orchestrator tries providers strictly in priority order, each under
//! the health tracker's gate and the retry policy, and degrades to the
//! deterministic reference-only answer when the chain is exhausted. It
//! never fails the caller: every request produces a [`GenerationResult`]
//! with provenance, confidence, and latency.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use scribe_core::{
    fallback, prompt, GenerationRequest, GenerationResult, REFERENCE_ONLY_PROVIDER,
};

use crate::config::RuntimeConfig;
use crate::providers::{GenerationBackend, ProviderError};
use crate::resilience::{with_retry, HealthTracker, ProviderStatus};

/// Degradation note carried by reference-only results.
const DEGRADED_NOTE: &str = "all generation backends unavailable or failed";

/// A provider in the chain: backend plus its fixed result confidence.
struct ProviderSlot {
    backend: Arc<dyn GenerationBackend>,
    confidence: f64,
}

/// Outcome of walking the provider chain.
struct ChainSuccess {
    provider: String,
    confidence: f64,
    text: String,
}

/// Drives the provider chain for one deployment.
///
/// # Architecture
/// - Providers are tried sequentially, highest priority first, never in
///   parallel; the first healthy success wins
/// - The health tracker is the only state shared across requests
/// - Exhaustion falls to `scribe_core::fallback`, which cannot fail
pub struct Orchestrator {
    providers: Vec<ProviderSlot>,
    health: HealthTracker,
    config: RuntimeConfig,
}

impl Orchestrator {
    /// Start building an orchestrator.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Produce a result for a generation request. Never fails.
    ///
    /// # Execution Flow
    /// 1. Build the grounded prompt (deterministic)
    /// 2. Walk the provider chain under breaker gate + retry policy,
    ///    bounded by the optional outer deadline
    /// 3. On total exhaustion, render the reference-only answer
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let started = Instant::now();

        let prompt_text = prompt::build(
            &request.field_name,
            &request.context,
            &request.cases,
            request.max_length,
        );

        let outcome = match self.config.request_deadline {
            Some(deadline) => {
                match tokio::time::timeout(
                    deadline,
                    self.try_providers(&prompt_text, request.max_length),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::warn!(
                            field = %request.field_name,
                            ?deadline,
                            "request deadline expired, treating providers as exhausted"
                        );
                        None
                    }
                }
            }
            None => self.try_providers(&prompt_text, request.max_length).await,
        };

        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Some(success) => {
                let references = prompt::select_cases(&request.field_name, &request.cases)
                    .iter()
                    .map(|case| case.id.clone())
                    .collect();

                tracing::info!(
                    provider = %success.provider,
                    field = %request.field_name,
                    latency_ms,
                    "generation succeeded"
                );

                GenerationResult {
                    text: success.text,
                    provider: success.provider,
                    confidence: success.confidence,
                    references,
                    latency_ms,
                    error: None,
                }
            }
            None => {
                tracing::warn!(
                    field = %request.field_name,
                    latency_ms,
                    "falling back to reference-only answer"
                );

                let answer = fallback::render(&request.field_name, &request.cases);
                GenerationResult {
                    text: answer.text,
                    provider: REFERENCE_ONLY_PROVIDER.to_string(),
                    confidence: fallback::FALLBACK_CONFIDENCE,
                    references: answer.references,
                    latency_ms,
                    error: Some(DEGRADED_NOTE.to_string()),
                }
            }
        }
    }

    /// Walk the chain in priority order; first success wins.
    async fn try_providers(&self, prompt: &str, max_length: usize) -> Option<ChainSuccess> {
        for slot in &self.providers {
            let name = slot.backend.name().to_string();

            if !slot.backend.available() {
                tracing::debug!(provider = %name, "skipping unconfigured provider");
                continue;
            }

            if !self.health.is_healthy(&name) {
                tracing::warn!(provider = %name, "skipping provider with open circuit");
                continue;
            }

            match self.attempt(slot.backend.as_ref(), prompt, max_length).await {
                Ok(text) => {
                    self.health.record_success(&name);
                    return Some(ChainSuccess {
                        provider: name,
                        confidence: slot.confidence,
                        text,
                    });
                }
                Err(error) if error.is_unavailable() => {
                    // Unconfigured mid-flight counts as a skip, not a failure
                    tracing::debug!(provider = %name, %error, "provider unavailable");
                }
                Err(error) => {
                    // One failure record per exhausted attempt cycle
                    self.health.record_failure(&name);
                    tracing::error!(
                        provider = %name,
                        %error,
                        failures = self.health.failures(&name),
                        "provider exhausted, trying next"
                    );
                }
            }
        }

        None
    }

    /// One provider's full attempt cycle: per-call timeout inside the
    /// retry policy, so timeouts count as transient attempts.
    async fn attempt(
        &self,
        backend: &dyn GenerationBackend,
        prompt: &str,
        max_length: usize,
    ) -> Result<String, ProviderError> {
        let call_timeout = self.config.provider_timeout;

        with_retry(&self.config.retry, || async move {
            match tokio::time::timeout(call_timeout, backend.generate(prompt, max_length)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(call_timeout)),
            }
        })
        .await
    }

    /// Operational status surface, keyed by provider name.
    pub fn health_status(&self) -> BTreeMap<String, ProviderStatus> {
        self.providers
            .iter()
            .map(|slot| {
                let name = slot.backend.name().to_string();
                let health = self.health.health(&name);
                let status = ProviderStatus {
                    available: slot.backend.available(),
                    consecutive_failures: health.consecutive_failures,
                    last_success: health.last_success,
                    healthy: self.health.is_healthy(&name),
                };
                (name, status)
            })
            .collect()
    }

    /// Close a provider's circuit by operator request.
    pub fn reset_provider(&self, provider: &str) {
        self.health.reset(provider);
    }
}

/// Builder for [`Orchestrator`].
///
/// Providers are ranked by registration order. An orchestrator with zero
/// providers is legal: every request resolves reference-only.
pub struct OrchestratorBuilder {
    providers: Vec<(Arc<dyn GenerationBackend>, Option<f64>)>,
    config: RuntimeConfig,
}

impl OrchestratorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            config: RuntimeConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a provider; confidence comes from the config's rank table.
    pub fn provider(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.providers.push((backend, None));
        self
    }

    /// Append a provider with an explicit confidence override.
    pub fn provider_with_confidence(
        mut self,
        backend: Arc<dyn GenerationBackend>,
        confidence: f64,
    ) -> Self {
        self.providers.push((backend, Some(confidence)));
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Orchestrator {
        let health = HealthTracker::new(&self.config.health);
        let providers = self
            .providers
            .into_iter()
            .enumerate()
            .map(|(rank, (backend, confidence))| ProviderSlot {
                backend,
                confidence: confidence.unwrap_or_else(|| self.config.confidence_for_rank(rank)),
            })
            .collect();

        Orchestrator {
            providers,
            health,
            config: self.config,
        }
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

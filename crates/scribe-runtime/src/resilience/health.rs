//! Per-provider health tracking.
//!
//! A binary circuit breaker: a provider is either attemptable (Closed) or
//! blocked (Open). The circuit opens when consecutive failures reach the
//! threshold and does NOT time out back to Closed - it closes only on an
//! observed success or an explicit [`HealthTracker::reset`] call. This
//! favors fast failover over flakiness at the cost of not self-healing;
//! `reset` is the operator escape hatch.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::HealthConfig;

/// Health state of one provider.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderHealth {
    /// Failures since the last success; resets to exactly 0 on success
    pub consecutive_failures: u32,

    /// When the provider last succeeded, if ever
    pub last_success: Option<DateTime<Utc>>,
}

/// Entry in the operational status surface.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Whether credentials were present at startup
    pub available: bool,

    /// Failures since the last success
    pub consecutive_failures: u32,

    /// When the provider last succeeded, if ever
    pub last_success: Option<DateTime<Utc>>,

    /// Whether the breaker still allows attempts
    pub healthy: bool,
}

/// Failure-counting gate over the provider chain.
///
/// The only mutable state shared across concurrent requests. Counters are
/// small and contention is low, so a single RwLock over the map suffices.
pub struct HealthTracker {
    states: RwLock<HashMap<String, ProviderHealth>>,
    failure_threshold: u32,
}

impl HealthTracker {
    /// Create a tracker from breaker configuration.
    pub fn new(config: &HealthConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            failure_threshold: config.failure_threshold,
        }
    }

    /// Whether the provider may be attempted.
    pub fn is_healthy(&self, provider: &str) -> bool {
        self.states
            .read()
            .get(provider)
            .map(|h| h.consecutive_failures < self.failure_threshold)
            .unwrap_or(true)
    }

    /// Record a success: zero the failure counter, stamp the time.
    pub fn record_success(&self, provider: &str) {
        let mut states = self.states.write();
        let health = states.entry(provider.to_string()).or_default();
        health.consecutive_failures = 0;
        health.last_success = Some(Utc::now());
    }

    /// Record a failure: one increment per exhausted attempt cycle.
    pub fn record_failure(&self, provider: &str) {
        let mut states = self.states.write();
        let health = states.entry(provider.to_string()).or_default();
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);

        if health.consecutive_failures == self.failure_threshold {
            tracing::warn!(
                provider,
                failures = health.consecutive_failures,
                "circuit opened, provider disabled until success or reset"
            );
        }
    }

    /// Current failure count for a provider.
    pub fn failures(&self, provider: &str) -> u32 {
        self.states
            .read()
            .get(provider)
            .map(|h| h.consecutive_failures)
            .unwrap_or(0)
    }

    /// Health snapshot for one provider.
    pub fn health(&self, provider: &str) -> ProviderHealth {
        self.states
            .read()
            .get(provider)
            .cloned()
            .unwrap_or_default()
    }

    /// Explicitly close a provider's circuit without stamping a success.
    pub fn reset(&self, provider: &str) {
        if let Some(health) = self.states.write().get_mut(provider) {
            health.consecutive_failures = 0;
            tracing::info!(provider, "circuit reset by operator");
        }
    }

    /// Snapshot of every tracked provider, in stable name order.
    pub fn snapshot(&self) -> BTreeMap<String, ProviderHealth> {
        self.states
            .read()
            .iter()
            .map(|(name, health)| (name.clone(), health.clone()))
            .collect()
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(&HealthConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unknown_provider_starts_healthy() {
        let tracker = HealthTracker::default();
        assert!(tracker.is_healthy("openai"));
        assert_eq!(tracker.failures("openai"), 0);
    }

    #[test]
    fn test_circuit_opens_at_threshold() {
        let tracker = HealthTracker::default();

        tracker.record_failure("openai");
        tracker.record_failure("openai");
        assert!(tracker.is_healthy("openai"));

        tracker.record_failure("openai");
        assert!(!tracker.is_healthy("openai"));
    }

    #[test]
    fn test_success_resets_counter_to_zero() {
        let tracker = HealthTracker::default();

        tracker.record_failure("openai");
        tracker.record_failure("openai");
        tracker.record_success("openai");

        assert_eq!(tracker.failures("openai"), 0);
        assert!(tracker.health("openai").last_success.is_some());
    }

    #[test]
    fn test_open_circuit_stays_open_without_success() {
        let tracker = HealthTracker::default();
        for _ in 0..3 {
            tracker.record_failure("openai");
        }

        // No timer, no decay: still open after arbitrarily many checks
        for _ in 0..100 {
            assert!(!tracker.is_healthy("openai"));
        }
    }

    #[test]
    fn test_explicit_reset_closes_circuit() {
        let tracker = HealthTracker::default();
        for _ in 0..3 {
            tracker.record_failure("openai");
        }
        assert!(!tracker.is_healthy("openai"));

        tracker.reset("openai");
        assert!(tracker.is_healthy("openai"));
        // Reset is not a success
        assert!(tracker.health("openai").last_success.is_none());
    }

    #[test]
    fn test_providers_are_independent() {
        let tracker = HealthTracker::default();
        for _ in 0..3 {
            tracker.record_failure("openai");
        }

        assert!(!tracker.is_healthy("openai"));
        assert!(tracker.is_healthy("gemini"));
    }

    proptest! {
        /// Failures only ever increase the counter until a success occurs,
        /// and a success resets it to exactly zero.
        #[test]
        fn prop_counter_monotone_between_successes(events in proptest::collection::vec(any::<bool>(), 0..64)) {
            let tracker = HealthTracker::default();
            let mut expected = 0u32;

            for success in events {
                let before = tracker.failures("p");
                if success {
                    tracker.record_success("p");
                    expected = 0;
                } else {
                    tracker.record_failure("p");
                    expected += 1;
                    prop_assert!(tracker.failures("p") > before);
                }
                prop_assert_eq!(tracker.failures("p"), expected);
            }
        }
    }
}

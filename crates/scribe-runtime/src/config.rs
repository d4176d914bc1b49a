//! Runtime configuration.
//!
//! One explicit configuration struct, constructed at process start and
//! passed into the orchestrator. No hidden process-wide mutable state lives
//! outside the health tracker.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

pub(crate) mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

/// Retry policy for transient provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per provider, including the first
    pub max_attempts: u32,

    /// Initial backoff delay (in seconds)
    #[serde(with = "duration_secs")]
    pub min_delay: Duration,

    /// Backoff cap (in seconds)
    #[serde(with = "duration_secs")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Consecutive failures before a provider stops being attempted
    pub failure_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
        }
    }
}

/// Retrieval knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of cases returned by a retrieval
    pub default_limit: usize,

    /// Maximum cached retrieval results
    pub cache_entries: u64,

    /// Cache time-to-live (in seconds)
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            cache_entries: 1024,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Configuration for the generation runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Retry policy applied to each provider attempt cycle
    #[serde(default)]
    pub retry: RetryConfig,

    /// Circuit breaker thresholds
    #[serde(default)]
    pub health: HealthConfig,

    /// Bound on each individual provider call (in seconds)
    #[serde(default = "default_provider_timeout", with = "duration_secs")]
    pub provider_timeout: Duration,

    /// Optional hard deadline across the whole provider chain; expiry is
    /// treated as "all providers exhausted" (in seconds)
    #[serde(default, with = "duration_secs_opt")]
    pub request_deadline: Option<Duration>,

    /// Fixed confidence by provider rank (first entry = highest priority).
    /// Ranks beyond the table reuse the last entry.
    #[serde(default = "default_confidence_by_rank")]
    pub confidence_by_rank: Vec<f64>,

    /// Retrieval knobs
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

fn default_provider_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_confidence_by_rank() -> Vec<f64> {
    vec![0.95, 0.85]
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            health: HealthConfig::default(),
            provider_timeout: default_provider_timeout(),
            request_deadline: None,
            confidence_by_rank: default_confidence_by_rank(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Confidence for the provider at a given priority rank.
    pub fn confidence_for_rank(&self, rank: usize) -> f64 {
        self.confidence_by_rank
            .get(rank)
            .or_else(|| self.confidence_by_rank.last())
            .copied()
            .unwrap_or(0.85)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy() {
        let config = RuntimeConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.min_delay, Duration::from_secs(2));
        assert_eq!(config.retry.max_delay, Duration::from_secs(10));
        assert_eq!(config.health.failure_threshold, 3);
        assert_eq!(config.provider_timeout, Duration::from_secs(30));
        assert!(config.request_deadline.is_none());
    }

    #[test]
    fn test_confidence_table() {
        let config = RuntimeConfig::default();
        assert_eq!(config.confidence_for_rank(0), 0.95);
        assert_eq!(config.confidence_for_rank(1), 0.85);
        // Ranks past the table reuse the last entry
        assert_eq!(config.confidence_for_rank(7), 0.85);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = RuntimeConfig {
            request_deadline: Some(Duration::from_secs(90)),
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_deadline, Some(Duration::from_secs(90)));
        assert_eq!(parsed.retry.min_delay, Duration::from_secs(2));
    }
}

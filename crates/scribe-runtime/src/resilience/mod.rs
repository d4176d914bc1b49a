//! Resilience patterns for the generation runtime.
//!
//! This module provides:
//! - Per-provider health tracking (binary circuit breaker)
//! - Retry with exponential backoff for transient provider errors

mod health;
mod retry;

pub use health::{HealthTracker, ProviderHealth, ProviderStatus};
pub use retry::with_retry;

//! Secure credential handling for generation backends.
//!
//! A thin wrapper over `secrecy` that keeps API keys out of logs:
//!
//! - **No accidental logging**: credentials show `[REDACTED]` in
//!   Debug/Display output
//! - **Memory safety**: credentials are zeroed on drop
//! - **Graceful absence**: a missing environment variable yields `None`,
//!   never an error - the backend degrades to unavailable instead

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Where a credential was loaded from.
///
/// Useful for debugging configuration issues without exposing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a credential value. It cannot be accidentally logged after
    /// this point.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load a credential from an environment variable.
    ///
    /// Returns `None` when the variable is unset or empty; backends treat
    /// that as "permanently unconfigured" rather than an error.
    pub fn try_from_env(env_var: &str, name: &'static str) -> Option<Self> {
        match std::env::var(env_var) {
            Ok(value) if !value.trim().is_empty() => {
                Some(Self::new(value, CredentialSource::Environment, name))
            }
            _ => None,
        }
    }

    /// Expose the credential for use in an API call.
    ///
    /// Only call this at the point of use (e.g. setting an HTTP header);
    /// never store the exposed value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Whether the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// Where this credential came from.
    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Human-readable name for error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

use crate::config::NarrativeConfig;
use crate::prompt::Prompt;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a narrative backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Throttled; retried with backoff, honouring `retry_after` if given
    #[error("rate limited by narrative service")]
    RateLimited { retry_after: Option<Duration> },

    /// Billing or quota refusal; never retried
    #[error("quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Network failure, timeout or unexpected response; retried
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl BackendError {
    pub fn transport(message: impl Into<String>) -> Self {
        BackendError::Transport {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, BackendError::QuotaExceeded { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BackendError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// External text generator.
///
/// One call is one attempt; retries belong to the caller.
pub trait NarrativeBackend: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// A [`BackendError`] classifying the failure.
    fn generate(&self, prompt: &Prompt, config: &NarrativeConfig) -> Result<String, BackendError>;
}

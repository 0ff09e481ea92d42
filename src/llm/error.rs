//! LLM transport errors and the retry policy applied to them.
//!
//! Rate limits, 5xx responses and network failures are transient and retried
//! with exponential backoff; everything else fails immediately.

use std::time::Duration;

use thiserror::Error;

/// Longest single backoff delay.
const MAX_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited (HTTP 429): {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Client error (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, body: impl Into<String>, retry_after: Option<Duration>) -> Self {
        let message = body.into();
        match status {
            429 => LlmError::RateLimited {
                message,
                retry_after,
            },
            400..=499 => LlmError::Client { status, message },
            _ => LlmError::Server { status, message },
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::Server { .. } | LlmError::Network(_)
        )
    }

    /// Delay before retry number `attempt` (0-based).
    ///
    /// Honours `Retry-After` when the server sent one; otherwise doubles a
    /// per-kind base delay each attempt, capped at one minute.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        let base = match self {
            LlmError::RateLimited {
                retry_after: Some(delay),
                ..
            } => return *delay,
            LlmError::RateLimited { .. } => Duration::from_secs(5),
            LlmError::Server { .. } => Duration::from_secs(2),
            _ => Duration::from_secs(1),
        };
        let factor = 2u32.saturating_pow(attempt);
        base.saturating_mul(factor).min(MAX_DELAY)
    }
}

/// Retry limits for LLM requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Maximum total time spent on one request, retries included
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_retry_duration: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            max_retry_duration: Duration::ZERO,
        }
    }

    pub fn should_retry(&self, error: &LlmError, attempt: u32) -> bool {
        error.is_transient() && attempt < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            LlmError::from_status(429, "slow down", None),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            LlmError::from_status(503, "", None),
            LlmError::Server { status: 503, .. }
        ));
        assert!(matches!(
            LlmError::from_status(401, "bad key", None),
            LlmError::Client { status: 401, .. }
        ));
    }

    #[test]
    fn test_only_transient_errors_are_retried() {
        let config = RetryConfig::default();
        assert!(config.should_retry(&LlmError::Network("reset".into()), 0));
        assert!(config.should_retry(&LlmError::from_status(500, "", None), 2));
        assert!(!config.should_retry(&LlmError::from_status(500, "", None), 3));
        assert!(!config.should_retry(&LlmError::from_status(400, "", None), 0));
        assert!(!config.should_retry(&LlmError::Parse("bad json".into()), 0));
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let error = LlmError::from_status(429, "", None);
        assert_eq!(error.suggested_delay(0), Duration::from_secs(5));
        assert_eq!(error.suggested_delay(1), Duration::from_secs(10));
        assert_eq!(error.suggested_delay(10), MAX_DELAY);
    }

    #[test]
    fn test_retry_after_is_respected() {
        let error = LlmError::from_status(429, "", Some(Duration::from_secs(30)));
        assert_eq!(error.suggested_delay(0), Duration::from_secs(30));
        assert_eq!(error.suggested_delay(4), Duration::from_secs(30));
    }
}

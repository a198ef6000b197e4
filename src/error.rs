//! Error types for Docent
//!
//! Every fallible operation in the crate returns [`Result`]. Failures that
//! happen inside the agent loop or a tool never reach the caller as errors;
//! they are turned into text at the boundary where they occur (see
//! `agent::loop` and `tools::registry`). The variants here describe what can
//! go wrong underneath those boundaries and at startup.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Provider Error Classification
// ============================================================================

/// Structured completion-backend error classification.
///
/// Lets the retry decorator decide what is worth retrying without matching
/// on error strings.
#[derive(Debug)]
pub enum ProviderError {
    /// 401: Invalid API key or authentication failure
    Auth(String),
    /// 429: Rate limit or quota exceeded
    RateLimit(String),
    /// 402: Payment required or billing issue
    Billing(String),
    /// 500/502/503/504: Server-side errors
    ServerError(String),
    /// 400: Bad request, invalid JSON, malformed parameters
    InvalidRequest(String),
    /// 404: Model not found or endpoint not available
    ModelNotFound(String),
    /// Connection or read timeout
    Timeout(String),
    /// Catch-all for unrecognized errors
    Unknown(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ProviderError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            ProviderError::Billing(msg) => write!(f, "Billing error: {}", msg),
            ProviderError::ServerError(msg) => write!(f, "Server error: {}", msg),
            ProviderError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ProviderError::ModelNotFound(msg) => write!(f, "Model not found: {}", msg),
            ProviderError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ProviderError::Unknown(msg) => write!(f, "Unknown provider error: {}", msg),
        }
    }
}

impl ProviderError {
    /// Returns `true` if this error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimit(_) | ProviderError::ServerError(_) | ProviderError::Timeout(_)
        )
    }

    /// Returns the HTTP status code associated with this error, if applicable.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Auth(_) => Some(401),
            ProviderError::RateLimit(_) => Some(429),
            ProviderError::Billing(_) => Some(402),
            ProviderError::ServerError(_) => Some(500),
            ProviderError::InvalidRequest(_) => Some(400),
            ProviderError::ModelNotFound(_) => Some(404),
            ProviderError::Timeout(_) | ProviderError::Unknown(_) => None,
        }
    }
}

impl From<ProviderError> for DocentError {
    fn from(err: ProviderError) -> Self {
        DocentError::ProviderTyped(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for Docent operations.
#[derive(Error, Debug)]
pub enum DocentError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Completion backend failures that carry no status classification
    #[error("Provider error: {0}")]
    Provider(String),

    /// Completion backend failures classified by HTTP status
    #[error("Provider error: {0}")]
    ProviderTyped(ProviderError),

    /// A capability handler rejected its input or failed while running
    #[error("Tool error: {0}")]
    Tool(String),

    /// Arguments did not satisfy the capability's declared schema
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Session store misuse
    #[error("Session error: {0}")]
    Session(String),

    /// Document store failures
    #[error("Store error: {0}")]
    Store(String),

    /// Resource not found (tools, sessions, files)
    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DocentError {
    /// Whether a provider call that failed with this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            DocentError::ProviderTyped(e) => e.is_retryable(),
            DocentError::Http(e) => e.is_timeout() || e.is_connect(),
            DocentError::Timeout(_) => true,
            _ => false,
        }
    }
}

/// A specialized `Result` type for Docent operations.
pub type Result<T> = std::result::Result<T, DocentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DocentError::Config("missing model".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing model");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DocentError = io_err.into();
        assert!(matches!(err, DocentError::Io(_)));
    }

    #[test]
    fn test_invalid_arguments_display() {
        let err = DocentError::InvalidArguments("missing required argument 'query'".into());
        assert_eq!(
            err.to_string(),
            "Invalid arguments: missing required argument 'query'"
        );
    }

    #[test]
    fn test_provider_error_is_retryable() {
        assert!(ProviderError::RateLimit("429".into()).is_retryable());
        assert!(ProviderError::ServerError("500".into()).is_retryable());
        assert!(ProviderError::Timeout("timeout".into()).is_retryable());

        assert!(!ProviderError::Auth("401".into()).is_retryable());
        assert!(!ProviderError::Billing("402".into()).is_retryable());
        assert!(!ProviderError::InvalidRequest("400".into()).is_retryable());
        assert!(!ProviderError::ModelNotFound("404".into()).is_retryable());
        assert!(!ProviderError::Unknown("???".into()).is_retryable());
    }

    #[test]
    fn test_provider_error_status_code() {
        assert_eq!(ProviderError::Auth("x".into()).status_code(), Some(401));
        assert_eq!(ProviderError::RateLimit("x".into()).status_code(), Some(429));
        assert_eq!(ProviderError::ServerError("x".into()).status_code(), Some(500));
        assert_eq!(ProviderError::Timeout("x".into()).status_code(), None);
    }

    #[test]
    fn test_provider_typed_display() {
        let err: DocentError = ProviderError::Auth("invalid key".into()).into();
        assert_eq!(
            err.to_string(),
            "Provider error: Authentication error: invalid key"
        );
    }

    #[test]
    fn test_docent_error_retryable_passthrough() {
        let retry: DocentError = ProviderError::RateLimit("slow down".into()).into();
        assert!(retry.is_retryable());
        assert!(!DocentError::Provider("untyped".into()).is_retryable());
        assert!(DocentError::Timeout("completion".into()).is_retryable());
    }
}

//! Providers module - completion backends
//!
//! This module defines the `LLMProvider` trait and common types for talking
//! to a chat-completion backend, plus the OpenAI-compatible client and the
//! retry decorator.
//!
//! # Example
//!
//! ```rust,ignore
//! use docent::providers::{LLMProvider, ChatOptions, OpenAIProvider};
//! use docent::session::Message;
//!
//! async fn example() {
//!     let provider = OpenAIProvider::new("ollama", "llama2");
//!     let messages = vec![Message::user("Hello!")];
//!     let options = ChatOptions::new().with_max_tokens(1000);
//!
//!     let response = provider.chat(messages, vec![], None, options).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

pub mod openai;
pub mod retry;
mod types;

use crate::config::Config;
use crate::error::{ProviderError, Result};

pub use openai::OpenAIProvider;
pub use retry::RetryProvider;
pub use types::{ChatOptions, LLMProvider, LLMResponse, ToolDefinition, Usage};

/// Parse an HTTP status code and response body into a structured [`ProviderError`].
pub fn parse_provider_error(status: u16, body: &str) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth(body.to_string()),
        402 => ProviderError::Billing(body.to_string()),
        404 => ProviderError::ModelNotFound(body.to_string()),
        408 => ProviderError::Timeout(body.to_string()),
        429 => ProviderError::RateLimit(body.to_string()),
        400 | 422 => ProviderError::InvalidRequest(body.to_string()),
        500..=599 => ProviderError::ServerError(body.to_string()),
        _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}

/// Build the configured completion backend, wrapped in [`RetryProvider`]
/// when `provider.max_retries > 0`.
pub fn build_provider(config: &Config) -> Result<Box<dyn LLMProvider>> {
    let base = OpenAIProvider::from_config(&config.provider, &config.agent.model)?;
    if config.provider.max_retries > 0 {
        Ok(Box::new(
            RetryProvider::new(Box::new(base)).with_max_retries(config.provider.max_retries),
        ))
    } else {
        Ok(Box::new(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_error_auth() {
        let err = parse_provider_error(401, "invalid api key");
        assert!(matches!(err, ProviderError::Auth(_)));
        assert_eq!(err.status_code(), Some(401));
        assert!(matches!(parse_provider_error(403, "no"), ProviderError::Auth(_)));
    }

    #[test]
    fn test_parse_provider_error_model_not_found() {
        let err = parse_provider_error(404, "model 'llama9' not found");
        assert!(matches!(err, ProviderError::ModelNotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_provider_error_rate_limit() {
        let err = parse_provider_error(429, "rate limited");
        assert!(matches!(err, ProviderError::RateLimit(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_provider_error_bad_request() {
        let err = parse_provider_error(400, "bad json");
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_provider_error_server() {
        for status in [500, 502, 503, 504] {
            let err = parse_provider_error(status, "upstream");
            assert!(matches!(err, ProviderError::ServerError(_)));
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_parse_provider_error_unknown() {
        let err = parse_provider_error(418, "i'm a teapot");
        assert!(matches!(err, ProviderError::Unknown(_)));
        assert!(err.to_string().contains("HTTP 418"));
    }

    #[test]
    fn test_build_provider_uses_config_model() {
        let mut config = Config::default();
        config.agent.model = "mistral".into();
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.default_model(), "mistral");

        config.provider.max_retries = 2;
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}

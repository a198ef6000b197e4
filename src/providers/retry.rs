//! Retry provider - decorator that adds automatic retry with exponential backoff.
//!
//! Wraps any [`LLMProvider`] to transparently retry transient errors (HTTP
//! 429, 5xx, timeouts, refused connections). The agent loop itself never
//! retries; when retries are wanted they live here, inside the backend
//! client.
//!
//! # Example
//!
//! ```rust
//! use docent::providers::{openai::OpenAIProvider, retry::RetryProvider, LLMProvider};
//!
//! let provider = RetryProvider::new(Box::new(OpenAIProvider::new("ollama", "llama2")))
//!     .with_max_retries(2)
//!     .with_base_delay_ms(250);
//! assert_eq!(provider.name(), "openai");
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::warn;

use crate::error::{DocentError, Result};
use crate::session::Message;

use super::{ChatOptions, LLMProvider, LLMResponse, ToolDefinition};

/// A decorator provider that retries transient errors with exponential backoff.
///
/// Non-transient errors (400, 401, 402, 404, malformed responses) are returned
/// immediately without retry.
pub struct RetryProvider {
    inner: Box<dyn LLMProvider>,
    /// Maximum number of retry attempts before giving up. Default: 3.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff. Default: 1000.
    base_delay_ms: u64,
    /// Maximum delay cap in milliseconds. Default: 30000.
    max_delay_ms: u64,
}

impl std::fmt::Debug for RetryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryProvider")
            .field("inner", &self.inner.name())
            .field("max_retries", &self.max_retries)
            .field("base_delay_ms", &self.base_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .finish()
    }
}

impl RetryProvider {
    /// Create a new `RetryProvider` wrapping the given inner provider.
    pub fn new(inner: Box<dyn LLMProvider>) -> Self {
        Self {
            inner,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay in milliseconds for exponential backoff.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the maximum delay cap in milliseconds.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }
}

/// Compute the backoff delay for a given attempt (without sleeping).
///
/// `min(base_delay_ms * 2^attempt + jitter_ms, max_delay_ms)`
pub fn compute_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64, jitter_ms: u64) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(16));
    exponential.saturating_add(jitter_ms).min(max_delay_ms)
}

/// Jitter from the sub-second clock, bounded by `base_delay_ms`.
fn jitter_ms(base_delay_ms: u64) -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()) % base_delay_ms.max(1))
        .unwrap_or(0)
}

#[async_trait]
impl LLMProvider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        let mut attempt = 0;
        loop {
            match self
                .inner
                .chat(messages.clone(), tools.clone(), model, options.clone())
                .await
            {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.max_retries && is_retryable(&err) => {
                    let delay = compute_delay(
                        attempt,
                        self.base_delay_ms,
                        self.max_delay_ms,
                        jitter_ms(self.base_delay_ms),
                    );
                    attempt += 1;
                    warn!(
                        provider = self.inner.name(),
                        attempt = attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay,
                        error = %err,
                        "Retrying chat request after transient error"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Check whether an error represents a transient failure worth retrying.
pub fn is_retryable(err: &DocentError) -> bool {
    err.is_retryable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails `failures` times with the given error kind, then succeeds.
    struct FlakyProvider {
        calls: Arc<AtomicUsize>,
        failures: usize,
        retryable: bool,
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn default_model(&self) -> &str {
            "test-model"
        }

        async fn chat(
            &self,
            _messages: Vec<Message>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LLMResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                if self.retryable {
                    Err(ProviderError::ServerError("502 bad gateway".into()).into())
                } else {
                    Err(ProviderError::Auth("bad key".into()).into())
                }
            } else {
                Ok(LLMResponse::text("ok"))
            }
        }
    }

    fn flaky(failures: usize, retryable: bool) -> (RetryProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = FlakyProvider {
            calls: Arc::clone(&calls),
            failures,
            retryable,
        };
        (
            RetryProvider::new(Box::new(inner)).with_base_delay_ms(10),
            calls,
        )
    }

    #[test]
    fn test_compute_delay() {
        assert_eq!(compute_delay(0, 1000, 30_000, 0), 1000);
        assert_eq!(compute_delay(1, 1000, 30_000, 0), 2000);
        assert_eq!(compute_delay(3, 1000, 30_000, 50), 8050);
        assert_eq!(compute_delay(10, 1000, 30_000, 0), 30_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let (provider, calls) = flaky(2, true);
        let response = provider
            .chat(vec![], vec![], None, ChatOptions::new())
            .await
            .unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let (provider, calls) = flaky(10, true);
        let provider = provider.with_max_retries(2);
        assert!(provider
            .chat(vec![], vec![], None, ChatOptions::new())
            .await
            .is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_returns_immediately() {
        let (provider, calls) = flaky(1, false);
        assert!(provider
            .chat(vec![], vec![], None, ChatOptions::new())
            .await
            .is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delegates_identity() {
        let (provider, _) = flaky(0, true);
        assert_eq!(provider.name(), "flaky");
        assert_eq!(provider.default_model(), "test-model");
        assert!(format!("{:?}", provider).contains("flaky"));
    }
}

use super::traits::CompletionClient;
use super::types::{ChatMessage, CompletionParams};
use crate::config::ReliabilityConfig;
use crate::error::ProviderError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Completion client wrapper with retry, backoff, and an in-flight cap.
///
/// Transient failures are retried with doubling backoff up to the configured
/// budget; auth and malformed-request failures fail fast. A semaphore bounds
/// simultaneous requests so the planner can fan out freely without tracking
/// provider limits itself. Cancellation aborts both waits and in-flight
/// calls.
pub struct ReliableClient {
    inner: Arc<dyn CompletionClient>,
    max_retries: u32,
    base_backoff_ms: u64,
    in_flight: Semaphore,
    cancel: CancellationToken,
}

impl ReliableClient {
    pub fn new(
        inner: Arc<dyn CompletionClient>,
        config: &ReliabilityConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner,
            max_retries: config.max_retries,
            base_backoff_ms: config.base_backoff_ms.max(50),
            in_flight: Semaphore::new(config.max_in_flight.max(1)),
            cancel,
        }
    }

    async fn complete_with_retry(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, ProviderError> {
        let _permit = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(ProviderError::Cancelled),
            permit = self.in_flight.acquire() => {
                // The semaphore lives as long as self and is never closed.
                permit.map_err(|_| ProviderError::Cancelled)?
            }
        };

        let provider = self.inner.name().to_string();
        let mut backoff_ms = self.base_backoff_ms;
        let mut last_message = String::new();

        for attempt in 0..=self.max_retries {
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(ProviderError::Cancelled),
                result = self.inner.complete(messages, params) => result,
            };

            match result {
                Ok(text) => {
                    if attempt > 0 {
                        tracing::info!(
                            provider = provider.as_str(),
                            attempt,
                            "Provider recovered after retries"
                        );
                    }
                    return Ok(text);
                }
                Err(e) => {
                    last_message = e.to_string();

                    if !e.is_retryable() {
                        tracing::warn!(
                            provider = provider.as_str(),
                            "Non-retryable provider error: {last_message}"
                        );
                        return Err(e);
                    }

                    if attempt < self.max_retries {
                        tracing::warn!(
                            provider = provider.as_str(),
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            "Provider call failed, retrying"
                        );
                        tokio::select! {
                            biased;
                            () = self.cancel.cancelled() => return Err(ProviderError::Cancelled),
                            () = tokio::time::sleep(Duration::from_millis(backoff_ms)) => {}
                        }
                        backoff_ms = (backoff_ms.saturating_mul(2)).min(10_000);
                    }
                }
            }
        }

        Err(ProviderError::Exhausted {
            provider,
            attempts: self.max_retries + 1,
            last: last_message,
        })
    }
}

impl CompletionClient for ReliableClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        params: CompletionParams,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>> {
        Box::pin(self.complete_with_retry(messages, params))
    }
}

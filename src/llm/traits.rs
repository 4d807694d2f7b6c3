use super::types::{ChatMessage, CompletionParams};
use crate::error::ProviderError;
use std::future::Future;
use std::pin::Pin;

/// Uniform completion capability: ordered messages in, text out.
///
/// Implementations hold no mutable state beyond configuration, so one client
/// can be shared across every concurrent task in a run.
pub trait CompletionClient: Send + Sync {
    /// Provider identifier (e.g. "openrouter").
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        params: CompletionParams,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>>;
}

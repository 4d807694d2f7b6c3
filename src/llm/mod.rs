pub mod openrouter;
pub mod reliable;
pub mod repair;
pub mod traits;
pub mod types;

pub use openrouter::OpenRouterClient;
pub use reliable::ReliableClient;
pub use traits::CompletionClient;
pub use types::{ChatMessage, CompletionParams, MessageRole};

use std::time::Duration;

/// Pooled HTTP client shared by provider implementations.
pub fn build_provider_client(request_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

use super::traits::CompletionClient;
use super::types::{ChatMessage, CompletionParams};
use crate::error::ProviderError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const PROVIDER_NAME: &str = "openrouter";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const EXTRA_HEADERS: [(&str, &str); 1] = [("X-Title", "stakewriter")];

/// OpenRouter chat-completions client.
pub struct OpenRouterClient {
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: String,
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, base_url: &str, model: &str, request_timeout: Duration) -> Self {
        Self {
            cached_auth_header: format!("Bearer {api_key}"),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: super::build_provider_client(request_timeout),
        }
    }

    fn build_request<'a>(&'a self, messages: &'a [ChatMessage], params: CompletionParams) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        }
    }

    /// Map an HTTP failure to the retry policy: auth and client errors fail
    /// fast, rate limits and server errors are transient.
    fn classify_status(status: StatusCode, body: String) -> ProviderError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth {
                provider: PROVIDER_NAME.into(),
            },
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
                provider: PROVIDER_NAME.into(),
            },
            s if s.is_client_error() && s != StatusCode::REQUEST_TIMEOUT => {
                ProviderError::Request {
                    provider: PROVIDER_NAME.into(),
                    message: format!("{s}: {body}"),
                    retryable: false,
                }
            }
            s => ProviderError::Request {
                provider: PROVIDER_NAME.into(),
                message: format!("{s}: {body}"),
                retryable: true,
            },
        }
    }

    async fn call_api(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, ProviderError> {
        let request = self.build_request(messages, params);
        let url = format!("{}{CHAT_COMPLETIONS_PATH}", self.base_url);

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", &self.cached_auth_header)
            .json(&request);
        for (name, value) in EXTRA_HEADERS {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|e| ProviderError::Request {
            provider: PROVIDER_NAME.into(),
            message: e.to_string(),
            // Transport-level failures (connect, timeout) are transient.
            retryable: true,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| ProviderError::Request {
                provider: PROVIDER_NAME.into(),
                message: format!("response JSON decode failed: {e}"),
                retryable: false,
            })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: PROVIDER_NAME.into(),
            })
    }
}

impl CompletionClient for OpenRouterClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        params: CompletionParams,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>> {
        Box::pin(self.call_api(messages, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenRouterClient {
        OpenRouterClient::new(
            "sk-or-test",
            &server.uri(),
            "google/gemini-2.5-flash",
            Duration::from_secs(5),
        )
    }

    fn params() -> CompletionParams {
        CompletionParams {
            max_tokens: 256,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-or-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Hello there"}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let out = client
            .complete(&[ChatMessage::user("hi")], params())
            .await
            .unwrap();
        assert_eq!(out, "Hello there");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .complete(&[ChatMessage::user("hi")], params())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Auth { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn rate_limit_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .complete(&[ChatMessage::user("hi")], params())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn bad_request_fails_fast_while_server_error_retries() {
        let bad = OpenRouterClient::classify_status(StatusCode::BAD_REQUEST, "oops".into());
        assert!(!bad.is_retryable());

        let busy =
            OpenRouterClient::classify_status(StatusCode::SERVICE_UNAVAILABLE, "busy".into());
        assert!(busy.is_retryable());
    }

    #[tokio::test]
    async fn empty_content_is_an_empty_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "   "}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .complete(&[ChatMessage::user("hi")], params())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse { .. }));
    }
}

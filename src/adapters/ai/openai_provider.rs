//! OpenAI Provider - Implementation of AIProvider for OpenAI-compatible chat APIs.
//!
//! Talks to any `/chat/completions` endpoint speaking the OpenAI wire format.
//! The default base URL points at a local CORS proxy that injects the API
//! key itself, so the key is optional here.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new()
//!     .with_api_key(api_key)
//!     .with_model("gpt-4")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Default endpoint: local proxy forwarding to OpenAI.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api/openai/v1";

/// Upper bound on a single retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Bearer token; `None` when a proxy adds it.
    api_key: Option<Secret<String>>,
    /// Model to use (e.g., "gpt-4").
    pub model: String,
    /// Base URL for the API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_base_delay: Duration,
}

impl OpenAIConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            model: "gpt-4".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
            retry_base_delay: Duration::from_secs(1),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(api_key.into()));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().as_str())
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new provider; fails only if the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            });
        }

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let openai_request = self.to_openai_request(request);

        let mut builder = self
            .client
            .post(self.completions_url())
            .header("Content-Type", "application/json")
            .json(&openai_request);
        if let Some(key) = self.config.api_key() {
            builder = builder.bearer_auth(key);
        }

        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AIError::Timeout {
                    timeout_secs: u32::try_from(self.config.timeout.as_secs())
                        .unwrap_or(u32::MAX),
                }
            } else if e.is_connect() {
                AIError::network(format!("Connection failed: {}", e))
            } else {
                AIError::network(e.to_string())
            }
        })
    }

    /// Maps non-success statuses to errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(parse_retry_after(&error_body))),
            400 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        into_completion(openai_response)
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut retry_count = 0;

        loop {
            let attempt = match self.send_request(&request).await {
                Ok(response) => self.parse_response(response).await,
                Err(err) => Err(err),
            };

            match attempt {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    let delay = backoff_delay(self.config.retry_base_delay, retry_count);
                    tracing::debug!(
                        request_id = %request.request_id,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying completion after error: {}",
                        err
                    );
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", self.config.model.clone())
    }
}

/// Exponential backoff: base, 2x base, 4x base, ... capped at `MAX_BACKOFF`.
fn backoff_delay(base: Duration, retry_count: u32) -> Duration {
    base.checked_mul(1u32 << retry_count.min(16))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// Extracts the first choice of a chat-completions response.
fn into_completion(openai_response: OpenAIResponse) -> Result<CompletionResponse, AIError> {
    let choice = openai_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AIError::parse("No choices in response"))?;

    let finish_reason = match choice.finish_reason.as_deref() {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    };

    let usage = openai_response
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        usage,
        model: openai_response.model,
        finish_reason,
    })
}

/// Parses "try again in Xs" out of a rate-limit error body; defaults to 30s.
fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|parsed| {
            let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
            let rest = &message[message.find("try again in ")? + 13..];
            let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            rest[..end].parse::<u32>().ok()
        })
        .unwrap_or(30)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::ConversationStage;
    use crate::ports::MessageRole;

    fn provider(config: OpenAIConfig) -> OpenAIProvider {
        OpenAIProvider::new(config).unwrap()
    }

    #[test]
    fn config_defaults_target_local_proxy() {
        let config = OpenAIConfig::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4");
        assert!(config.api_key().is_none());
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let p = provider(OpenAIConfig::new().with_base_url("https://api.openai.com/v1/"));
        assert_eq!(p.completions_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn request_puts_system_prompt_first() {
        let p = provider(OpenAIConfig::new());
        let request = CompletionRequest::new("req")
            .with_system_prompt("instructions")
            .with_message(MessageRole::Assistant, "Bonjour")
            .with_message(MessageRole::User, "Salut")
            .with_temperature(0.7)
            .with_max_tokens(600)
            .with_stage(ConversationStage::Profile);

        let wire = serde_json::to_value(p.to_openai_request(&request)).unwrap();
        assert_eq!(wire["model"], "gpt-4");
        assert_eq!(wire["messages"][0]["role"], "system");
        assert_eq!(wire["messages"][1]["role"], "assistant");
        assert_eq!(wire["messages"][2]["content"], "Salut");
        assert_eq!(wire["max_tokens"], 600);
    }

    #[test]
    fn optional_parameters_are_omitted() {
        let p = provider(OpenAIConfig::new());
        let wire = serde_json::to_value(p.to_openai_request(&CompletionRequest::new("req"))).unwrap();
        assert!(wire.get("temperature").is_none());
        assert!(wire.get("max_tokens").is_none());
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{
            "model": "gpt-4-0613",
            "choices": [{"message": {"role": "assistant", "content": "Bonjour"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let response: OpenAIResponse = serde_json::from_str(body).unwrap();
        let completion = into_completion(response).unwrap();

        assert_eq!(completion.content, "Bonjour");
        assert_eq!(completion.model, "gpt-4-0613");
        assert_eq!(completion.finish_reason, FinishReason::Length);
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[test]
    fn empty_choices_is_parse_error() {
        let response: OpenAIResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(into_completion(response), Err(AIError::Parse(_))));
    }

    #[test]
    fn retry_after_is_read_from_error_message() {
        let body = r#"{"error": {"message": "Rate limit reached. Please try again in 7s."}}"#;
        assert_eq!(parse_retry_after(body), 7);
        assert_eq!(parse_retry_after("not json"), 30);
    }

    #[test]
    fn provider_info_reports_model() {
        let p = provider(OpenAIConfig::new().with_model("gpt-4o"));
        assert_eq!(p.provider_info(), ProviderInfo::new("openai", "gpt-4o"));
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(400));
        assert_eq!(backoff_delay(base, 30), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::MAX, 3), MAX_BACKOFF);
    }

    mod http {
        use super::*;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        const COMPLETION: &str = r#"{"model":"gpt-4","choices":[{"message":{"role":"assistant","content":"Bonjour"},"finish_reason":"stop"}]}"#;

        /// Answers one connection per canned `(status, body)`, in order.
        async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = hits.clone();

            tokio::spawn(async move {
                for (status, body) in responses {
                    let (mut socket, _) = listener.accept().await.unwrap();
                    counter.fetch_add(1, Ordering::SeqCst);
                    read_request(&mut socket).await;
                    let reply = format!(
                        "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\n\
                         content-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    socket.write_all(reply.as_bytes()).await.unwrap();
                    socket.shutdown().await.ok();
                }
            });

            (format!("http://{addr}/v1"), hits)
        }

        async fn read_request(socket: &mut TcpStream) {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    return;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let body_len = headers
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + body_len {
                        return;
                    }
                }
            }
        }

        fn provider_at(base_url: String, max_retries: u32) -> OpenAIProvider {
            let config = OpenAIConfig::new()
                .with_base_url(base_url)
                .with_api_key("sk-test")
                .with_timeout(Duration::from_secs(5))
                .with_max_retries(max_retries)
                .with_retry_base_delay(Duration::from_millis(1));
            // Ignore any proxy from the environment; the server is local.
            let client = Client::builder()
                .timeout(config.timeout)
                .no_proxy()
                .build()
                .unwrap();
            OpenAIProvider { config, client }
        }

        fn request() -> CompletionRequest {
            CompletionRequest::new("req-http").with_message(MessageRole::User, "Bonjour")
        }

        #[tokio::test]
        async fn success_returns_completion() {
            let (url, hits) = serve(vec![(200, COMPLETION)]).await;

            let completion = provider_at(url, 0).complete(request()).await.unwrap();

            assert_eq!(completion.content, "Bonjour");
            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn unauthorized_maps_to_authentication_failed_without_retry() {
            let (url, hits) = serve(vec![(401, "{}"), (200, COMPLETION)]).await;

            let err = provider_at(url, 3).complete(request()).await.unwrap_err();

            assert!(matches!(err, AIError::AuthenticationFailed));
            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn rate_limit_reads_retry_after() {
            let body = r#"{"error":{"message":"Rate limit reached. Please try again in 7s."}}"#;
            let (url, _) = serve(vec![(429, body)]).await;

            let err = provider_at(url, 0).complete(request()).await.unwrap_err();

            assert!(matches!(err, AIError::RateLimited { retry_after_secs: 7 }));
        }

        #[tokio::test]
        async fn bad_request_carries_body() {
            let (url, _) = serve(vec![(400, r#"{"error":"bad"}"#)]).await;

            let err = provider_at(url, 2).complete(request()).await.unwrap_err();

            assert!(matches!(err, AIError::InvalidRequest(ref body) if body.contains("bad")));
        }

        #[tokio::test]
        async fn server_error_is_retried_then_succeeds() {
            let (url, hits) = serve(vec![(503, "down"), (200, COMPLETION)]).await;

            let completion = provider_at(url, 1).complete(request()).await.unwrap();

            assert_eq!(completion.content, "Bonjour");
            assert_eq!(hits.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn retries_stop_at_configured_limit() {
            let (url, hits) = serve(vec![(500, "a"), (502, "b"), (200, COMPLETION)]).await;

            let err = provider_at(url, 1).complete(request()).await.unwrap_err();

            assert!(matches!(err, AIError::Unavailable { .. }));
            assert_eq!(hits.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn silent_server_times_out() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}/v1", listener.local_addr().unwrap());
            tokio::spawn(async move {
                let (_socket, _) = listener.accept().await.unwrap();
                sleep(Duration::from_secs(10)).await;
            });
            let mut provider = provider_at(url, 0);
            provider.config.timeout = Duration::from_secs(1);
            provider.client = Client::builder()
                .timeout(provider.config.timeout)
                .no_proxy()
                .build()
                .unwrap();

            let err = provider.complete(request()).await.unwrap_err();

            assert!(matches!(err, AIError::Timeout { timeout_secs: 1 }));
        }

        #[tokio::test]
        async fn unexpected_status_is_network_error() {
            let (url, _) = serve(vec![(418, "teapot")]).await;

            let err = provider_at(url, 0).complete(request()).await.unwrap_err();

            assert!(matches!(err, AIError::Network(_)));
        }
    }
}

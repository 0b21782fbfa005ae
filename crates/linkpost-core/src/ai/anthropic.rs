use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{AiError, LanguageModel, Message};
use crate::util::{compact_text, is_http_url, normalize_text_option};

pub const ANTHROPIC_API_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl fmt::Debug for AnthropicClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AnthropicClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, AiError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if !is_http_url(&base_url) {
            return Err(AiError::Api {
                kind: "invalid_configuration".to_string(),
                message: format!("Language model base URL must include http:// or https://: {base_url}"),
            });
        }

        Ok(Self {
            endpoint: format!("{base_url}/v1/messages"),
            api_key: normalize_text_option(api_key),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: reqwest::Client::builder().build()?,
        })
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>, max_tokens: u32) -> Self {
        self.model = model.into();
        self.max_tokens = max_tokens;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl From<ApiErrorBody> for AiError {
    fn from(body: ApiErrorBody) -> Self {
        Self::Api {
            kind: body.kind.unwrap_or_else(|| "api_error".to_string()),
            message: body.message.unwrap_or_else(|| "Unknown API error".to_string()),
        }
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> AiError {
    if let Ok(response) = serde_json::from_str::<MessagesResponse>(body) {
        if let Some(error) = response.error {
            return error.into();
        }
    }

    let trimmed = compact_text(body);
    AiError::Api {
        kind: "http_error".to_string(),
        message: if trimmed.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            format!("{} ({})", trimmed, status.as_u16())
        },
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        tracing::debug!("Sending {} message(s) to {}", messages.len(), self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&MessagesRequest {
                model: &self.model,
                max_tokens: self.max_tokens,
                system,
                messages,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match status {
            StatusCode::UNAUTHORIZED => {
                return Err(AiError::Unauthorized(parse_api_error(status, &body).to_string()))
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(AiError::RateLimited),
            _ if !status.is_success() => return Err(parse_api_error(status, &body)),
            _ => {}
        }

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|error| AiError::Api {
            kind: "invalid_response".to_string(),
            message: format!("Invalid response from API: {error}"),
        })?;
        if let Some(error) = parsed.error {
            tracing::warn!("Language model returned an error payload");
            return Err(error.into());
        }

        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or(AiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_one_shot_server;

    fn client(base_url: &str) -> AnthropicClient {
        AnthropicClient::new(base_url, Some("sk-test".to_string())).unwrap()
    }

    #[test]
    fn debug_redacts_api_key() {
        let debug = format!("{:?}", client(ANTHROPIC_API_BASE_URL));
        assert!(!debug.contains("sk-test"));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let client = AnthropicClient::new(ANTHROPIC_API_BASE_URL, None).unwrap();
        assert!(!client.is_configured());
        let error = client.complete("sys", &[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(error, AiError::NotConfigured));
    }

    #[tokio::test]
    async fn returns_first_text_block_and_sends_headers() {
        let body = r#"{"id":"msg_1","content":[{"type":"tool_use"},{"type":"text","text":"Hej!"}]}"#;
        let (url, request) = spawn_one_shot_server("200 OK", body).await;

        let text = client(&url)
            .complete("Be brief.", &[Message::user("Hello")])
            .await
            .unwrap();
        assert_eq!(text, "Hej!");

        let request = request.await.unwrap();
        assert!(request.request_line().starts_with("POST /v1/messages"));
        assert_eq!(request.header("x-api-key").as_deref(), Some("sk-test"));
        assert_eq!(
            request.header("anthropic-version").as_deref(),
            Some("2023-06-01")
        );

        let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(sent["model"], DEFAULT_MODEL);
        assert_eq!(sent["max_tokens"], 4096);
        assert_eq!(sent["system"], "Be brief.");
        assert_eq!(sent["messages"][0]["role"], "user");
        assert_eq!(sent["messages"][0]["content"], "Hello");
    }

    #[tokio::test]
    async fn maps_unauthorized() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let (url, _request) = spawn_one_shot_server("401 Unauthorized", body).await;

        let error = client(&url).complete("", &[]).await.unwrap_err();
        assert!(matches!(error, AiError::Unauthorized(_)));
        assert!(error.to_string().starts_with("API key not configured or invalid"));
    }

    #[tokio::test]
    async fn maps_rate_limit() {
        let (url, _request) = spawn_one_shot_server("429 Too Many Requests", "{}").await;
        let error = client(&url).complete("", &[]).await.unwrap_err();
        assert!(matches!(error, AiError::RateLimited));
    }

    #[tokio::test]
    async fn maps_error_payload() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let (url, _request) = spawn_one_shot_server("529 Overloaded", body).await;

        match client(&url).complete("", &[]).await.unwrap_err() {
            AiError::Api { kind, message } => {
                assert_eq!(kind, "overloaded_error");
                assert_eq!(message, "Overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let (url, _request) = spawn_one_shot_server("200 OK", r#"{"content":[]}"#).await;
        let error = client(&url).complete("", &[]).await.unwrap_err();
        assert!(matches!(error, AiError::EmptyResponse));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let error = client(&format!("http://{address}"))
            .complete("", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(error, AiError::Network));
    }
}

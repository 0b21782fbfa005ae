//! Language-model collaborator: the HTTP client and the prompt layer on top.

mod anthropic;
mod assistant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anthropic::{AnthropicClient, ANTHROPIC_API_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
pub use assistant::{Assistant, CHAR_WARNING_THRESHOLD, LINKEDIN_CHAR_LIMIT};

/// Failures surfaced to the user as-is, so every message is human readable.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("API key not configured or invalid")]
    NotConfigured,
    #[error("API key not configured or invalid: {0}")]
    Unauthorized(String),
    #[error("API rate limit exceeded - please wait and try again")]
    RateLimited,
    #[error("Request timed out - please try again")]
    Timeout,
    #[error("Network error - check your connection")]
    Network,
    #[error("{message}")]
    Api { kind: String, message: String },
    #[error("No text response from API")]
    EmptyResponse,
    #[error("Language model request failed: {0}")]
    Http(#[source] reqwest::Error),
}

impl From<reqwest::Error> for AiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Network
        } else {
            Self::Http(error)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single request/response text completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<String, AiError>;
}

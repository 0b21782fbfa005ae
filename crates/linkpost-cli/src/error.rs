use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] linkpost_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No post text provided; pass at least one of --sv, --en or --ro")]
    EmptyContent,
    #[error("Post ID cannot be empty")]
    EmptyPostId,
    #[error("Post not found for id/prefix: {0}")]
    PostNotFound(String),
    #[error("{0}")]
    AmbiguousPostId(String),
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
    #[error(
        "Language model API key not configured. Run `linkpost auth set-api-key` or set ANTHROPIC_API_KEY."
    )]
    ApiKeyNotConfigured,
}

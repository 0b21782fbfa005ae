//! Error types for linkpost-core

use thiserror::Error;

use crate::ai::AiError;
use crate::remote::RemoteError;

/// Result type alias using linkpost-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in linkpost-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Post not found
    #[error("Post not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cloud storage error
    #[error("Cloud storage error: {0}")]
    Remote(#[from] RemoteError),

    /// Language model error
    #[error(transparent)]
    Ai(#[from] AiError),

    /// Background task panicked or was aborted
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

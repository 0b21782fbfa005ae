//! Cloud-storage collaborator used by the sync engine.
//!
//! The remote side is modelled as named JSON blobs inside a single folder of an
//! app-private namespace. Only list, create, update and download are needed.

mod google_drive;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use google_drive::{GoogleDriveClient, DRIVE_API_BASE_URL};
pub use memory::MemoryRemoteStore;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("not signed in to cloud storage")]
    NotAuthenticated,
    #[error("credentials invalid or not configured: {0}")]
    Unauthorized(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("remote file not found: {0}")]
    NotFound(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// A file or folder in the remote namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    /// Containing folder; `None` means the namespace root
    pub parent: Option<String>,
    pub is_folder: bool,
}

/// Listing predicates. Trashed files are always excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    /// Exact name match
    pub name: Option<String>,
    /// Substring name match
    pub name_contains: Option<String>,
    /// Containing folder; `None` means the namespace root
    pub parent: Option<String>,
    pub folders_only: bool,
}

impl FileQuery {
    /// Folder with the given name at the namespace root
    pub fn folder_named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            folders_only: true,
            ..Self::default()
        }
    }

    /// File with the given name inside `folder_id`
    pub fn file_in(folder_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent: Some(folder_id.into()),
            ..Self::default()
        }
    }

    /// Every JSON file inside `folder_id`
    pub fn json_files_in(folder_id: impl Into<String>) -> Self {
        Self {
            name_contains: Some(".json".to_string()),
            parent: Some(folder_id.into()),
            ..Self::default()
        }
    }

    /// Render as a Google Drive `q` expression, using `root` for a missing parent.
    pub fn to_drive_query(&self, root: &str) -> String {
        let mut clauses = Vec::new();
        if let Some(name) = &self.name {
            clauses.push(format!("name = '{}'", escape_query_value(name)));
        }
        if let Some(fragment) = &self.name_contains {
            clauses.push(format!("name contains '{}'", escape_query_value(fragment)));
        }
        if self.folders_only {
            clauses.push(format!("mimeType = '{}'", google_drive::FOLDER_MIME_TYPE));
        }
        let parent = self.parent.as_deref().unwrap_or(root);
        clauses.push(format!("'{}' in parents", escape_query_value(parent)));
        clauses.push("trashed = false".to_string());
        clauses.join(" and ")
    }

    /// Evaluate the predicates against a file (used by in-process stores).
    pub fn matches(&self, file: &RemoteFile) -> bool {
        if self.folders_only && !file.is_folder {
            return false;
        }
        if self.name.as_ref().is_some_and(|name| *name != file.name) {
            return false;
        }
        if self
            .name_contains
            .as_ref()
            .is_some_and(|fragment| !file.name.contains(fragment.as_str()))
        {
            return false;
        }
        self.parent == file.parent
    }
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Remote namespace operations consumed by the sync engine.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Whether credentials are available. No network call is made.
    fn is_authenticated(&self) -> bool;

    /// List files matching `query` (first page only).
    async fn list(&self, query: &FileQuery) -> RemoteResult<Vec<RemoteFile>>;

    /// Create a folder at the namespace root.
    async fn create_folder(&self, name: &str) -> RemoteResult<RemoteFile>;

    /// Create a JSON file inside `folder_id`.
    async fn create_file(
        &self,
        folder_id: &str,
        name: &str,
        content: &str,
    ) -> RemoteResult<RemoteFile>;

    /// Overwrite the content of an existing file.
    async fn update_file(&self, file_id: &str, content: &str) -> RemoteResult<()>;

    /// Fetch the content of a file.
    async fn download(&self, file_id: &str) -> RemoteResult<String>;
}

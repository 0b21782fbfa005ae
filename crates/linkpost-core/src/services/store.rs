//! Shared post store used by the session, the sync engine and the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, PostRepository, SettingsRepository, SqlitePostRepository, SqliteSettingsRepository,
};
use crate::models::{Post, PostId, Settings};
use crate::Result;

/// Thread-safe handle for post and settings persistence.
///
/// Every call goes straight to `SQLite`; there is no cache in front of it.
#[derive(Clone)]
pub struct PostStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl PostStore {
    /// Open a store backed by the database file at `db_path`, creating parent directories.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open(&db_path)?;
        tracing::debug!("Opened post store at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing database file, if any.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Persist the full state of a post.
    pub async fn save(&self, post: &Post) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqlitePostRepository::new(db.connection());
        repo.save(post)
    }

    /// Load a post by ID.
    pub async fn load(&self, id: &PostId) -> Result<Option<Post>> {
        let db = self.db.lock().await;
        let repo = SqlitePostRepository::new(db.connection());
        repo.get(id)
    }

    /// Load every readable post, most recently modified first.
    pub async fn load_all(&self) -> Result<Vec<Post>> {
        let db = self.db.lock().await;
        let repo = SqlitePostRepository::new(db.connection());
        repo.list()
    }

    /// Delete a post locally. Returns whether anything was removed.
    pub async fn delete(&self, id: &PostId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = SqlitePostRepository::new(db.connection());
        repo.delete(id)
    }

    /// List post IDs that start with `prefix`.
    pub async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let repo = SqlitePostRepository::new(db.connection());
        repo.list_ids_by_prefix(prefix, limit)
    }

    /// Load persisted settings.
    pub async fn settings(&self) -> Result<Settings> {
        let db = self.db.lock().await;
        let repo = SqliteSettingsRepository::new(db.connection());
        repo.load()
    }

    /// Set the markdown formatting preference.
    pub async fn set_markdown_mode(&self, enabled: bool) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqliteSettingsRepository::new(db.connection());
        repo.set_markdown_mode(enabled)
    }

    /// Enable or disable cloud sync.
    pub async fn set_cloud_sync_enabled(&self, enabled: bool) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqliteSettingsRepository::new(db.connection());
        repo.set_cloud_sync_enabled(enabled)
    }

    /// Record the completion time of a sync.
    pub async fn set_last_sync_timestamp(&self, timestamp: i64) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqliteSettingsRepository::new(db.connection());
        repo.set_last_sync_timestamp(timestamp)
    }
}

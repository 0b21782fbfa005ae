use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::{SkipReason, SyncOutcome, SyncReport, DEFAULT_FOLDER_NAME};
use crate::models::Post;
use crate::remote::{FileQuery, RemoteStore};
use crate::services::PostStore;
use crate::state::SyncStatus;
use crate::util::now_millis;
use crate::{Error, Result};

/// Reconciles the local post store with one remote app folder.
///
/// The newer `modified_at` wins; equal timestamps keep whichever copy is
/// already stored. Runs are serialized, and every transition is published on
/// the status channel.
pub struct SyncEngine {
    store: PostStore,
    remote: Arc<dyn RemoteStore>,
    folder_name: String,
    status: watch::Sender<SyncStatus>,
    running: Mutex<()>,
}

impl SyncEngine {
    pub fn new(store: PostStore, remote: Arc<dyn RemoteStore>) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            store,
            remote,
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            status,
            running: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_folder_name(mut self, folder_name: impl Into<String>) -> Self {
        self.folder_name = folder_name.into();
        self
    }

    /// Subscribe to status transitions. Starts at [`SyncStatus::Idle`].
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn current_status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    fn set_status(&self, status: SyncStatus) {
        self.status.send_replace(status);
    }

    /// Run one full reconciliation.
    ///
    /// Disabled sync and missing credentials are benign skips that report
    /// [`SyncStatus::Offline`] without touching the network. Any other failure
    /// aborts the run and reports [`SyncStatus::Error`].
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let _running = self.running.lock().await;

        let settings = match self.store.settings().await {
            Ok(settings) => settings,
            Err(err) => {
                self.set_status(SyncStatus::Error);
                error!("Sync aborted, settings unreadable: {err}");
                return Err(err);
            }
        };

        if !settings.cloud_sync_enabled {
            debug!("Cloud sync disabled, skipping");
            self.set_status(SyncStatus::Offline);
            return Ok(SyncOutcome::Skipped(SkipReason::Disabled));
        }

        if !self.remote.is_authenticated() {
            info!("Cloud storage not signed in, skipping sync");
            self.set_status(SyncStatus::Offline);
            return Ok(SyncOutcome::Skipped(SkipReason::NotAuthenticated));
        }

        self.set_status(SyncStatus::Syncing);
        info!("Starting sync with folder {}", self.folder_name);

        match self.run().await {
            Ok(report) => {
                self.set_status(SyncStatus::Synced);
                info!(
                    "Sync finished: {} created, {} updated, {} downloaded, {} corrupt",
                    report.created, report.updated, report.downloaded, report.corrupt
                );
                Ok(SyncOutcome::Completed(report))
            }
            Err(err) => {
                self.set_status(SyncStatus::Error);
                error!("Sync failed: {err}");
                Err(err)
            }
        }
    }

    async fn run(&self) -> Result<SyncReport> {
        let folder_id = self.resolve_folder().await?;
        let mut report = SyncReport::default();

        self.upload_all(&folder_id, &mut report).await?;
        self.download_all(&folder_id, &mut report).await?;

        self.store.set_last_sync_timestamp(now_millis()).await?;
        Ok(report)
    }

    async fn resolve_folder(&self) -> Result<String> {
        let existing = self
            .remote
            .list(&FileQuery::folder_named(self.folder_name.as_str()))
            .await?;
        if let Some(folder) = existing.into_iter().next() {
            return Ok(folder.id);
        }

        let folder = self.remote.create_folder(&self.folder_name).await?;
        info!("Created remote folder {}", self.folder_name);
        Ok(folder.id)
    }

    async fn upload_all(&self, folder_id: &str, report: &mut SyncReport) -> Result<()> {
        for post in self.store.load_all().await? {
            let name = post.id.file_name();
            let content = serde_json::to_string_pretty(&post)?;
            let existing = self
                .remote
                .list(&FileQuery::file_in(folder_id, name.as_str()))
                .await?;

            let Some(file) = existing.into_iter().next() else {
                self.remote.create_file(folder_id, &name, &content).await?;
                debug!("Uploaded new post {}", post.id);
                report.created += 1;
                continue;
            };

            let raw = self.remote.download(&file.id).await?;
            match parse_remote_post(&name, &raw) {
                Ok(remote) if remote.modified_at >= post.modified_at => {
                    report.skipped_upload += 1;
                }
                Ok(_) => {
                    self.remote.update_file(&file.id, &content).await?;
                    debug!("Uploaded newer copy of post {}", post.id);
                    report.updated += 1;
                }
                Err(err) => {
                    warn!("Leaving unreadable remote copy of {name} untouched: {err}");
                    report.corrupt += 1;
                    report.skipped_upload += 1;
                }
            }
        }
        Ok(())
    }

    async fn download_all(&self, folder_id: &str, report: &mut SyncReport) -> Result<()> {
        let files = self.remote.list(&FileQuery::json_files_in(folder_id)).await?;

        for file in files.into_iter().filter(|file| !file.is_folder) {
            let raw = self.remote.download(&file.id).await?;
            let remote = match parse_remote_post(&file.name, &raw) {
                Ok(post) => post,
                Err(err) => {
                    warn!("Skipping unreadable remote file {}: {err}", file.name);
                    report.corrupt += 1;
                    continue;
                }
            };

            let newer = match self.store.load(&remote.id).await? {
                Some(local) => remote.modified_at > local.modified_at,
                None => true,
            };
            if newer {
                self.store.save(&remote).await?;
                debug!("Downloaded post {}", remote.id);
                report.downloaded += 1;
            } else {
                report.skipped_download += 1;
            }
        }
        Ok(())
    }
}

/// Parse a remote file, requiring its content to belong to the file's post.
fn parse_remote_post(file_name: &str, raw: &str) -> Result<Post> {
    let post = serde_json::from_str::<Post>(raw)?;
    if post.id.file_name() != file_name {
        return Err(Error::InvalidInput(format!(
            "file {file_name} holds post {}",
            post.id
        )));
    }
    Ok(post)
}

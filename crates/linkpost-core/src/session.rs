//! Editing session: the open posts, the current post and the background loops.
//!
//! All editor state lives here instead of in process-wide globals. The current
//! post is published on a `watch` channel after every transition so front ends
//! can observe it.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ai::{AiError, Assistant};
use crate::models::{Language, Post, PostId, WorkflowStage};
use crate::services::PostStore;
use crate::state::SyncStatus;
use crate::sync::{SyncEngine, SyncOutcome};
use crate::{Error, Result};

/// An AI edit awaiting the user's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub post_id: PostId,
    pub language: Language,
    pub original: String,
    pub proposed: String,
    /// Stage applied when the change is accepted
    pub new_stage: WorkflowStage,
}

#[derive(Debug, Default)]
struct EditorState {
    open: Vec<Post>,
    current: Option<PostId>,
    /// Open posts with in-memory changes not yet persisted
    dirty: HashSet<PostId>,
    pending: Option<PendingChange>,
}

impl EditorState {
    fn post_mut(&mut self, id: PostId) -> Result<&mut Post> {
        self.open
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn current(&self) -> Option<&Post> {
        let id = self.current?;
        self.open.iter().find(|post| post.id == id)
    }

    fn current_id(&self) -> Result<PostId> {
        self.current
            .ok_or_else(|| Error::InvalidInput("No post is open".into()))
    }

    fn is_open(&self, id: PostId) -> bool {
        self.open.iter().any(|post| post.id == id)
    }

    fn remove(&mut self, id: PostId) {
        self.open.retain(|post| post.id != id);
        self.dirty.remove(&id);
        if self.pending.as_ref().is_some_and(|change| change.post_id == id) {
            self.pending = None;
        }
        if self.current == Some(id) {
            self.current = self.open.last().map(|post| post.id);
        }
    }
}

struct BackgroundTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await {
            warn!("Background task ended abnormally: {err}");
        }
    }
}

#[derive(Default)]
struct Tasks {
    autosave: Option<BackgroundTask>,
    periodic_sync: Option<BackgroundTask>,
}

struct Inner {
    store: PostStore,
    sync: Option<Arc<SyncEngine>>,
    assistant: Option<Assistant>,
    state: Mutex<EditorState>,
    current: watch::Sender<Option<Post>>,
    tasks: Mutex<Tasks>,
}

/// Cheaply cloneable handle to one editing session.
///
/// Background loops hold a clone, so call [`Session::shutdown`] when done.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(
        store: PostStore,
        sync: Option<Arc<SyncEngine>>,
        assistant: Option<Assistant>,
    ) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                store,
                sync,
                assistant,
                state: Mutex::new(EditorState::default()),
                current,
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    pub fn store(&self) -> &PostStore {
        &self.inner.store
    }

    /// Observe the current post.
    pub fn watch_current(&self) -> watch::Receiver<Option<Post>> {
        self.inner.current.subscribe()
    }

    /// Observe the sync status, if cloud sync is wired up.
    pub fn sync_status(&self) -> Option<watch::Receiver<SyncStatus>> {
        self.inner.sync.as_ref().map(|engine| engine.status())
    }

    pub async fn current(&self) -> Option<Post> {
        self.inner.state.lock().await.current().cloned()
    }

    pub async fn open_posts(&self) -> Vec<Post> {
        self.inner.state.lock().await.open.clone()
    }

    pub async fn pending_change(&self) -> Option<PendingChange> {
        self.inner.state.lock().await.pending.clone()
    }

    fn publish(&self, state: &EditorState) {
        self.inner.current.send_replace(state.current().cloned());
    }

    /// Apply `edit` to an open post, mark it unsaved and publish.
    async fn edit_post<T>(
        &self,
        id: Option<PostId>,
        edit: impl FnOnce(&mut Post) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.inner.state.lock().await;
        let id = match id {
            Some(id) => id,
            None => state.current_id()?,
        };
        let output = edit(state.post_mut(id)?)?;
        state.dirty.insert(id);
        self.publish(&state);
        Ok(output)
    }

    /// Non-blank text of `language` in the current post.
    async fn source_text(&self, language: Language) -> Result<(PostId, String)> {
        let state = self.inner.state.lock().await;
        let post = state
            .current()
            .ok_or_else(|| Error::InvalidInput("No post is open".into()))?;
        let text = post.text(language);
        if text.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "No {} text to work with",
                language.display_name()
            )));
        }
        Ok((post.id, text.to_string()))
    }

    /// The assistant with the current markdown preference applied.
    async fn assistant(&self) -> Result<Assistant> {
        let assistant = self
            .inner
            .assistant
            .clone()
            .ok_or(Error::Ai(AiError::NotConfigured))?;
        let settings = self.inner.store.settings().await?;
        Ok(assistant.with_markdown(settings.markdown_mode))
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// Open a fresh empty post and make it current.
    pub async fn new_post(&self) -> PostId {
        let post = Post::new();
        let id = post.id;
        let mut state = self.inner.state.lock().await;
        state.open.push(post);
        state.current = Some(id);
        state.dirty.insert(id);
        self.publish(&state);
        debug!("Created new post {id}");
        id
    }

    /// Open a stored post (or switch to it if already open).
    pub async fn open_post(&self, id: PostId) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if !state.is_open(id) {
            let post = self
                .inner
                .store
                .load(&id)
                .await?
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            state.open.push(post);
        }
        state.current = Some(id);
        self.publish(&state);
        debug!("Opened post {id}");
        Ok(())
    }

    /// Make an already open post current.
    pub async fn switch_to(&self, id: PostId) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if !state.is_open(id) {
            return Err(Error::NotFound(id.to_string()));
        }
        state.current = Some(id);
        self.publish(&state);
        Ok(())
    }

    /// Save and close the current post; the most recently opened one becomes current.
    pub async fn close_current(&self) -> Result<()> {
        self.save_current().await?;
        let mut state = self.inner.state.lock().await;
        let id = state.current_id()?;
        state.remove(id);
        self.publish(&state);
        debug!("Closed post {id}");
        Ok(())
    }

    pub async fn update_text(&self, language: Language, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.edit_post(None, |post| {
            post.set_text(language, text);
            Ok(())
        })
        .await
    }

    pub async fn set_stage(&self, stage: WorkflowStage) -> Result<()> {
        self.edit_post(None, |post| {
            post.set_stage(stage);
            Ok(())
        })
        .await
    }

    /// Persist the current post.
    ///
    /// Returns `false` when the post is blank; blank posts are never written
    /// but this still counts as success.
    pub async fn save_current(&self) -> Result<bool> {
        let mut state = self.inner.state.lock().await;
        let id = state.current_id()?;
        let post = state.post_mut(id)?;
        if post.is_blank() {
            return Ok(false);
        }
        self.inner.store.save(post).await?;
        state.dirty.remove(&id);
        debug!("Saved post {id}");
        Ok(true)
    }

    /// Delete a post locally. The remote copy is left untouched.
    pub async fn delete_post(&self, id: PostId) -> Result<bool> {
        let removed = self.inner.store.delete(&id).await?;
        let mut state = self.inner.state.lock().await;
        state.remove(id);
        self.publish(&state);
        debug!("Deleted post {id}");
        Ok(removed)
    }

    pub async fn snapshot(&self) -> Result<()> {
        self.edit_post(None, |post| {
            post.snapshot();
            Ok(())
        })
        .await
    }

    /// Restore the current post to history entry `index` (0 = oldest).
    pub async fn restore_version(&self, index: usize) -> Result<()> {
        self.edit_post(None, |post| post.restore_index(index)).await
    }

    /// Render the publishable text and mark the post ready to post.
    pub async fn assemble(&self) -> Result<String> {
        self.edit_post(None, Post::assemble).await
    }

    // -----------------------------------------------------------------------
    // AI actions
    // -----------------------------------------------------------------------

    /// Ask for a proofread of the Swedish text. Nothing changes until accepted.
    pub async fn proofread(&self) -> Result<PendingChange> {
        let (post_id, original) = self.source_text(Language::Swedish).await?;
        let proposed = self.assistant().await?.proofread_swedish(&original).await?;
        self.stage_change(PendingChange {
            post_id,
            language: Language::Swedish,
            original,
            proposed,
            new_stage: WorkflowStage::Proofread,
        })
        .await
    }

    /// Ask for a condensed Swedish text. Nothing changes until accepted.
    pub async fn condense(&self) -> Result<PendingChange> {
        let (post_id, original) = self.source_text(Language::Swedish).await?;
        let proposed = self.assistant().await?.condense(&original).await?;
        self.stage_change(PendingChange {
            post_id,
            language: Language::Swedish,
            original,
            proposed,
            new_stage: WorkflowStage::Condensed,
        })
        .await
    }

    async fn stage_change(&self, change: PendingChange) -> Result<PendingChange> {
        self.inner.state.lock().await.pending = Some(change.clone());
        Ok(change)
    }

    /// Apply the pending change, snapshotting the replaced state first.
    pub async fn accept_change(&self) -> Result<()> {
        let change = self
            .inner
            .state
            .lock()
            .await
            .pending
            .take()
            .ok_or_else(|| Error::InvalidInput("No change to accept".into()))?;

        self.edit_post(Some(change.post_id), |post| {
            post.snapshot();
            post.set_text(change.language, change.proposed);
            post.set_stage(change.new_stage);
            Ok(())
        })
        .await
    }

    /// Discard the pending change. Returns whether there was one.
    pub async fn reject_change(&self) -> bool {
        self.inner.state.lock().await.pending.take().is_some()
    }

    /// Translate the Swedish text into English or Romanian.
    pub async fn translate_to(&self, target: Language) -> Result<()> {
        if target == Language::Swedish {
            return Err(Error::InvalidInput(
                "Translation target must be English or Romanian".into(),
            ));
        }
        let (post_id, source) = self.source_text(Language::Swedish).await?;
        let translated = self
            .assistant()
            .await?
            .translate_from_swedish(&source, target)
            .await?;

        self.edit_post(Some(post_id), |post| {
            post.snapshot();
            post.set_text(target, translated);
            post.set_stage(WorkflowStage::Translated);
            Ok(())
        })
        .await
    }

    /// Translate into English and Romanian concurrently.
    ///
    /// Both calls run to completion. If either fails, the first error observed
    /// is returned and neither translation is applied.
    pub async fn translate_to_both(&self) -> Result<()> {
        let (post_id, source) = self.source_text(Language::Swedish).await?;
        let assistant = self.assistant().await?;

        let mut calls = JoinSet::new();
        for target in [Language::English, Language::Romanian] {
            let assistant = assistant.clone();
            let source = source.clone();
            calls.spawn(async move {
                let translated = assistant.translate_from_swedish(&source, target).await;
                (target, translated)
            });
        }

        let mut translations = Vec::with_capacity(2);
        let mut first_error = None;
        while let Some(joined) = calls.join_next().await {
            match joined {
                Ok((target, Ok(text))) => translations.push((target, text)),
                Ok((target, Err(err))) => {
                    warn!("Translation to {target} failed: {err}");
                    first_error = first_error.or(Some(err));
                }
                Err(err) => first_error = first_error.or(Some(Error::Task(err))),
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        self.edit_post(Some(post_id), |post| {
            post.snapshot();
            for (target, text) in translations {
                post.set_text(target, text);
            }
            post.set_stage(WorkflowStage::Translated);
            Ok(())
        })
        .await
    }

    /// Translate English or Romanian text back into Swedish. The stage is kept.
    pub async fn translate_to_swedish(&self, from: Language) -> Result<()> {
        if from == Language::Swedish {
            return Err(Error::InvalidInput(
                "Source language must be English or Romanian".into(),
            ));
        }
        let (post_id, source) = self.source_text(from).await?;
        let translated = self
            .assistant()
            .await?
            .translate_to_swedish(&source, from)
            .await?;

        self.edit_post(Some(post_id), |post| {
            post.snapshot();
            post.set_text(Language::Swedish, translated);
            Ok(())
        })
        .await
    }

    /// Alternative phrasings for a selected piece of `language` text.
    pub async fn translation_help(&self, language: Language, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("No text selected".into()));
        }
        self.assistant()
            .await?
            .translation_help(text, language)
            .await
    }

    /// Replace the characters in `range` of the current post's `language` text.
    pub async fn accept_suggestion(
        &self,
        language: Language,
        range: Range<usize>,
        suggestion: &str,
    ) -> Result<()> {
        self.edit_post(None, |post| {
            let spliced = splice_chars(post.text(language), range, suggestion)?;
            post.set_text(language, spliced);
            Ok(())
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Sync and background loops
    // -----------------------------------------------------------------------

    /// Run one sync, then reload open posts without unsaved changes.
    pub async fn sync_now(&self) -> Result<SyncOutcome> {
        let engine = self
            .inner
            .sync
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("Cloud sync is not configured".into()))?;
        let outcome = engine.sync().await?;
        if matches!(outcome, SyncOutcome::Completed(report) if report.downloaded > 0) {
            self.refresh_clean_posts().await?;
        }
        Ok(outcome)
    }

    async fn refresh_clean_posts(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let clean: Vec<PostId> = state
            .open
            .iter()
            .map(|post| post.id)
            .filter(|id| !state.dirty.contains(id))
            .collect();
        for id in clean {
            if let Some(stored) = self.inner.store.load(&id).await? {
                *state.post_mut(id)? = stored;
            }
        }
        self.publish(&state);
        Ok(())
    }

    /// Persist the current post if it has unsaved, non-blank changes.
    pub async fn autosave(&self) -> Result<bool> {
        let dirty = {
            let state = self.inner.state.lock().await;
            state
                .current
                .is_some_and(|id| state.dirty.contains(&id))
        };
        if !dirty {
            return Ok(false);
        }
        self.save_current().await
    }

    /// Start the autosave loop, replacing any running one.
    pub async fn start_autosave(&self, period: Duration) {
        let session = self.clone();
        let task = spawn_interval(period, "autosave", move || {
            let session = session.clone();
            async move {
                if let Err(err) = session.autosave().await {
                    warn!("Autosave failed: {err}");
                }
            }
        });
        let previous = self.inner.tasks.lock().await.autosave.replace(task);
        if let Some(previous) = previous {
            previous.stop().await;
        }
    }

    /// Start the periodic sync loop, replacing any running one.
    ///
    /// Iterations are skipped while cloud sync is disabled. Without a sync
    /// engine no loop is started.
    pub async fn start_periodic_sync(&self, period: Duration) {
        if self.inner.sync.is_none() {
            debug!("No sync engine configured, periodic sync not started");
            return;
        }
        let session = self.clone();
        let task = spawn_interval(period, "periodic sync", move || {
            let session = session.clone();
            async move {
                match session.inner.store.settings().await {
                    Ok(settings) if settings.cloud_sync_enabled => {
                        if let Err(err) = session.sync_now().await {
                            warn!("Periodic sync failed: {err}");
                        }
                    }
                    Ok(_) => debug!("Cloud sync disabled, skipping periodic sync"),
                    Err(err) => warn!("Periodic sync could not read settings: {err}"),
                }
            }
        });
        let previous = self.inner.tasks.lock().await.periodic_sync.replace(task);
        if let Some(previous) = previous {
            previous.stop().await;
        }
    }

    /// Stop both loops and wait for them to finish.
    pub async fn shutdown(&self) {
        let tasks = std::mem::take(&mut *self.inner.tasks.lock().await);
        for task in [tasks.autosave, tasks.periodic_sync].into_iter().flatten() {
            task.stop().await;
        }
        info!("Session background tasks stopped");
    }
}

/// Run `tick` every `period` until cancelled. Cancellation is observed between ticks.
fn spawn_interval<F, Fut>(period: Duration, name: &'static str, mut tick: F) -> BackgroundTask
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        debug!("Started {name} loop every {}s", period.as_secs());
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = interval.tick() => tick().await,
            }
        }
        debug!("Stopped {name} loop");
    });
    BackgroundTask { cancel, handle }
}

fn splice_chars(text: &str, range: Range<usize>, replacement: &str) -> Result<String> {
    let len = text.chars().count();
    if range.start > range.end || range.end > len {
        return Err(Error::InvalidInput(format!(
            "Selection {}..{} is outside the text ({len} characters)",
            range.start, range.end
        )));
    }
    Ok(text
        .chars()
        .take(range.start)
        .chain(replacement.chars())
        .chain(text.chars().skip(range.end))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{LanguageModel, Message};
    use crate::remote::MemoryRemoteStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Echoes the input with a prefix chosen by the prompt's target language.
    #[derive(Default)]
    struct FakeModel {
        fail_english: bool,
        fail_romanian: bool,
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn complete(
            &self,
            system: &str,
            messages: &[Message],
        ) -> std::result::Result<String, AiError> {
            let input = &messages[0].content;
            if system.contains("to Romanian") {
                if self.fail_romanian {
                    return Err(AiError::RateLimited);
                }
                return Ok(format!("ro:{input}"));
            }
            if system.contains("to English") {
                if self.fail_english {
                    return Err(AiError::Timeout);
                }
                return Ok(format!("en:{input}"));
            }
            if system.contains("to Swedish") {
                return Ok(format!("sv:{input}"));
            }
            if system.contains("proofread") {
                return Ok(format!("{input}!"));
            }
            if system.contains("concise") {
                return Ok("short".to_string());
            }
            Ok("1. first\n2. second\n3. third".to_string())
        }
    }

    fn session_with(model: Option<FakeModel>) -> Session {
        let store = PostStore::open_in_memory().unwrap();
        let assistant = model.map(|model| Assistant::new(Arc::new(model)));
        Session::new(store, None, assistant)
    }

    fn session() -> Session {
        session_with(Some(FakeModel::default()))
    }

    async fn current(session: &Session) -> Post {
        session.current().await.unwrap()
    }

    #[tokio::test]
    async fn new_post_becomes_current_and_is_published() {
        let session = session();
        let mut watcher = session.watch_current();

        let id = session.new_post().await;

        assert!(watcher.has_changed().unwrap());
        assert_eq!(watcher.borrow_and_update().as_ref().map(|p| p.id), Some(id));
        assert_eq!(session.open_posts().await.len(), 1);
    }

    #[tokio::test]
    async fn blank_post_save_is_successful_noop() {
        let session = session();
        session.new_post().await;

        assert!(!session.save_current().await.unwrap());
        assert!(session.store().load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_and_reopen_round_trip() {
        let session = session();
        let id = session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();
        session.set_stage(WorkflowStage::Reviewed).await.unwrap();
        assert!(session.save_current().await.unwrap());

        session.close_current().await.unwrap();
        assert!(session.current().await.is_none());

        session.open_post(id).await.unwrap();
        let post = current(&session).await;
        assert_eq!(post.swedish_text, "Hej");
        assert_eq!(post.workflow_stage, WorkflowStage::Reviewed);
    }

    #[tokio::test]
    async fn open_missing_post_is_not_found() {
        let session = session();
        let error = session.open_post(PostId::new()).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn switch_and_close_select_last_open_post() {
        let session = session();
        let first = session.new_post().await;
        let second = session.new_post().await;

        session.switch_to(first).await.unwrap();
        assert_eq!(current(&session).await.id, first);
        assert!(session.switch_to(PostId::new()).await.is_err());

        session.close_current().await.unwrap();
        assert_eq!(current(&session).await.id, second);
    }

    #[tokio::test]
    async fn edits_without_open_post_are_rejected() {
        let session = session();
        let error = session
            .update_text(Language::Swedish, "x")
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn delete_removes_from_store_and_open_set() {
        let session = session();
        let id = session.new_post().await;
        session.update_text(Language::English, "Hi").await.unwrap();
        session.save_current().await.unwrap();

        assert!(session.delete_post(id).await.unwrap());
        assert!(session.current().await.is_none());
        assert!(session.store().load(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_version_is_reversible() {
        let session = session();
        session.new_post().await;
        session.update_text(Language::Swedish, "v1").await.unwrap();
        session.snapshot().await.unwrap();
        session.update_text(Language::Swedish, "v2").await.unwrap();

        session.restore_version(0).await.unwrap();
        assert_eq!(current(&session).await.swedish_text, "v1");

        session.restore_version(1).await.unwrap();
        assert_eq!(current(&session).await.swedish_text, "v2");
    }

    #[tokio::test]
    async fn proofread_is_applied_only_when_accepted() {
        let session = session();
        session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();

        let change = session.proofread().await.unwrap();
        assert_eq!(change.proposed, "Hej!");
        assert_eq!(current(&session).await.swedish_text, "Hej");

        session.accept_change().await.unwrap();
        let post = current(&session).await;
        assert_eq!(post.swedish_text, "Hej!");
        assert_eq!(post.workflow_stage, WorkflowStage::Proofread);
        assert_eq!(post.version_history.len(), 1);
        assert_eq!(post.version_history[0].swedish_text, "Hej");
        assert!(session.pending_change().await.is_none());
    }

    #[tokio::test]
    async fn rejected_condense_leaves_post_untouched() {
        let session = session();
        session.new_post().await;
        session.update_text(Language::Swedish, "lång text").await.unwrap();
        let before = current(&session).await;

        let change = session.condense().await.unwrap();
        assert_eq!(change.new_stage, WorkflowStage::Condensed);
        assert!(session.reject_change().await);
        assert!(!session.reject_change().await);

        assert_eq!(current(&session).await, before);
        assert!(session.accept_change().await.is_err());
    }

    #[tokio::test]
    async fn ai_actions_require_source_text() {
        let session = session();
        session.new_post().await;
        let error = session.proofread().await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn ai_actions_require_configured_model() {
        let session = session_with(None);
        session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();

        let error = session.translate_to(Language::English).await.unwrap_err();
        assert!(matches!(error, Error::Ai(AiError::NotConfigured)));
    }

    #[tokio::test]
    async fn translate_to_sets_text_and_stage() {
        let session = session();
        session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();

        session.translate_to(Language::Romanian).await.unwrap();

        let post = current(&session).await;
        assert_eq!(post.romanian_text, "ro:Hej");
        assert_eq!(post.workflow_stage, WorkflowStage::Translated);
        assert_eq!(post.version_history.len(), 1);
        assert!(session.translate_to(Language::Swedish).await.is_err());
    }

    #[tokio::test]
    async fn translate_to_both_applies_both() {
        let session = session();
        session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();

        session.translate_to_both().await.unwrap();

        let post = current(&session).await;
        assert_eq!(post.english_text, "en:Hej");
        assert_eq!(post.romanian_text, "ro:Hej");
        assert_eq!(post.workflow_stage, WorkflowStage::Translated);
    }

    #[tokio::test]
    async fn translate_to_both_is_all_or_nothing() {
        let session = session_with(Some(FakeModel {
            fail_romanian: true,
            ..FakeModel::default()
        }));
        session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();
        let before = current(&session).await;

        let error = session.translate_to_both().await.unwrap_err();

        assert!(matches!(error, Error::Ai(AiError::RateLimited)));
        assert_eq!(current(&session).await, before);
    }

    #[tokio::test]
    async fn translate_to_both_surfaces_one_error_when_both_fail() {
        let session = session_with(Some(FakeModel {
            fail_english: true,
            fail_romanian: true,
        }));
        session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();
        let before = current(&session).await;

        let error = session.translate_to_both().await.unwrap_err();

        assert!(matches!(
            error,
            Error::Ai(AiError::Timeout | AiError::RateLimited)
        ));
        assert_eq!(current(&session).await, before);
    }

    #[tokio::test]
    async fn translate_to_swedish_keeps_stage() {
        let session = session();
        session.new_post().await;
        session.update_text(Language::English, "Hello").await.unwrap();
        session.set_stage(WorkflowStage::Translated).await.unwrap();

        session.translate_to_swedish(Language::English).await.unwrap();

        let post = current(&session).await;
        assert_eq!(post.swedish_text, "sv:Hello");
        assert_eq!(post.workflow_stage, WorkflowStage::Translated);
    }

    #[tokio::test]
    async fn translation_help_and_suggestion_splice() {
        let session = session();
        session.new_post().await;
        session
            .update_text(Language::English, "Hej världen")
            .await
            .unwrap();

        let alternatives = session
            .translation_help(Language::English, "världen")
            .await
            .unwrap();
        assert_eq!(alternatives, vec!["first", "second", "third"]);

        session
            .accept_suggestion(Language::English, 4..11, "alla")
            .await
            .unwrap();
        assert_eq!(current(&session).await.english_text, "Hej alla");

        assert!(session
            .accept_suggestion(Language::English, 3..20, "x")
            .await
            .is_err());
        assert!(session.translation_help(Language::English, " ").await.is_err());
    }

    #[tokio::test]
    async fn assemble_marks_ready_to_post() {
        let session = session();
        session.new_post().await;
        assert!(session.assemble().await.is_err());

        session.update_text(Language::Swedish, "Hej").await.unwrap();
        let text = session.assemble().await.unwrap();
        assert!(text.contains("Hej"));
        assert_eq!(
            current(&session).await.workflow_stage,
            WorkflowStage::ReadyToPost
        );
    }

    #[tokio::test]
    async fn autosave_only_writes_dirty_posts() {
        let session = session();
        session.new_post().await;
        assert!(!session.autosave().await.unwrap());

        session.update_text(Language::Swedish, "Hej").await.unwrap();
        assert!(session.autosave().await.unwrap());
        assert!(!session.autosave().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_loop_runs_until_shutdown() {
        let session = session();
        let id = session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();
        session.start_autosave(Duration::from_secs(30)).await;

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(session.store().load(&id).await.unwrap().is_some());

        session.shutdown().await;
        session.update_text(Language::Swedish, "Later").await.unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;

        let stored = session.store().load(&id).await.unwrap().unwrap();
        assert_eq!(stored.swedish_text, "Hej");
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_sync_uploads_saved_posts() {
        let store = PostStore::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = Arc::new(SyncEngine::new(store.clone(), Arc::new(remote.clone())));
        let session = Session::new(store, Some(engine), None);

        session.new_post().await;
        session.update_text(Language::Swedish, "Hej").await.unwrap();
        session.save_current().await.unwrap();
        session.start_periodic_sync(Duration::from_secs(300)).await;

        tokio::time::sleep(Duration::from_secs(301)).await;
        session.shutdown().await;

        assert_eq!(remote.file_count(), 1);
        let status = session.sync_status().unwrap();
        assert_eq!(*status.borrow(), SyncStatus::Synced);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_sync_without_engine_starts_no_loop() {
        let session = session();
        session.start_periodic_sync(Duration::from_secs(300)).await;

        assert!(session.inner.tasks.lock().await.periodic_sync.is_none());
        tokio::time::sleep(Duration::from_secs(601)).await;
        session.shutdown().await;
    }

    #[tokio::test]
    async fn sync_refreshes_clean_open_posts() {
        let remote = MemoryRemoteStore::new();
        let other_store = PostStore::open_in_memory().unwrap();
        let other = SyncEngine::new(other_store.clone(), Arc::new(remote.clone()));

        let store = PostStore::open_in_memory().unwrap();
        let engine = Arc::new(SyncEngine::new(store.clone(), Arc::new(remote.clone())));
        let session = Session::new(store, Some(engine), None);
        let id = session.new_post().await;
        session.update_text(Language::Swedish, "old").await.unwrap();
        session.save_current().await.unwrap();
        session.sync_now().await.unwrap();

        other.sync().await.unwrap();
        let mut newer = other_store.load(&id).await.unwrap().unwrap();
        newer.set_text(Language::Swedish, "new");
        newer.modified_at += 1_000;
        other_store.save(&newer).await.unwrap();
        other.sync().await.unwrap();

        session.sync_now().await.unwrap();
        assert_eq!(current(&session).await.swedish_text, "new");
    }

    #[test]
    fn splice_counts_characters() {
        assert_eq!(splice_chars("åäö", 1..2, "x").unwrap(), "åxö");
        assert_eq!(splice_chars("abc", 3..3, "d").unwrap(), "abcd");
        assert!(splice_chars("abc", 2..1, "x").is_err());
    }
}

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{FileQuery, RemoteError, RemoteFile, RemoteResult, RemoteStore};

#[derive(Debug)]
struct StoredFile {
    file: RemoteFile,
    content: String,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, StoredFile>,
    next_id: u64,
    creates: usize,
    updates: usize,
    failing_downloads: HashSet<String>,
    unavailable: Option<String>,
}

impl State {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    fn check_available(&self) -> RemoteResult<()> {
        match &self.unavailable {
            Some(message) => Err(RemoteError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

/// In-process remote store.
///
/// Clones share the same namespace, so several sync engines can converge
/// through one instance. Fault injection covers unreachable storage and
/// per-file download failures.
#[derive(Debug, Clone)]
pub struct MemoryRemoteStore {
    state: Arc<Mutex<State>>,
    authenticated: bool,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            authenticated: true,
        }
    }

    /// A store that reports no credentials.
    pub fn signed_out() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place raw content in `folder_id`, bypassing the counters.
    pub fn put_raw(&self, folder_id: &str, name: &str, content: &str) -> String {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.files.insert(
            id.clone(),
            StoredFile {
                file: RemoteFile {
                    id: id.clone(),
                    name: name.to_string(),
                    parent: Some(folder_id.to_string()),
                    is_folder: false,
                },
                content: content.to_string(),
            },
        );
        id
    }

    /// Content of the first non-folder file called `name`.
    pub fn content_by_name(&self, name: &str) -> Option<String> {
        self.lock()
            .files
            .values()
            .find(|stored| !stored.file.is_folder && stored.file.name == name)
            .map(|stored| stored.content.clone())
    }

    /// Id of the first folder called `name`.
    pub fn folder_id(&self, name: &str) -> Option<String> {
        self.lock()
            .files
            .values()
            .find(|stored| stored.file.is_folder && stored.file.name == name)
            .map(|stored| stored.file.id.clone())
    }

    /// Number of non-folder files.
    pub fn file_count(&self) -> usize {
        self.lock()
            .files
            .values()
            .filter(|stored| !stored.file.is_folder)
            .count()
    }

    pub fn create_count(&self) -> usize {
        self.lock().creates
    }

    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    /// Make every download of `file_id` fail.
    pub fn fail_downloads(&self, file_id: &str) {
        self.lock().failing_downloads.insert(file_id.to_string());
    }

    /// Fail every operation with `message`, or recover with `None`.
    pub fn set_unavailable(&self, message: Option<&str>) {
        self.lock().unavailable = message.map(str::to_string);
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn list(&self, query: &FileQuery) -> RemoteResult<Vec<RemoteFile>> {
        let state = self.lock();
        state.check_available()?;
        Ok(state
            .files
            .values()
            .filter(|stored| query.matches(&stored.file))
            .map(|stored| stored.file.clone())
            .collect())
    }

    async fn create_folder(&self, name: &str) -> RemoteResult<RemoteFile> {
        let mut state = self.lock();
        state.check_available()?;
        let id = state.allocate_id();
        let file = RemoteFile {
            id: id.clone(),
            name: name.to_string(),
            parent: None,
            is_folder: true,
        };
        state.files.insert(
            id,
            StoredFile {
                file: file.clone(),
                content: String::new(),
            },
        );
        Ok(file)
    }

    async fn create_file(
        &self,
        folder_id: &str,
        name: &str,
        content: &str,
    ) -> RemoteResult<RemoteFile> {
        let mut state = self.lock();
        state.check_available()?;
        if !state
            .files
            .get(folder_id)
            .is_some_and(|stored| stored.file.is_folder)
        {
            return Err(RemoteError::NotFound(folder_id.to_string()));
        }

        let id = state.allocate_id();
        let file = RemoteFile {
            id: id.clone(),
            name: name.to_string(),
            parent: Some(folder_id.to_string()),
            is_folder: false,
        };
        state.files.insert(
            id,
            StoredFile {
                file: file.clone(),
                content: content.to_string(),
            },
        );
        state.creates += 1;
        Ok(file)
    }

    async fn update_file(&self, file_id: &str, content: &str) -> RemoteResult<()> {
        let mut state = self.lock();
        state.check_available()?;
        let stored = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| RemoteError::NotFound(file_id.to_string()))?;
        stored.content = content.to_string();
        state.updates += 1;
        Ok(())
    }

    async fn download(&self, file_id: &str) -> RemoteResult<String> {
        let state = self.lock();
        state.check_available()?;
        if state.failing_downloads.contains(file_id) {
            return Err(RemoteError::Api(format!("download failed: {file_id}")));
        }
        state
            .files
            .get(file_id)
            .map(|stored| stored.content.clone())
            .ok_or_else(|| RemoteError::NotFound(file_id.to_string()))
    }
}

//! Last-writer-wins reconciliation between the local store and a remote app folder.

mod engine;

pub use engine::SyncEngine;

/// Default name of the remote folder holding every post.
pub const DEFAULT_FOLDER_NAME: &str = "LinkedInCommunicator";

/// Per-document counters for a completed sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local posts uploaded as new remote files
    pub created: usize,
    /// Remote files overwritten with a newer local copy
    pub updated: usize,
    /// Local posts whose remote copy was at least as fresh
    pub skipped_upload: usize,
    /// Remote posts written to the local store
    pub downloaded: usize,
    /// Remote posts not newer than the local copy
    pub skipped_download: usize,
    /// Remote files that failed to parse
    pub corrupt: usize,
}

impl SyncReport {
    /// Whether the run changed either side.
    pub fn changed_anything(&self) -> bool {
        self.created + self.updated + self.downloaded > 0
    }
}

/// Why a sync run did not touch the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NotAuthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    Skipped(SkipReason),
}

impl SyncOutcome {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}

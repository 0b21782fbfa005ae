//! Bounded version history for posts.
//!
//! A snapshot is taken right before any change that overwrites text or stage
//! wholesale (AI transforms, restores). Only the most recent
//! [`MAX_VERSION_HISTORY`] snapshots are retained, oldest evicted first.

use crate::error::{Error, Result};
use crate::models::{Post, PostVersion};
use crate::util::now_millis;

/// Maximum number of snapshots kept per post
pub const MAX_VERSION_HISTORY: usize = 50;

impl Post {
    /// Capture the current texts and stage at the end of the history.
    ///
    /// Does not touch `modified_at`; the change that follows a snapshot does.
    pub fn snapshot(&mut self) -> &PostVersion {
        self.snapshot_at(now_millis())
    }

    pub(crate) fn snapshot_at(&mut self, timestamp: i64) -> &PostVersion {
        let version = PostVersion {
            timestamp,
            swedish_text: self.swedish_text.clone(),
            english_text: self.english_text.clone(),
            romanian_text: self.romanian_text.clone(),
            workflow_stage: self.workflow_stage,
        };
        self.version_history.push(version);
        if self.version_history.len() > MAX_VERSION_HISTORY {
            let overflow = self.version_history.len() - MAX_VERSION_HISTORY;
            self.version_history.drain(..overflow);
        }
        tracing::debug!(
            "Captured version of post {} ({} in history)",
            self.id,
            self.version_history.len()
        );
        &self.version_history[self.version_history.len() - 1]
    }

    /// Overwrite texts and stage with `version`.
    ///
    /// The state being replaced is snapshotted first, so a restore can always be undone.
    pub fn restore(&mut self, version: PostVersion) {
        self.snapshot();
        self.swedish_text = version.swedish_text;
        self.english_text = version.english_text;
        self.romanian_text = version.romanian_text;
        self.workflow_stage = version.workflow_stage;
        self.touch();
        tracing::debug!(
            "Restored post {} to version from {}",
            self.id,
            version.timestamp
        );
    }

    /// Restore the history entry at `index` (0 = oldest).
    pub fn restore_index(&mut self, index: usize) -> Result<()> {
        let version = self.version_history.get(index).cloned().ok_or_else(|| {
            Error::InvalidInput(format!(
                "Version index {index} out of range (history has {} entries)",
                self.version_history.len()
            ))
        })?;
        self.restore(version);
        Ok(())
    }
}

//! Application settings model

use serde::{Deserialize, Serialize};

/// Persisted user preferences read by the sync engine and the AI actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether AI transforms may answer with markdown formatting
    pub markdown_mode: bool,
    /// Whether posts are synced to the cloud drive
    pub cloud_sync_enabled: bool,
    /// Completion time of the last successful sync (Unix ms, 0 = never)
    pub last_sync_timestamp: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            markdown_mode: false,
            cloud_sync_enabled: true,
            last_sync_timestamp: 0,
        }
    }
}

impl Settings {
    /// Check if a sync has ever completed
    pub const fn has_synced(&self) -> bool {
        self.last_sync_timestamp > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(!settings.markdown_mode);
        assert!(settings.cloud_sync_enabled);
        assert_eq!(settings.last_sync_timestamp, 0);
        assert!(!settings.has_synced());
    }
}

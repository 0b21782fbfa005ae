//! Application configuration.
//!
//! Provides `AppConfig`, the non-secret settings shared by the CLI and any
//! other front end: remote endpoints, the remote folder name, model choice and
//! background loop intervals. Credentials are never stored here.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::{ANTHROPIC_API_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::remote::DRIVE_API_BASE_URL;
use crate::sync::DEFAULT_FOLDER_NAME;
use crate::util::is_http_url;
use crate::{Error, Result};

const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub drive_folder_name: String,
    pub drive_api_base_url: String,
    pub anthropic_base_url: String,
    pub anthropic_model: String,
    pub max_tokens: u32,
    pub autosave_interval_secs: u64,
    pub sync_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            drive_folder_name: DEFAULT_FOLDER_NAME.to_string(),
            drive_api_base_url: DRIVE_API_BASE_URL.to_string(),
            anthropic_base_url: ANTHROPIC_API_BASE_URL.to_string(),
            anthropic_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::InvalidInput(format!("invalid config JSON: {error}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(payload) => Self::from_json(&payload),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.drive_folder_name.trim().is_empty() {
            return Err(invalid("drive_folder_name must not be empty"));
        }
        require_http_url(&self.drive_api_base_url, "drive_api_base_url")?;
        require_http_url(&self.anthropic_base_url, "anthropic_base_url")?;
        if self.anthropic_model.trim().is_empty() {
            return Err(invalid("anthropic_model must not be empty"));
        }
        if self.max_tokens == 0 {
            return Err(invalid("max_tokens must be positive"));
        }
        if self.autosave_interval_secs == 0 || self.sync_interval_secs == 0 {
            return Err(invalid("intervals must be at least one second"));
        }
        Ok(())
    }

    pub const fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub const fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidInput(format!("config: {message}"))
}

fn require_http_url(value: &str, field: &str) -> Result<()> {
    if is_http_url(value.trim()) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "config: '{field}' must include http:// or https://"
        )))
    }
}

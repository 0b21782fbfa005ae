//! Settings repository implementation

use crate::error::{Error, Result};
use crate::models::Settings;
use rusqlite::{params, Connection, OptionalExtension};

const KEY_MARKDOWN_MODE: &str = "markdown_mode";
const KEY_CLOUD_SYNC_ENABLED: &str = "cloud_sync_enabled";
const KEY_LAST_SYNC_TIMESTAMP: &str = "last_sync_timestamp";

/// Trait for settings storage operations
pub trait SettingsRepository {
    /// Load settings from the database
    fn load(&self) -> Result<Settings>;

    /// Set the markdown formatting preference
    fn set_markdown_mode(&self, enabled: bool) -> Result<()>;

    /// Enable or disable cloud sync
    fn set_cloud_sync_enabled(&self, enabled: bool) -> Result<()>;

    /// Record when the last sync completed (Unix ms)
    fn set_last_sync_timestamp(&self, timestamp: i64) -> Result<()>;
}

/// `SQLite` implementation of `SettingsRepository`
pub struct SqliteSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        // Missing or malformed keys keep their defaults
        if let Some(value) = self.get_setting(KEY_MARKDOWN_MODE)? {
            settings.markdown_mode = parse_bool(&value).unwrap_or(settings.markdown_mode);
        }

        if let Some(value) = self.get_setting(KEY_CLOUD_SYNC_ENABLED)? {
            settings.cloud_sync_enabled =
                parse_bool(&value).unwrap_or(settings.cloud_sync_enabled);
        }

        if let Some(value) = self.get_setting(KEY_LAST_SYNC_TIMESTAMP)? {
            if let Ok(timestamp) = value.trim().parse() {
                settings.last_sync_timestamp = timestamp;
            }
        }

        Ok(settings)
    }

    fn set_markdown_mode(&self, enabled: bool) -> Result<()> {
        self.set_setting(KEY_MARKDOWN_MODE, bool_str(enabled))
    }

    fn set_cloud_sync_enabled(&self, enabled: bool) -> Result<()> {
        self.set_setting(KEY_CLOUD_SYNC_ENABLED, bool_str(enabled))
    }

    fn set_last_sync_timestamp(&self, timestamp: i64) -> Result<()> {
        if timestamp < 0 {
            return Err(Error::InvalidInput(format!(
                "Sync timestamp must not be negative: {timestamp}"
            )));
        }
        self.set_setting(KEY_LAST_SYNC_TIMESTAMP, &timestamp.to_string())
    }
}

impl SqliteSettingsRepository<'_> {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

const fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_load_default_settings() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        let settings = repo.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.cloud_sync_enabled);
    }

    #[test]
    fn test_setters_round_trip_all_settings() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        let settings = Settings {
            markdown_mode: true,
            cloud_sync_enabled: false,
            last_sync_timestamp: 1_700_000_000_000,
        };

        repo.set_markdown_mode(settings.markdown_mode).unwrap();
        repo.set_cloud_sync_enabled(settings.cloud_sync_enabled).unwrap();
        repo.set_last_sync_timestamp(settings.last_sync_timestamp).unwrap();
        assert_eq!(repo.load().unwrap(), settings);
    }

    #[test]
    fn test_individual_setters_replace_single_key() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        repo.set_markdown_mode(true).unwrap();
        repo.set_last_sync_timestamp(42).unwrap();
        repo.set_last_sync_timestamp(43).unwrap();

        let settings = repo.load().unwrap();
        assert!(settings.markdown_mode);
        assert!(settings.cloud_sync_enabled);
        assert_eq!(settings.last_sync_timestamp, 43);
    }

    #[test]
    fn test_malformed_values_fall_back_to_defaults() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        repo.set_setting(KEY_CLOUD_SYNC_ENABLED, "maybe").unwrap();
        repo.set_setting(KEY_LAST_SYNC_TIMESTAMP, "yesterday").unwrap();

        assert_eq!(repo.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_negative_timestamp_rejected() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());
        assert!(repo.set_last_sync_timestamp(-1).is_err());
    }
}

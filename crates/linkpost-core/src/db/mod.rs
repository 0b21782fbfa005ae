//! Database layer for Linkpost

mod connection;
mod migrations;
mod repository;
mod settings_repository;

pub use connection::Database;
pub use repository::{PostRepository, SqlitePostRepository};
pub use settings_repository::{SettingsRepository, SqliteSettingsRepository};

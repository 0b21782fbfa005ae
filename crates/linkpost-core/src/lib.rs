//! linkpost-core - Core library for Linkpost
//!
//! This crate contains the post model, version history, local `SQLite` store,
//! cloud sync engine, language-model collaborator and the editing session
//! used by Linkpost front ends.

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod models;
pub mod remote;
pub mod services;
pub mod session;
pub mod state;
pub mod sync;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
pub use models::{Language, Post, PostId, PostVersion, Settings, WorkflowStage};
pub use session::{PendingChange, Session};
pub use state::SyncStatus;

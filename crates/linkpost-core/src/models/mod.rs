//! Data models for Linkpost

mod post;
mod settings;

pub use post::{Language, Post, PostId, PostVersion, WorkflowStage};
pub use settings::Settings;

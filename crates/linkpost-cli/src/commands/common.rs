use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use linkpost_core::ai::{
    AnthropicClient, Assistant, CHAR_WARNING_THRESHOLD, LINKEDIN_CHAR_LIMIT,
};
use linkpost_core::config::AppConfig;
use linkpost_core::remote::GoogleDriveClient;
use linkpost_core::services::PostStore;
use linkpost_core::sync::SyncEngine;
use linkpost_core::{Language, Post, PostId, Session};
use serde::Serialize;

use crate::error::CliError;
use crate::secrets::{load_secret, Secret};

#[derive(Debug, Serialize)]
pub struct PostListItem {
    pub id: String,
    pub preview: String,
    pub stage: String,
    pub created_at: i64,
    pub modified_at: i64,
    pub relative_time: String,
    pub versions: usize,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("LINKPOST_DB_PATH").map(PathBuf::from))
    {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("linkpost").join("linkpost.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".into()))
}

pub fn config_path() -> Result<PathBuf, CliError> {
    if let Some(path) = env::var_os("LINKPOST_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("linkpost").join("config.json"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI config directory".into()))
}

pub fn load_config() -> Result<AppConfig, CliError> {
    let path = config_path()?;
    AppConfig::load_from_path(&path).map_err(|error| CliError::Config(error.to_string()))
}

pub fn open_store(db_path: &Path) -> Result<PostStore, CliError> {
    Ok(PostStore::open_path(db_path)?)
}

/// Sync engine over Google Drive. A missing token yields a signed-out client.
pub fn build_sync_engine(store: &PostStore, config: &AppConfig) -> Result<SyncEngine, CliError> {
    let token = load_secret(Secret::DriveAccessToken)?;
    let drive = GoogleDriveClient::new(config.drive_api_base_url.as_str(), token)
        .map_err(|error| CliError::Config(error.to_string()))?;
    Ok(SyncEngine::new(store.clone(), Arc::new(drive))
        .with_folder_name(config.drive_folder_name.as_str()))
}

/// Assistant for the configured model, if an API key is available.
pub fn build_assistant(config: &AppConfig) -> Result<Option<Assistant>, CliError> {
    let Some(api_key) = load_secret(Secret::AnthropicApiKey)? else {
        return Ok(None);
    };
    let client = AnthropicClient::new(config.anthropic_base_url.as_str(), Some(api_key))
        .map_err(|error| CliError::Config(error.to_string()))?
        .with_model(config.anthropic_model.as_str(), config.max_tokens);
    Ok(Some(Assistant::new(Arc::new(client))))
}

/// Open a session with `id` loaded as the current post.
pub async fn open_session_for(
    query: &str,
    store: &PostStore,
    assistant: Option<Assistant>,
) -> Result<Session, CliError> {
    let post = resolve_post(query, store).await?;
    let session = Session::new(store.clone(), None, assistant);
    session.open_post(post.id).await?;
    Ok(session)
}

pub async fn resolve_post(post_query: &str, store: &PostStore) -> Result<Post, CliError> {
    let post_query = normalize_post_identifier(post_query)?;
    if let Ok(post_id) = post_query.parse::<PostId>() {
        if let Some(post) = store.load(&post_id).await? {
            return Ok(post);
        }
    }

    let matching_ids = store.list_ids_by_prefix(&post_query, 3).await?;

    match matching_ids.len() {
        0 => Err(CliError::PostNotFound(post_query)),
        1 => {
            let resolved_id = matching_ids[0]
                .parse::<PostId>()
                .map_err(|_| CliError::PostNotFound(post_query.clone()))?;
            store
                .load(&resolved_id)
                .await?
                .ok_or(CliError::PostNotFound(post_query))
        }
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousPostId(format!(
                "ID prefix '{post_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn normalize_post_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyPostId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_post_lines(posts: &[Post]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    posts
        .iter()
        .map(|post| {
            let id = short_id(&post.id.to_string());
            let preview = post_preview(post, 40);
            let stage = post.workflow_stage.display_name();
            let relative_time = format_relative_time(post.modified_at, now_ms);
            format!("{id:<13}  {preview:<40}  {stage:<13}  {relative_time}")
        })
        .collect()
}

pub fn post_to_list_item(post: &Post) -> PostListItem {
    let now_ms = Utc::now().timestamp_millis();
    PostListItem {
        id: post.id.to_string(),
        preview: post_preview(post, 80),
        stage: post.workflow_stage.display_name().to_string(),
        created_at: post.created_at,
        modified_at: post.modified_at,
        relative_time: format_relative_time(post.modified_at, now_ms),
        versions: post.version_history.len(),
    }
}

pub fn post_preview(post: &Post, max_chars: usize) -> String {
    let first_line = post.title_preview(usize::MAX);
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        "(empty)".to_string()
    } else if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn text_preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Parse a `START..END` character range.
pub fn parse_char_range(raw: &str) -> Result<std::ops::Range<usize>, CliError> {
    let invalid = || CliError::InvalidSelection(format!("expected START..END, got '{raw}'"));
    let (start, end) = raw.trim().split_once("..").ok_or_else(invalid)?;
    let start = start.trim().parse::<usize>().map_err(|_| invalid())?;
    let end = end.trim().parse::<usize>().map_err(|_| invalid())?;
    if start > end {
        return Err(invalid());
    }
    Ok(start..end)
}

/// `N/3000`, flagged when close to or over LinkedIn's limit.
pub fn format_char_count(text: &str) -> String {
    let count = text.chars().count();
    let counter = format!("{count}/{LINKEDIN_CHAR_LIMIT}");
    if count > LINKEDIN_CHAR_LIMIT {
        format!("{counter} (over limit by {})", count - LINKEDIN_CHAR_LIMIT)
    } else if count > CHAR_WARNING_THRESHOLD {
        format!("{counter} (near limit)")
    } else {
        counter
    }
}

pub fn print_post(post: &Post) {
    println!("ID:       {}", post.id);
    println!("Stage:    {}", post.workflow_stage);
    println!("Created:  {}", format_timestamp(post.created_at));
    println!("Modified: {}", format_timestamp(post.modified_at));
    println!("Versions: {}", post.version_history.len());
    for language in Language::ALL {
        println!();
        let text = post.text(language);
        println!(
            "--- {} ({}) {} ---",
            language.display_name(),
            language.code(),
            format_char_count(text)
        );
        if text.trim().is_empty() {
            println!("(empty)");
        } else {
            println!("{text}");
        }
    }
}

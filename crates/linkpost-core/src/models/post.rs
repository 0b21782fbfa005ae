//! Post model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::now_millis;

/// A unique identifier for a post.
///
/// New posts get a UUID v7 (time-sortable); any UUID is accepted when parsing
/// posts written by other devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Create a new unique post ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    /// Name of the JSON object holding this post in the remote folder
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// How far a post has progressed through editing and translation.
///
/// The order is a convention only; any stage may follow any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStage {
    #[default]
    Draft,
    Proofread,
    Condensed,
    Translated,
    Reviewed,
    ReadyToPost,
}

impl WorkflowStage {
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::Proofread,
        Self::Condensed,
        Self::Translated,
        Self::Reviewed,
        Self::ReadyToPost,
    ];

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Proofread => "Proofread",
            Self::Condensed => "Condensed",
            Self::Translated => "Translated",
            Self::Reviewed => "Reviewed",
            Self::ReadyToPost => "Ready to Post",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for WorkflowStage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "proofread" => Ok(Self::Proofread),
            "condensed" => Ok(Self::Condensed),
            "translated" => Ok(Self::Translated),
            "reviewed" => Ok(Self::Reviewed),
            "ready_to_post" | "ready" => Ok(Self::ReadyToPost),
            _ => Err(Error::InvalidInput(format!("Unknown workflow stage: {s}"))),
        }
    }
}

/// One of the three languages a post is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Swedish,
    English,
    Romanian,
}

impl Language {
    pub const ALL: [Self; 3] = [Self::Swedish, Self::English, Self::Romanian];

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Swedish => "Swedish",
            Self::English => "English",
            Self::Romanian => "Romanian",
        }
    }

    /// ISO 639-1 code
    pub const fn code(self) -> &'static str {
        match self {
            Self::Swedish => "sv",
            Self::English => "en",
            Self::Romanian => "ro",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sv" | "swedish" => Ok(Self::Swedish),
            "en" | "english" => Ok(Self::English),
            "ro" | "romanian" => Ok(Self::Romanian),
            _ => Err(Error::InvalidInput(format!("Unknown language: {s}"))),
        }
    }
}

/// An immutable capture of a post's texts and stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostVersion {
    /// Capture timestamp (Unix ms)
    pub timestamp: i64,
    pub swedish_text: String,
    pub english_text: String,
    pub romanian_text: String,
    pub workflow_stage: WorkflowStage,
}

impl Default for PostVersion {
    fn default() -> Self {
        Self {
            timestamp: now_millis(),
            swedish_text: String::new(),
            english_text: String::new(),
            romanian_text: String::new(),
            workflow_stage: WorkflowStage::Draft,
        }
    }
}

/// A tri-lingual LinkedIn post with its workflow metadata and history.
///
/// Serialized with stable camelCase field names; unknown fields are ignored and
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    /// Unique identifier, fixed for the post's lifetime
    pub id: PostId,
    pub swedish_text: String,
    pub english_text: String,
    pub romanian_text: String,
    pub workflow_stage: WorkflowStage,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last modification timestamp (Unix ms), the only input to sync conflict resolution
    pub modified_at: i64,
    /// Prior states, oldest first
    pub version_history: Vec<PostVersion>,
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}

impl Post {
    /// Create a new empty draft
    #[must_use]
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: PostId::new(),
            swedish_text: String::new(),
            english_text: String::new(),
            romanian_text: String::new(),
            workflow_stage: WorkflowStage::Draft,
            created_at: now,
            modified_at: now,
            version_history: Vec::new(),
        }
    }

    /// Text for the given language
    #[must_use]
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Swedish => &self.swedish_text,
            Language::English => &self.english_text,
            Language::Romanian => &self.romanian_text,
        }
    }

    /// Replace the text for a language and bump `modified_at`
    pub fn set_text(&mut self, language: Language, text: impl Into<String>) {
        let slot = match language {
            Language::Swedish => &mut self.swedish_text,
            Language::English => &mut self.english_text,
            Language::Romanian => &mut self.romanian_text,
        };
        *slot = text.into();
        self.touch();
    }

    /// Change the workflow stage and bump `modified_at`
    pub fn set_stage(&mut self, stage: WorkflowStage) {
        self.workflow_stage = stage;
        self.touch();
    }

    /// Mark the post as modified now.
    ///
    /// `modified_at` never moves backwards, even if the wall clock does.
    pub fn touch(&mut self) {
        self.touch_at(now_millis());
    }

    pub(crate) fn touch_at(&mut self, now: i64) {
        self.modified_at = self.modified_at.max(now);
    }

    /// Check if all three texts are empty (whitespace-only counts as empty)
    #[must_use]
    pub fn is_blank(&self) -> bool {
        Language::ALL
            .iter()
            .all(|language| self.text(*language).trim().is_empty())
    }

    /// Get first line of the first non-empty text as a preview, truncated to `max_len` characters
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        Language::ALL
            .iter()
            .map(|language| self.text(*language).trim())
            .find(|text| !text.is_empty())
            .and_then(|text| text.lines().next())
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }

    /// Render the combined tri-lingual post, Swedish first.
    #[must_use]
    pub fn assembled_text(&self) -> String {
        format!(
            "[\u{1F1F8}\u{1F1EA}] [\u{1F1EC}\u{1F1E7} below] [\u{1F1F7}\u{1F1F4} mai jos]\n{}\n\n[\u{1F1EC}\u{1F1E7}] [\u{1F1F7}\u{1F1F4} mai jos]\n{}\n\n[\u{1F1F7}\u{1F1F4}]\n{}",
            self.swedish_text, self.english_text, self.romanian_text
        )
    }

    /// Assemble the post for publishing and mark it ready to post.
    pub fn assemble(&mut self) -> Result<String> {
        if self.is_blank() {
            return Err(Error::InvalidInput("No content to assemble".into()));
        }
        self.set_stage(WorkflowStage::ReadyToPost);
        Ok(self.assembled_text())
    }
}

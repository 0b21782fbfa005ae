use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use linkpost_core::Language;

#[derive(Parser)]
#[command(name = "linkpost")]
#[command(about = "Compose tri-lingual LinkedIn posts from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new post
    New {
        /// Swedish text
        #[arg(long, value_name = "TEXT")]
        sv: Option<String>,
        /// English text
        #[arg(long, value_name = "TEXT")]
        en: Option<String>,
        /// Romanian text
        #[arg(long, value_name = "TEXT")]
        ro: Option<String>,
    },
    /// List saved posts, most recently modified first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a post
    Show {
        /// Post ID or unique ID prefix
        id: String,
        /// Output the stored JSON document
        #[arg(long)]
        json: bool,
    },
    /// Replace the text of one language
    Edit {
        /// Post ID or unique ID prefix
        id: String,
        #[arg(long, value_enum)]
        lang: LanguageArg,
        /// New text
        #[arg(long)]
        text: String,
    },
    /// Set the workflow stage (e.g. draft, proofread, ready-to-post)
    Stage {
        /// Post ID or unique ID prefix
        id: String,
        stage: String,
    },
    /// Delete a post locally
    Delete {
        /// Post ID or unique ID prefix
        id: String,
    },
    /// List saved versions of a post
    History {
        /// Post ID or unique ID prefix
        id: String,
    },
    /// Restore a saved version (index from `history`)
    Restore {
        /// Post ID or unique ID prefix
        id: String,
        index: usize,
    },
    /// Print the combined post and mark it ready to post
    Assemble {
        /// Post ID or unique ID prefix
        id: String,
    },
    /// AI-assisted editing
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
    /// Sync with Google Drive once
    Sync,
    /// Keep syncing in the background until interrupted
    Watch,
    /// Show or change preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Manage stored credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum LanguageArg {
    Sv,
    En,
    Ro,
}

impl From<LanguageArg> for Language {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::Sv => Self::Swedish,
            LanguageArg::En => Self::English,
            LanguageArg::Ro => Self::Romanian,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum TranslateTarget {
    En,
    Ro,
    Both,
    Sv,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceLanguage {
    En,
    Ro,
}

impl From<SourceLanguage> for Language {
    fn from(value: SourceLanguage) -> Self {
        match value {
            SourceLanguage::En => Self::English,
            SourceLanguage::Ro => Self::Romanian,
        }
    }
}

#[derive(Subcommand)]
pub enum AiCommands {
    /// Proofread the Swedish text
    Proofread {
        /// Post ID or unique ID prefix
        id: String,
        /// Apply the proposal instead of only printing it
        #[arg(long)]
        accept: bool,
    },
    /// Condense the Swedish text towards the LinkedIn limit
    Condense {
        /// Post ID or unique ID prefix
        id: String,
        /// Apply the proposal instead of only printing it
        #[arg(long)]
        accept: bool,
    },
    /// Translate between Swedish and English/Romanian
    Translate {
        /// Post ID or unique ID prefix
        id: String,
        #[arg(long, value_enum)]
        to: TranslateTarget,
        /// Source language when translating to Swedish
        #[arg(long, value_enum, default_value_t = SourceLanguage::En)]
        from: SourceLanguage,
    },
    /// Suggest alternative phrasings for a piece of text
    Alternatives {
        /// Post ID or unique ID prefix
        id: String,
        #[arg(long, value_enum)]
        lang: LanguageArg,
        /// Text to rephrase
        text: String,
        /// Replace this character range (START..END) with the picked alternative
        #[arg(long, value_name = "START..END")]
        replace: Option<String>,
        /// Alternative to use with --replace (1-based)
        #[arg(long, default_value_t = 1)]
        pick: usize,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print current preferences
    Show,
    /// Allow markdown in AI output
    SetMarkdown {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Enable or disable cloud sync
    SetSync {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store the language model API key in the keychain
    SetApiKey { key: String },
    /// Store a Google Drive OAuth access token in the keychain
    SetDriveToken { token: String },
    /// Remove all stored credentials
    Clear,
    /// Show which credentials are available
    Status,
}

//! Linkpost CLI - compose tri-lingual LinkedIn posts from the terminal
//!
//! Posts live in a local `SQLite` store and can be backed up to Google Drive.

mod cli;
mod commands;
mod error;
mod secrets;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::ai::run_ai;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::resolve_db_path;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, run_stage};
use crate::commands::history::{run_history, run_restore};
use crate::commands::list::run_list;
use crate::commands::new::run_new;
use crate::commands::settings::run_settings;
use crate::commands::show::{run_assemble, run_show};
use crate::commands::sync::{run_sync, run_watch};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "linkpost=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Commands::New { sv, en, ro } => run_new(sv, en, ro, &db_path).await?,
        Commands::List { json } => run_list(json, &db_path).await?,
        Commands::Show { id, json } => run_show(&id, json, &db_path).await?,
        Commands::Edit { id, lang, text } => run_edit(&id, lang.into(), &text, &db_path).await?,
        Commands::Stage { id, stage } => run_stage(&id, &stage, &db_path).await?,
        Commands::Delete { id } => run_delete(&id, &db_path).await?,
        Commands::History { id } => run_history(&id, &db_path).await?,
        Commands::Restore { id, index } => run_restore(&id, index, &db_path).await?,
        Commands::Assemble { id } => run_assemble(&id, &db_path).await?,
        Commands::Ai { command } => run_ai(command, &db_path).await?,
        Commands::Sync => run_sync(&db_path).await?,
        Commands::Watch => run_watch(&db_path).await?,
        Commands::Settings { command } => run_settings(command, &db_path).await?,
        Commands::Auth { command } => run_auth(command)?,
    }

    Ok(())
}

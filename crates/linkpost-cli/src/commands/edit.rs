use std::path::Path;

use linkpost_core::{Language, WorkflowStage};

use crate::commands::common::{open_session_for, open_store};
use crate::error::CliError;

pub async fn run_edit(
    post_query: &str,
    language: Language,
    text: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let session = open_session_for(post_query, &store, None).await?;

    session.update_text(language, text).await?;
    if !session.save_current().await? {
        eprintln!("Post is now empty and was not saved.");
        return Ok(());
    }

    println!("Updated {} text", language.display_name());
    Ok(())
}

pub async fn run_stage(post_query: &str, stage: &str, db_path: &Path) -> Result<(), CliError> {
    let stage = stage.parse::<WorkflowStage>()?;
    let store = open_store(db_path)?;
    let session = open_session_for(post_query, &store, None).await?;

    session.set_stage(stage).await?;
    session.save_current().await?;

    println!("Stage set to {stage}");
    Ok(())
}

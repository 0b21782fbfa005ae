use std::path::Path;

use crate::commands::common::{
    format_timestamp, open_session_for, open_store, resolve_post, text_preview,
};
use crate::error::CliError;

pub async fn run_history(post_query: &str, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let post = resolve_post(post_query, &store).await?;

    if post.version_history.is_empty() {
        println!("No saved versions.");
        return Ok(());
    }

    for (index, version) in post.version_history.iter().enumerate() {
        println!(
            "{index:>2}  {}  {:<13}  {}",
            format_timestamp(version.timestamp),
            version.workflow_stage.display_name(),
            text_preview(&version.swedish_text, 40)
        );
    }
    Ok(())
}

pub async fn run_restore(post_query: &str, index: usize, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let session = open_session_for(post_query, &store, None).await?;

    session.restore_version(index).await?;
    session.save_current().await?;

    println!("Restored version {index}; the replaced state was saved to history");
    Ok(())
}

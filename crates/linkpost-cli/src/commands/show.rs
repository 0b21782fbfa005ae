use std::path::Path;

use crate::commands::common::{open_session_for, open_store, print_post, resolve_post};
use crate::error::CliError;

pub async fn run_show(post_query: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let post = resolve_post(post_query, &store).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else {
        print_post(&post);
    }
    Ok(())
}

pub async fn run_assemble(post_query: &str, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let session = open_session_for(post_query, &store, None).await?;

    let text = session.assemble().await?;
    session.save_current().await?;

    println!("{text}");
    Ok(())
}

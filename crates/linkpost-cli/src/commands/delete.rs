use std::path::Path;

use crate::commands::common::{open_store, resolve_post};
use crate::error::CliError;

pub async fn run_delete(post_query: &str, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let post = resolve_post(post_query, &store).await?;

    if store.delete(&post.id).await? {
        println!("Deleted {}", post.id);
    } else {
        return Err(CliError::PostNotFound(post.id.to_string()));
    }
    Ok(())
}

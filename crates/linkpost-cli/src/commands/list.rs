use std::path::Path;

use crate::commands::common::{format_post_lines, open_store, post_to_list_item, PostListItem};
use crate::error::CliError;

pub async fn run_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let posts = open_store(db_path)?.load_all().await?;

    if as_json {
        let json_items = posts
            .iter()
            .map(post_to_list_item)
            .collect::<Vec<PostListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if posts.is_empty() {
        println!("No saved posts.");
    } else {
        for line in format_post_lines(&posts) {
            println!("{line}");
        }
    }

    Ok(())
}

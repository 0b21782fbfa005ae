use std::path::Path;

use linkpost_core::{Language, Session};

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_new(
    sv: Option<String>,
    en: Option<String>,
    ro: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let texts = [
        (Language::Swedish, sv),
        (Language::English, en),
        (Language::Romanian, ro),
    ];
    if !texts
        .iter()
        .any(|(_, text)| text.as_deref().is_some_and(|text| !text.trim().is_empty()))
    {
        return Err(CliError::EmptyContent);
    }

    let store = open_store(db_path)?;
    let session = Session::new(store, None, None);
    let id = session.new_post().await;
    for (language, text) in texts {
        if let Some(text) = text {
            session.update_text(language, text).await?;
        }
    }
    session.save_current().await?;

    println!("{id}");
    Ok(())
}

use std::path::Path;

use linkpost_core::{Language, PendingChange};

use crate::cli::{AiCommands, TranslateTarget};
use crate::commands::common::{
    build_assistant, load_config, open_session_for, open_store, parse_char_range,
};
use crate::error::CliError;

pub async fn run_ai(command: AiCommands, db_path: &Path) -> Result<(), CliError> {
    let config = load_config()?;
    let assistant = build_assistant(&config)?.ok_or(CliError::ApiKeyNotConfigured)?;
    let store = open_store(db_path)?;

    match command {
        AiCommands::Proofread { id, accept } => {
            let session = open_session_for(&id, &store, Some(assistant)).await?;
            let change = session.proofread().await?;
            print_change(&change);
            if accept {
                session.accept_change().await?;
                session.save_current().await?;
                println!("Applied; stage is now {}", change.new_stage);
            }
        }
        AiCommands::Condense { id, accept } => {
            let session = open_session_for(&id, &store, Some(assistant)).await?;
            let change = session.condense().await?;
            print_change(&change);
            println!(
                "({} -> {} characters)",
                change.original.chars().count(),
                change.proposed.chars().count()
            );
            if accept {
                session.accept_change().await?;
                session.save_current().await?;
                println!("Applied; stage is now {}", change.new_stage);
            }
        }
        AiCommands::Translate { id, to, from } => {
            let session = open_session_for(&id, &store, Some(assistant)).await?;
            let written = match to {
                TranslateTarget::En => {
                    session.translate_to(Language::English).await?;
                    vec![Language::English]
                }
                TranslateTarget::Ro => {
                    session.translate_to(Language::Romanian).await?;
                    vec![Language::Romanian]
                }
                TranslateTarget::Both => {
                    session.translate_to_both().await?;
                    vec![Language::English, Language::Romanian]
                }
                TranslateTarget::Sv => {
                    session.translate_to_swedish(from.into()).await?;
                    vec![Language::Swedish]
                }
            };
            session.save_current().await?;

            if let Some(post) = session.current().await {
                for language in written {
                    println!("--- {} ---", language.display_name());
                    println!("{}", post.text(language));
                }
            }
        }
        AiCommands::Alternatives {
            id,
            lang,
            text,
            replace,
            pick,
        } => {
            let language = Language::from(lang);
            let session = open_session_for(&id, &store, Some(assistant)).await?;
            let alternatives = session.translation_help(language, &text).await?;
            for (index, alternative) in alternatives.iter().enumerate() {
                println!("{}. {alternative}", index + 1);
            }

            if let Some(range) = replace {
                let range = parse_char_range(&range)?;
                let choice = pick
                    .checked_sub(1)
                    .and_then(|index| alternatives.get(index))
                    .ok_or_else(|| {
                        CliError::InvalidSelection(format!(
                            "--pick must be between 1 and {}",
                            alternatives.len()
                        ))
                    })?;
                session.accept_suggestion(language, range, choice).await?;
                session.save_current().await?;
                println!("Applied alternative {pick}");
            }
        }
    }
    Ok(())
}

fn print_change(change: &PendingChange) {
    println!("--- original ({}) ---", change.language.display_name());
    println!("{}", change.original);
    println!("--- proposed ---");
    println!("{}", change.proposed);
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use linkpost_core::remote::MemoryRemoteStore;
use linkpost_core::services::PostStore;
use linkpost_core::sync::SyncEngine;
use linkpost_core::{Language, Post, PostId, Session};
use tempfile::TempDir;

use crate::cli::{AiCommands, Cli, Commands, LanguageArg, SourceLanguage, TranslateTarget};
use crate::commands::common::{
    format_char_count, format_relative_time, format_timestamp, normalize_post_identifier,
    open_store, parse_char_range, post_preview, resolve_post, short_id, text_preview,
};
use crate::commands::sync::stop_on;
use crate::error::CliError;
use crate::secrets::{clear_secret, load_secret_with_source, save_secret, Secret, SecretSource};

fn temp_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linkpost.db");
    (dir, path)
}

fn post_with_id(id: &str, swedish: &str) -> Post {
    let mut post = Post::new();
    post.id = id.parse::<PostId>().unwrap();
    post.swedish_text = swedish.to_string();
    post
}

#[test]
fn format_relative_time_units() {
    let now = 100_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
    assert_eq!(format_relative_time(now + 5_000, now), "just now");
}

#[test]
fn format_timestamp_returns_utc_label() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn post_preview_uses_first_non_empty_language() {
    let mut post = Post::new();
    post.english_text = "Hello   network\nsecond line".to_string();
    assert_eq!(post_preview(&post, 40), "Hello network");
}

#[test]
fn post_preview_truncates_with_ellipsis() {
    let mut post = Post::new();
    post.swedish_text = "Det här är en väldigt lång mening som ska kortas".to_string();
    let preview = post_preview(&post, 20);
    assert_eq!(preview, "Det här är en väl...");
    assert_eq!(preview.chars().count(), 20);
}

#[test]
fn post_preview_marks_blank_posts() {
    assert_eq!(post_preview(&Post::new(), 20), "(empty)");
}

#[test]
fn text_preview_collapses_whitespace() {
    assert_eq!(text_preview("a\n\n b\tc", 10), "a b c");
    assert_eq!(text_preview("abcdefghijkl", 8), "abcde...");
}

#[test]
fn format_char_count_flags_linkedin_limit() {
    assert_eq!(format_char_count("Hej på dig"), "10/3000");
    assert_eq!(format_char_count(&"a".repeat(2700)), "2700/3000");
    assert_eq!(
        format_char_count(&"å".repeat(2701)),
        "2701/3000 (near limit)"
    );
    assert_eq!(format_char_count(&"a".repeat(3000)), "3000/3000 (near limit)");
    assert_eq!(
        format_char_count(&"a".repeat(3012)),
        "3012/3000 (over limit by 12)"
    );
}

#[test]
fn short_id_keeps_leading_characters() {
    assert_eq!(
        short_id("11111111-1111-7111-8111-111111111111"),
        "11111111-1111"
    );
}

#[test]
fn parse_char_range_accepts_start_and_end() {
    assert_eq!(parse_char_range("3..7").unwrap(), 3..7);
    assert_eq!(parse_char_range(" 0 .. 0 ").unwrap(), 0..0);
}

#[test]
fn parse_char_range_rejects_malformed_input() {
    for raw in ["", "3", "a..b", "7..3", "-1..2"] {
        assert!(
            matches!(parse_char_range(raw), Err(CliError::InvalidSelection(_))),
            "{raw} should be rejected"
        );
    }
}

#[test]
fn normalize_post_identifier_rejects_empty() {
    assert!(matches!(
        normalize_post_identifier(" \n "),
        Err(CliError::EmptyPostId)
    ));
    assert_eq!(
        normalize_post_identifier("  abc123  ").unwrap(),
        "abc123".to_string()
    );
}

#[tokio::test]
async fn resolve_post_supports_exact_and_prefix_id() {
    let (_dir, db_path) = temp_db();
    let store = open_store(&db_path).unwrap();

    let post_a = post_with_id("11111111-1111-7111-8111-111111111111", "Inlägg A");
    let post_b = post_with_id("11111111-1111-7111-8111-222222222222", "Inlägg B");
    let post_c = post_with_id("22222222-2222-7222-8222-333333333333", "Inlägg C");
    store.save(&post_a).await.unwrap();
    store.save(&post_b).await.unwrap();
    store.save(&post_c).await.unwrap();

    let exact = resolve_post(&post_a.id.to_string(), &store).await.unwrap();
    assert_eq!(exact.id, post_a.id);

    let by_prefix = resolve_post("2222", &store).await.unwrap();
    assert_eq!(by_prefix.swedish_text, "Inlägg C");

    let ambiguous = resolve_post("11111111", &store).await;
    assert!(matches!(ambiguous, Err(CliError::AmbiguousPostId(_))));

    let missing = resolve_post("ffff", &store).await;
    assert!(matches!(missing, Err(CliError::PostNotFound(_))));
}

#[tokio::test]
async fn posts_survive_reopening_the_database() {
    let (_dir, db_path) = temp_db();
    let post = post_with_id("33333333-3333-7333-8333-333333333333", "Hej");
    {
        let store = open_store(&db_path).unwrap();
        store.save(&post).await.unwrap();
    }

    let store = open_store(&db_path).unwrap();
    let loaded = resolve_post("3333", &store).await.unwrap();
    assert_eq!(loaded, post);
}

#[test]
fn secrets_round_trip_through_test_store() {
    let secret = Secret::DriveAccessToken;
    if std::env::var(secret.env_var()).is_ok() {
        return;
    }

    assert!(save_secret(secret, "   ").is_err());

    save_secret(secret, "  ya29.token  ").unwrap();
    let (value, source) = load_secret_with_source(secret).unwrap().unwrap();
    assert_eq!(value, "ya29.token");
    assert_eq!(source, SecretSource::Keychain);

    clear_secret(secret).unwrap();
    assert!(load_secret_with_source(secret).unwrap().is_none());
}

#[test]
fn language_arg_maps_to_core_language() {
    assert_eq!(Language::from(LanguageArg::Sv), Language::Swedish);
    assert_eq!(Language::from(LanguageArg::En), Language::English);
    assert_eq!(Language::from(LanguageArg::Ro), Language::Romanian);
    assert_eq!(Language::from(SourceLanguage::Ro), Language::Romanian);
}

#[test]
fn cli_parses_edit_with_global_db_path() {
    let cli = Cli::try_parse_from([
        "linkpost", "edit", "abc", "--lang", "ro", "--text", "Salut", "--db-path", "/tmp/x.db",
    ])
    .unwrap();

    assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/x.db")));
    match cli.command {
        Commands::Edit { id, lang, text } => {
            assert_eq!(id, "abc");
            assert_eq!(lang, LanguageArg::Ro);
            assert_eq!(text, "Salut");
        }
        _ => panic!("expected edit command"),
    }
}

#[test]
fn cli_parses_translate_defaults() {
    let cli = Cli::try_parse_from(["linkpost", "ai", "translate", "abc", "--to", "both"]).unwrap();
    match cli.command {
        Commands::Ai {
            command: AiCommands::Translate { id, to, from },
        } => {
            assert_eq!(id, "abc");
            assert_eq!(to, TranslateTarget::Both);
            assert_eq!(from, SourceLanguage::En);
        }
        _ => panic!("expected ai translate command"),
    }
}

#[test]
fn cli_parses_alternatives_replace_range() {
    let cli = Cli::try_parse_from([
        "linkpost",
        "ai",
        "alternatives",
        "abc",
        "--lang",
        "sv",
        "bra",
        "--replace",
        "4..7",
        "--pick",
        "2",
    ])
    .unwrap();
    match cli.command {
        Commands::Ai {
            command:
                AiCommands::Alternatives {
                    text,
                    replace,
                    pick,
                    ..
                },
        } => {
            assert_eq!(text, "bra");
            assert_eq!(replace.as_deref(), Some("4..7"));
            assert_eq!(pick, 2);
        }
        _ => panic!("expected ai alternatives command"),
    }
}

#[test]
fn cli_rejects_unknown_language() {
    assert!(Cli::try_parse_from(["linkpost", "edit", "abc", "--lang", "de", "--text", "x"]).is_err());
}

#[test]
fn cli_parses_settings_toggle() {
    let cli = Cli::try_parse_from(["linkpost", "settings", "set-sync", "false"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Settings {
            command: crate::cli::SettingsCommands::SetSync { enabled: false }
        }
    ));
}

#[tokio::test]
async fn failed_signal_wait_still_stops_background_loops() {
    let store = PostStore::open_in_memory().unwrap();
    let remote = MemoryRemoteStore::new();
    let engine = Arc::new(SyncEngine::new(store.clone(), Arc::new(remote.clone())));
    let session = Session::new(store.clone(), Some(engine), None);
    session.start_periodic_sync(Duration::from_millis(20)).await;

    let result = stop_on(&session, async {
        Err(std::io::Error::other("signal handler unavailable"))
    })
    .await;
    assert!(matches!(result, Err(CliError::Io(_))));

    store
        .save(&post_with_id("44444444-4444-7444-8444-444444444444", "Hej"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(remote.file_count(), 0);
}

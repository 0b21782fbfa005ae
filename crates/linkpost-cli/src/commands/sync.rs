use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::Arc;

use linkpost_core::sync::{SkipReason, SyncOutcome};
use linkpost_core::Session;

use crate::commands::common::{build_sync_engine, load_config, open_store};
use crate::error::CliError;

pub async fn run_sync(db_path: &Path) -> Result<(), CliError> {
    let config = load_config()?;
    let store = open_store(db_path)?;
    let engine = build_sync_engine(&store, &config)?;

    match engine.sync().await? {
        SyncOutcome::Completed(report) => {
            println!(
                "Sync completed: {} created, {} updated, {} downloaded, {} unchanged",
                report.created,
                report.updated,
                report.downloaded,
                report.skipped_upload
            );
            if report.corrupt > 0 {
                eprintln!(
                    "Skipped {} unreadable remote file(s); see log for details",
                    report.corrupt
                );
            }
        }
        SyncOutcome::Skipped(SkipReason::Disabled) => {
            println!("Cloud sync is disabled. Enable it with `linkpost settings set-sync true`.");
        }
        SyncOutcome::Skipped(SkipReason::NotAuthenticated) => {
            println!(
                "Not signed in to Google Drive. Run `linkpost auth set-drive-token` or set GOOGLE_DRIVE_ACCESS_TOKEN."
            );
        }
    }
    Ok(())
}

/// Run the periodic sync loop until Ctrl-C.
pub async fn run_watch(db_path: &Path) -> Result<(), CliError> {
    let config = load_config()?;
    let store = open_store(db_path)?;
    let engine = Arc::new(build_sync_engine(&store, &config)?);
    let session = Session::new(store, Some(Arc::clone(&engine)), None);

    let mut status = engine.status();
    let status_printer = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            println!("Sync status: {current}");
        }
    });

    session.start_autosave(config.autosave_interval()).await;
    session.start_periodic_sync(config.sync_interval()).await;
    println!(
        "Watching; syncing every {}s. Press Ctrl-C to stop.",
        config.sync_interval_secs
    );

    if let Err(error) = session.sync_now().await {
        eprintln!("Initial sync failed: {error}");
    }

    let stopped = stop_on(&session, tokio::signal::ctrl_c()).await;
    status_printer.abort();
    stopped?;
    println!("Stopped");
    Ok(())
}

/// Wait for `signal`, then stop the session's loops even if waiting failed.
pub async fn stop_on<F>(session: &Session, signal: F) -> Result<(), CliError>
where
    F: Future<Output = io::Result<()>>,
{
    let received = signal.await;
    session.shutdown().await;
    received?;
    Ok(())
}

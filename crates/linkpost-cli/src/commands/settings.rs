use std::path::Path;

use crate::cli::SettingsCommands;
use crate::commands::common::{config_path, format_timestamp, load_config, open_store};
use crate::error::CliError;

pub async fn run_settings(command: SettingsCommands, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;

    match command {
        SettingsCommands::Show => {
            let settings = store.settings().await?;
            let config = load_config()?;
            let last_sync = if settings.has_synced() {
                format_timestamp(settings.last_sync_timestamp)
            } else {
                "never".to_string()
            };

            println!("Markdown mode:   {}", on_off(settings.markdown_mode));
            println!("Cloud sync:      {}", on_off(settings.cloud_sync_enabled));
            println!("Last sync:       {last_sync}");
            println!("Drive folder:    {}", config.drive_folder_name);
            println!("Model:           {}", config.anthropic_model);
            println!("Config file:     {}", config_path()?.display());
            println!("Database:        {}", db_path.display());
        }
        SettingsCommands::SetMarkdown { enabled } => {
            store.set_markdown_mode(enabled).await?;
            println!("Markdown mode {}", on_off(enabled));
        }
        SettingsCommands::SetSync { enabled } => {
            store.set_cloud_sync_enabled(enabled).await?;
            println!("Cloud sync {}", on_off(enabled));
        }
    }
    Ok(())
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

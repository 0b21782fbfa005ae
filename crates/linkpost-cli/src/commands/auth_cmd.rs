use crate::cli::AuthCommands;
use crate::error::CliError;
use crate::secrets::{
    clear_secret, load_secret_with_source, save_secret, Secret, SecretSource,
};

pub fn run_auth(command: AuthCommands) -> Result<(), CliError> {
    match command {
        AuthCommands::SetApiKey { key } => {
            save_secret(Secret::AnthropicApiKey, &key)?;
            println!("Stored language model API key in keychain");
        }
        AuthCommands::SetDriveToken { token } => {
            save_secret(Secret::DriveAccessToken, &token)?;
            println!("Stored Google Drive access token in keychain");
        }
        AuthCommands::Clear => {
            for secret in Secret::ALL {
                clear_secret(secret)?;
            }
            println!("Cleared stored credentials");
        }
        AuthCommands::Status => {
            for secret in Secret::ALL {
                println!("{}: {}", secret.label(), describe_source(secret)?);
            }
        }
    }
    Ok(())
}

fn describe_source(secret: Secret) -> Result<String, CliError> {
    Ok(match load_secret_with_source(secret)? {
        Some((_, SecretSource::Environment)) => format!("set via {}", secret.env_var()),
        Some((_, SecretSource::Keychain)) => "stored in keychain".to_string(),
        None => "not configured".to_string(),
    })
}

//! Credential storage in the OS keychain, with environment overrides.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use linkpost_core::util::normalize_text_option;

use crate::error::CliError;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "linkpost-cli";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Secret {
    AnthropicApiKey,
    DriveAccessToken,
}

impl Secret {
    pub const ALL: [Self; 2] = [Self::AnthropicApiKey, Self::DriveAccessToken];

    const fn username(self) -> &'static str {
        match self {
            Self::AnthropicApiKey => "anthropic_api_key",
            Self::DriveAccessToken => "google_drive_access_token",
        }
    }

    pub const fn env_var(self) -> &'static str {
        match self {
            Self::AnthropicApiKey => "ANTHROPIC_API_KEY",
            Self::DriveAccessToken => "GOOGLE_DRIVE_ACCESS_TOKEN",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AnthropicApiKey => "Language model API key",
            Self::DriveAccessToken => "Google Drive access token",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    Keychain,
}

#[cfg(test)]
fn test_store() -> &'static Mutex<HashMap<String, String>> {
    static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(HashMap::new()))
}

#[cfg(not(test))]
fn entry(secret: Secret) -> Result<Entry, CliError> {
    Entry::new(KEYRING_SERVICE_NAME, secret.username())
        .map_err(|error| CliError::SecureStorage(error.to_string()))
}

#[cfg(not(test))]
fn load_stored(secret: Secret) -> Result<Option<String>, CliError> {
    match entry(secret)?.get_password() {
        Ok(value) => Ok(normalize_text_option(Some(value))),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(error) => Err(CliError::SecureStorage(error.to_string())),
    }
}

#[cfg(test)]
fn load_stored(secret: Secret) -> Result<Option<String>, CliError> {
    let guard = test_store()
        .lock()
        .map_err(|error| CliError::SecureStorage(error.to_string()))?;
    Ok(guard.get(secret.username()).cloned())
}

#[cfg(not(test))]
fn store(secret: Secret, value: &str) -> Result<(), CliError> {
    entry(secret)?
        .set_password(value)
        .map_err(|error| CliError::SecureStorage(error.to_string()))
}

#[cfg(test)]
fn store(secret: Secret, value: &str) -> Result<(), CliError> {
    let mut guard = test_store()
        .lock()
        .map_err(|error| CliError::SecureStorage(error.to_string()))?;
    guard.insert(secret.username().to_string(), value.to_string());
    Ok(())
}

#[cfg(not(test))]
fn remove(secret: Secret) -> Result<(), CliError> {
    match entry(secret)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(error) => Err(CliError::SecureStorage(error.to_string())),
    }
}

#[cfg(test)]
fn remove(secret: Secret) -> Result<(), CliError> {
    let mut guard = test_store()
        .lock()
        .map_err(|error| CliError::SecureStorage(error.to_string()))?;
    guard.remove(secret.username());
    Ok(())
}

fn from_env(secret: Secret) -> Option<String> {
    normalize_text_option(std::env::var(secret.env_var()).ok())
}

/// Resolve a secret, preferring the environment over the keychain.
pub fn load_secret(secret: Secret) -> Result<Option<String>, CliError> {
    Ok(load_secret_with_source(secret)?.map(|(value, _)| value))
}

pub fn load_secret_with_source(
    secret: Secret,
) -> Result<Option<(String, SecretSource)>, CliError> {
    if let Some(value) = from_env(secret) {
        return Ok(Some((value, SecretSource::Environment)));
    }
    Ok(load_stored(secret)?.map(|value| (value, SecretSource::Keychain)))
}

pub fn save_secret(secret: Secret, value: &str) -> Result<(), CliError> {
    let value = normalize_text_option(Some(value.to_string()))
        .ok_or_else(|| CliError::SecureStorage(format!("{} cannot be empty", secret.label())))?;
    store(secret, &value)
}

pub fn clear_secret(secret: Secret) -> Result<(), CliError> {
    remove(secret)
}

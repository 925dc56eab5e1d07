//! API tokens in the OS keyring, one entry per backend so switching
//! `api.base_url` never sends a token to the wrong server.

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE: &str = "batchboard-api";

/// Keyring account name for a backend: the base URL without scheme or
/// trailing slash.
pub fn account_for(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    if host.is_empty() {
        "default".to_string()
    } else {
        host.to_ascii_lowercase()
    }
}

fn entry(base_url: &str) -> Result<Entry> {
    Entry::new(SERVICE, &account_for(base_url)).context("Failed to open keyring entry")
}

pub fn store_api_token(base_url: &str, token: &str) -> Result<()> {
    entry(base_url)?
        .set_password(token)
        .context("Failed to store API token in keyring")
}

pub fn get_api_token(base_url: &str) -> Result<String> {
    entry(base_url)?
        .get_password()
        .context("No API token in keyring")
}

pub fn delete_api_token(base_url: &str) -> Result<()> {
    entry(base_url)?
        .delete_credential()
        .context("Failed to delete API token from keyring")
}

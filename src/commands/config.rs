use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

pub fn list(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.api.token.is_some() {
        shown.api.token = Some("********".to_string());
    }
    let toml_str = toml::to_string_pretty(&shown).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

/// Look up a dotted key such as `display.page_size`.
pub fn lookup(config: &Config, key: &str) -> Result<serde_json::Value> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;

    let mut current = &value;
    for part in key.split('.') {
        current = current
            .get(part)
            .with_context(|| format!("Key not found: {}", key))?;
    }

    Ok(current.clone())
}

pub fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(config, key)? {
        serde_json::Value::String(s) => println!("{}", s),
        v => println!("{}", v),
    }
    Ok(())
}

pub fn set(path: &Path, key: &str, value: &str) -> Result<()> {
    crate::config::set_value(path, key, value)?;
    println!("✓ {} updated in {}", key, path.display());
    Ok(())
}

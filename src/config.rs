use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use config::{Config as ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = ".batchboard";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Backend root, e.g. https://admin.example.com
    #[serde(default)]
    pub base_url: String,
    pub token: Option<String>, // Optional when stored in the keyring
    #[serde(default = "default_true")]
    pub use_keyring: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            use_keyring: true,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_page_size() -> usize {
    10
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            date_format: default_date_format(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Ok(()); // Only remote commands need it
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            anyhow::bail!(
                "Invalid api.base_url '{}', expected an http:// or https:// URL",
                self.base_url
            );
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            anyhow::bail!("display.page_size must be greater than 0");
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!("Invalid display.date_format '{}'", self.date_format);
        }
        Ok(())
    }
}

impl LogConfig {
    pub fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log.level '{}'. Expected one of {:?}",
                self.level,
                LEVELS
            );
        }
        Ok(())
    }
}

impl Config {
    /// Backend URL, or an error telling the user how to set it.
    pub fn base_url(&self) -> Result<&str> {
        if self.api.base_url.is_empty() {
            anyhow::bail!(
                "API base URL not set. Run 'bboard config set api.base_url <URL>' to configure"
            );
        }
        Ok(&self.api.base_url)
    }

    /// API token for the configured backend. A token still in the file has
    /// not been migrated and wins over the keyring. Absent is allowed, some
    /// deployments don't require one.
    pub fn api_token(&self) -> Option<String> {
        if let Some(token) = &self.api.token {
            return Some(token.clone());
        }
        if self.api.use_keyring {
            return crate::keyring::get_api_token(&self.api.base_url).ok();
        }
        None
    }

    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.display.validate()?;
        self.log.validate()?;
        Ok(())
    }

    /// Move a plain-text token into the keyring. The file copy is dropped
    /// only after the keyring hands back the same token.
    pub fn migrate_credentials(&mut self) -> Result<bool> {
        if !self.api.use_keyring {
            return Ok(false);
        }
        let Some(token) = self.api.token.clone() else {
            return Ok(false);
        };

        crate::keyring::store_api_token(&self.api.base_url, &token)
            .context("Failed to store token in keyring")?;
        let stored = crate::keyring::get_api_token(&self.api.base_url)
            .context("Failed to read token back from keyring")?;
        if stored != token {
            anyhow::bail!("Keyring returned a different token than the one stored");
        }

        self.api.token = None;
        Ok(true)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dir = home::home_dir()
        .context("Could not find home directory")?
        .join(APP_DIR);
    Ok(dir.join("config.toml"))
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let loader = ConfigBuilder::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
        .build()
        .context("Failed to build config loader")?;

    loader
        .try_deserialize()
        .context("Failed to parse config file")
}

pub fn load() -> Result<Config> {
    load_at(config_path()?)
}

/// Load, validate and migrate the config file at `path`.
pub fn load_at<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let mut config = load_from_path(path)?;

    config.validate()?;

    match config.migrate_credentials() {
        Ok(true) => {
            tracing::info!("migrated API token to secure storage");
            save_to_path(&config, path)?;
        }
        Ok(false) => {}
        // The plain-text token stays in the file and keeps working.
        Err(e) => tracing::warn!(
            "could not migrate API token, keeping it in the config file: {e:#}"
        ),
    }

    Ok(config)
}

pub fn save_to_path<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    std::fs::write(path, toml_string).context("Failed to write config file")?;

    Ok(())
}

/// Set a dotted key (`display.page_size`) in the file at `path` and save it.
/// The result must still deserialize and validate. Comments are not preserved.
pub fn set_value<P: AsRef<Path>>(path: P, key: &str, value: &str) -> Result<Config> {
    let path = path.as_ref();
    let mut root = if path.exists() {
        let raw = std::fs::read_to_string(path).context("Failed to read config file")?;
        raw.parse::<toml::Table>()
            .context("Failed to parse config file")?
    } else {
        toml::Table::new()
    };

    let parts: Vec<&str> = key.split('.').collect();
    let (leaf, sections) = parts
        .split_last()
        .filter(|(leaf, _)| !leaf.is_empty())
        .context("Config key must not be empty")?;

    let mut table = &mut root;
    for section in sections {
        let entry = table
            .entry(section.to_string())
            .or_insert(toml::Value::Table(toml::Table::new()));
        table = entry
            .as_table_mut()
            .with_context(|| format!("'{}' is not a section", section))?;
    }
    table.insert(leaf.to_string(), parse_scalar(value));

    let config: Config = toml::Value::Table(root)
        .try_into()
        .with_context(|| format!("Invalid value for {}", key))?;
    config.validate()?;
    save_to_path(&config, path)?;

    Ok(config)
}

fn parse_scalar(value: &str) -> toml::Value {
    if let Ok(b) = value.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = value.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    toml::Value::String(value.to_string())
}

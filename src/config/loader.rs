use crate::config::schema::ProviderConfig;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
pub(crate) static CONFIG_TEST_ENV_LOCK: Mutex<()> = Mutex::new(());

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "CRON_JOB_API_KEY";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "CRON_JOB_API_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
}

/// Values passed on the command line; they win over every other layer
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

pub fn load_config(overrides: CliOverrides) -> Result<ProviderConfig> {
    tracing::debug!("Loading configuration");

    let mut config = ProviderConfig::default();

    // Layer 1: config file (~/.cronjoborg/config.json)
    let config_file = overrides.config_path.clone().or_else(get_config_path);

    if let Some(path) = config_file.as_deref() {
        if path.exists() {
            tracing::debug!(config_path = %path.display(), "Loading configuration from file");
            config = merge_config_from_file(config, path)?;
        } else {
            tracing::debug!(config_path = %path.display(), "Config file not found, using defaults");
        }
    }

    // Layer 2: environment variables
    config = merge_env_variables(config);

    // Layer 3: CLI flags
    if let Some(url) = overrides.api_url.filter(|u| !u.is_empty()) {
        tracing::debug!(api_url = %url, "Applying CLI api_url override");
        config.api_url = url;
    }
    if let Some(key) = overrides.api_key.filter(|k| !k.is_empty()) {
        tracing::debug!("Applying CLI api_key override");
        config.api_key = Some(key);
    }

    let summary = config.get_safe_summary();
    tracing::debug!(
        api_url = %summary.api_url,
        api_key_configured = summary.api_key_configured,
        timeout_seconds = summary.timeout_seconds,
        max_retries = summary.max_retries,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Default location of the configuration file, `~/.cronjoborg/config.json`
pub fn get_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cronjoborg").join("config.json"))
}

fn merge_config_from_file(config: ProviderConfig, path: &Path) -> Result<ProviderConfig> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(config),
        Err(e) => return Err(e).context("Failed to read metadata for config file"),
    };

    let mode = metadata.permissions().mode() & 0o777;
    if mode != 0o600 {
        tracing::error!(
            "Config file {:?} has permissions {:o}, expected 0600 - skipping for security",
            path,
            mode
        );
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let file_config: ProviderConfig =
        serde_json::from_str(&content).map_err(ConfigError::InvalidJson)?;

    Ok(ProviderConfig {
        api_key: file_config.api_key.or(config.api_key),
        ..file_config
    })
}

fn merge_env_variables(config: ProviderConfig) -> ProviderConfig {
    let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
    let api_url = std::env::var(API_URL_ENV).ok().filter(|u| !u.is_empty());

    if api_key.is_some() {
        tracing::debug!("Using API key from {}", API_KEY_ENV);
    }

    ProviderConfig {
        api_url: api_url.unwrap_or(config.api_url),
        api_key: api_key.or(config.api_key),
        ..config
    }
}

pub fn save_config(config: &ProviderConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(config)?;
    write_private_file(path, json.as_bytes())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    tracing::info!("Configuration saved to {:?}", path);
    Ok(())
}

/// Writes `contents` to a file readable by the owner only
///
/// New files are created with mode 0600. An existing file is restricted to
/// 0600 before it is truncated, so the secret never sits in a wider file.
pub fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.set_len(0)?;
    file.write_all(contents)?;
    file.sync_all()
}

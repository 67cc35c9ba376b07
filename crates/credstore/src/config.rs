//! Configuration loading from file and environment variables.

use std::path::PathBuf;

use credstore_db::{DbRuntimeSettings, StoreOptions};
use credstore_types::{
    DatabaseDescriptor, DEFAULT_DATABASE_DESCRIPTION, DEFAULT_DATABASE_NAME,
    DEFAULT_DATABASE_VERSION, DEFAULT_ESTIMATED_SIZE,
};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "CREDSTORE_CONFIG_PATH";

/// Configuration file used when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "credstore.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database location and identity.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the credential database lives and how it is identified.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory containing the `Databases/` folder.
    #[serde(default = "default_offline_storage_path")]
    pub offline_storage_path: PathBuf,

    /// Logical database name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Data version expected in an existing database.
    #[serde(default = "default_version")]
    pub version: String,

    /// Description written to the metadata file of a new database.
    #[serde(default = "default_description")]
    pub description: String,

    /// Size hint written to the metadata file of a new database.
    #[serde(default = "default_estimated_size")]
    pub estimated_size: u64,

    /// SQLite busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Whether opening the store also creates the `userInfo` table.
    #[serde(default = "default_true")]
    pub create_schema_on_open: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "credstore_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_offline_storage_path() -> PathBuf {
    PathBuf::from("./")
}

fn default_name() -> String {
    DEFAULT_DATABASE_NAME.to_string()
}

fn default_version() -> String {
    DEFAULT_DATABASE_VERSION.to_string()
}

fn default_description() -> String {
    DEFAULT_DATABASE_DESCRIPTION.to_string()
}

fn default_estimated_size() -> u64 {
    DEFAULT_ESTIMATED_SIZE
}

fn default_busy_timeout_ms() -> u64 {
    DbRuntimeSettings::default().busy_timeout_ms
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            offline_storage_path: default_offline_storage_path(),
            name: default_name(),
            version: default_version(),
            description: default_description(),
            estimated_size: default_estimated_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            create_schema_on_open: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl StorageConfig {
    /// Returns the database descriptor named by this configuration.
    pub fn descriptor(&self) -> DatabaseDescriptor {
        DatabaseDescriptor {
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            estimated_size: self.estimated_size,
        }
    }

    /// Converts this configuration into options for a file-backed store.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::offline(self.offline_storage_path.clone())
            .with_descriptor(self.descriptor())
            .with_runtime(DbRuntimeSettings {
                busy_timeout_ms: self.busy_timeout_ms,
            })
            .with_schema_on_open(self.create_schema_on_open)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CREDSTORE_STORAGE_PATH` overrides `storage.offline_storage_path`
/// - `CREDSTORE_BUSY_TIMEOUT_MS` overrides `storage.busy_timeout_ms`
/// - `CREDSTORE_LOG_LEVEL` overrides `logging.level`
/// - `CREDSTORE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Loads configuration from the file named by `CREDSTORE_CONFIG_PATH`, or
/// from `credstore.toml` in the working directory.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_default_config() -> Result<Config, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    load_config(Some(&path))
}

/// Applies environment overrides read through `lookup`. Values that do not
/// parse are ignored.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("CREDSTORE_STORAGE_PATH") {
        config.storage.offline_storage_path = PathBuf::from(path);
    }
    if let Some(timeout) = lookup("CREDSTORE_BUSY_TIMEOUT_MS") {
        if let Ok(parsed) = timeout.parse() {
            config.storage.busy_timeout_ms = parsed;
        }
    }
    if let Some(level) = lookup("CREDSTORE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("CREDSTORE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    config
}

//! Configuration management for the CNPJ ETL
//!
//! This module provides unified configuration management with automatic
//! first-run initialization, multi-source loading, and zero-config defaults.
//! Database settings can additionally be overridden through `CNPJ_DB_*`
//! environment variables (a `.env` file is honored).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, DatabaseConfig, PipelineConfig, RetryPolicy};
use crate::constants::{env, files, limits, logging, source};
use crate::errors::{ConfigError, Result};

/// Project-local configuration file name
const LOCAL_CONFIG_FILE: &str = "cnpj-etl.toml";

/// Directory under the user config dir
const CONFIG_DIR_NAME: &str = "cnpj-etl";

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Local directories
    pub paths: PathsConfigToml,
    /// Remote snapshot source
    pub source: SourceConfigToml,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Download retry settings
    pub pipeline: PipelineConfigToml,
    /// Destination database
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly path configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfigToml {
    /// Root of the `<YYYY>/<M>. <Month>` tree holding corrected files and manifests
    pub destination_root: PathBuf,
    /// Archive download directory
    pub downloads_dir: PathBuf,
    /// Shared extraction directory
    pub extract_dir: PathBuf,
    /// Remove downloads and extracted files at the start and end of each run
    pub clean_workspace: bool,
}

impl Default for PathsConfigToml {
    fn default() -> Self {
        Self {
            destination_root: PathBuf::from(files::DESTINATION_ROOT),
            downloads_dir: PathBuf::from(files::DOWNLOADS_DIR),
            extract_dir: PathBuf::from(files::EXTRACT_DIR),
            clean_workspace: true,
        }
    }
}

/// TOML-friendly source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceConfigToml {
    /// Directory holding one `YYYY-MM/` listing per snapshot
    pub base_url: String,
    /// Extension of the published archives
    pub archive_extension: String,
}

impl Default for SourceConfigToml {
    fn default() -> Self {
        Self {
            base_url: source::BASE_URL.to_string(),
            archive_extension: source::ARCHIVE_EXTENSION.to_string(),
        }
    }
}

/// TOML-friendly pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfigToml {
    /// Attempts per archive download
    pub download_attempts: u32,
    /// Fixed pause between download attempts
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for PipelineConfigToml {
    fn default() -> Self {
        Self {
            download_attempts: limits::DOWNLOAD_ATTEMPTS,
            retry_delay: limits::RETRY_DELAY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (PipelineConfig, ClientConfig, DatabaseConfig) {
        let pipeline = PipelineConfig {
            destination_root: self.paths.destination_root.clone(),
            downloads_dir: self.paths.downloads_dir.clone(),
            extract_dir: self.paths.extract_dir.clone(),
            source_base_url: self.source.base_url.clone(),
            archive_extension: self.source.archive_extension.clone(),
            retry: RetryPolicy {
                attempts: self.pipeline.download_attempts,
                delay: self.pipeline.retry_delay,
            },
            clean_workspace: self.paths.clean_workspace,
        };

        (pipeline, self.client.clone(), self.database.clone())
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = if let Some(ref path) = config_file_override {
            Some(path.clone())
        } else {
            Self::find_config_file()
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path }.into());
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply database overrides from `lookup` (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(env::DB_HOST) {
            self.database.host = host;
        }
        if let Some(port) = lookup(env::DB_PORT) {
            self.database.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: env::DB_PORT.to_string(),
                value: port.clone(),
                reason: "Expected a TCP port number".to_string(),
            })?;
        }
        if let Some(user) = lookup(env::DB_USER) {
            self.database.user = user;
        }
        if let Some(password) = lookup(env::DB_PASSWORD) {
            self.database.password = Some(password);
        }
        if let Some(database) = lookup(env::DB_NAME) {
            self.database.database = database;
        }
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.download_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.download_attempts".to_string(),
                value: "0".to_string(),
                reason: "At least one attempt is required".to_string(),
            }
            .into());
        }
        if self.database.batch_rows == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.batch_rows".to_string(),
                value: "0".to_string(),
                reason: "Batches must hold at least one row".to_string(),
            }
            .into());
        }
        if url::Url::parse(&self.source.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "source.base_url".to_string(),
                value: self.source.base_url.clone(),
                reason: "Expected an absolute URL".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file if none exists and notifies the user
    pub async fn initialize_first_run() -> Result<PathBuf> {
        let config_path = Self::get_default_config_path()?;

        if config_path.exists() {
            return Ok(config_path);
        }

        info!("Creating default configuration file...");
        Self::write_default_config(&config_path).await?;

        println!("📁 Created default configuration file:");
        println!("   {}", config_path.display());
        println!("   You can customize settings by editing this file.");
        println!();

        Ok(config_path)
    }

    /// Write the commented default configuration to `path`
    pub async fn write_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, Self::generate_default_config_content()).await?;
        Ok(())
    }

    /// Render this configuration as TOML (the password is never included)
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self).map_err(ConfigError::from)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(format!("./{}", LOCAL_CONFIG_FILE))];
        if let Ok(user_config) = Self::get_default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::from)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# CNPJ ETL Configuration
# This file was automatically generated on first run.
# You can customize any of these settings to suit your needs.

[paths]
# Corrected files and manifests: <destination_root>/<YYYY>/<M>. <Month>/
destination_root = "{destination_root}"
downloads_dir = "{downloads_dir}"
extract_dir = "{extract_dir}"
# Remove downloads and extracted files at the start and end of each run
clean_workspace = true

[source]
base_url = "{base_url}"
archive_extension = "{archive_extension}"

[client]
listing_timeout = "60s"
# Maximum time without data during a download
read_timeout = "60s"
connect_timeout = "30s"
tcp_keepalive = "30s"
pool_idle_timeout = "90s"
show_progress = true

[pipeline]
download_attempts = {attempts}
retry_delay = "{retry_delay}s"

[database]
# Overridable with CNPJ_DB_HOST, CNPJ_DB_PORT, CNPJ_DB_USER,
# CNPJ_DB_PASSWORD and CNPJ_DB_NAME
host = "localhost"
port = 5432
user = "postgres"
# password = "..."  # Prefer CNPJ_DB_PASSWORD; prompted when missing
database = "cnpj"
max_connections = 2
acquire_timeout = "30s"
batch_rows = 50000

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            destination_root = files::DESTINATION_ROOT,
            downloads_dir = files::DOWNLOADS_DIR,
            extract_dir = files::EXTRACT_DIR,
            base_url = source::BASE_URL,
            archive_extension = source::ARCHIVE_EXTENSION,
            attempts = limits::DOWNLOAD_ATTEMPTS,
            retry_delay = limits::RETRY_DELAY.as_secs(),
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

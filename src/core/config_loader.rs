//! Configuration file loader for the npm-bulk tools
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::BulkError;
use crate::security::command_executor::SafeCommandExecutor;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

/// Configuration file name looked up in the project directory
pub const CONFIG_FILENAME: &str = ".npm-bulk.yaml";

const ENV_NPM: &str = "NPM_BULK_NPM";
const ENV_LOG_DIR: &str = "NPM_BULK_LOG_DIR";
const ENV_TIMEOUT: &str = "NPM_BULK_TIMEOUT_SECS";
const ENV_STRICT: &str = "NPM_BULK_STRICT";

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Directory searched for `.npm-bulk.yaml`
    pub project_path: PathBuf,

    /// Explicit configuration file; it must exist when given
    pub config_file: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: Option<BulkConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Config file (`--config` or ./.npm-bulk.yaml)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<BulkConfig, BulkError> {
        let mut config = BulkConfig::default();

        let file_config = match &options.config_file {
            Some(path) => {
                let loaded = Self::load_config_file(path).await?;
                Some(loaded.ok_or_else(|| {
                    BulkError::ConfigError(format!("{} does not exist", path.display()))
                })?)
            }
            None => Self::load_config_file(&options.project_path.join(CONFIG_FILENAME)).await?,
        };
        if let Some(file_config) = file_config {
            config.merge_from(file_config);
        }

        config.merge_from(Self::load_env_config(&options.env)?);

        if let Some(cli_config) = options.cli_args {
            config.merge_from(cli_config);
        }

        Self::validate(&config)?;
        Self::resolve_npm_path(&mut config)?;
        Ok(config)
    }

    /// Pin a relative npm path like `bin/npm` to the current directory.
    ///
    /// Children run in different working directories, so only bare names
    /// (looked up on PATH) and absolute paths are stable.
    fn resolve_npm_path(config: &mut BulkConfig) -> Result<(), BulkError> {
        if let Some(npm_path) = &config.npm_path
            && npm_path.is_relative()
            && npm_path.components().count() > 1
        {
            let absolute = std::path::absolute(npm_path).map_err(|e| {
                BulkError::ConfigError(format!(
                    "Failed to resolve npmPath {}: {}",
                    npm_path.display(),
                    e
                ))
            })?;
            config.npm_path = Some(absolute);
        }
        Ok(())
    }

    /// Load configuration from YAML file, `None` if it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<BulkConfig>, BulkError> {
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            BulkError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        // An empty file deserializes to YAML null
        if content.trim().is_empty() {
            return Ok(Some(BulkConfig::default()));
        }

        let config: BulkConfig = serde_yaml::from_str(&content).map_err(|e| {
            BulkError::ConfigError(format!(
                "Failed to parse YAML config {}: {}",
                file_path.display(),
                e
            ))
        })?;

        Ok(Some(config))
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Result<BulkConfig, BulkError> {
        Ok(BulkConfig {
            npm_path: env.get(ENV_NPM).map(PathBuf::from),
            log_dir: env.get(ENV_LOG_DIR).map(PathBuf::from),
            timeout_secs: Self::parse_env(env, ENV_TIMEOUT)?,
            strict: Self::parse_env(env, ENV_STRICT)?,
        })
    }

    fn parse_env<T: FromStr>(
        env: &HashMap<String, String>,
        key: &str,
    ) -> Result<Option<T>, BulkError> {
        match env.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                BulkError::ConfigError(format!("{} has an invalid value: '{}'", key, raw))
            }),
        }
    }

    /// Validate the merged configuration
    pub fn validate(config: &BulkConfig) -> Result<(), BulkError> {
        if config.timeout_secs == Some(0) {
            return Err(BulkError::ConfigError(
                "timeoutSecs must be greater than zero".to_string(),
            ));
        }

        if let Some(npm_path) = &config.npm_path
            && npm_path.as_os_str().is_empty()
        {
            return Err(BulkError::ConfigError("npmPath must not be empty".to_string()));
        }

        if let Some(npm_path) = &config.npm_path
            && !SafeCommandExecutor::is_allowed(&npm_path.to_string_lossy())
        {
            return Err(BulkError::ConfigError(format!(
                "npmPath {} is not an npm executable",
                npm_path.display()
            )));
        }

        Ok(())
    }
}

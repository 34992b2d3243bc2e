use crate::error::AppError;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

const STORE_FILE: &str = "notes.json";
const DEFAULT_USER_ID: u64 = 1;
const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_path: String,
    /// Numeric id of the acting user. Also feeds the per-user key salt.
    pub user_id: u64,
    pub session_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: STORE_FILE.to_string(),
            user_id: DEFAULT_USER_ID,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn new(config_path_param: &Option<PathBuf>) -> Result<Config, AppError> {
        let config_file_path = match config_path_param.to_owned() {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        // Ensure the parent directory for the config file exists
        fs::create_dir_all(
            config_file_path
                .parent()
                .ok_or_else(|| AppError::Config("Invalid config file path.".to_string()))?,
        )?;

        let mut config = if !config_file_path.exists() {
            let default_config = Config::default();
            fs::write(&config_file_path, toml::to_string(&default_config)?)?;
            default_config
        } else {
            match fs::read_to_string(&config_file_path) {
                Ok(config_str) => Self::parse_config(&config_str),
                Err(e) => {
                    error!("Error while reading the configuration: {e}");
                    warn!("Using default configuration");
                    Config::default()
                }
            }
        };

        // Relative store paths live next to the config file
        if !PathBuf::from(&config.store_path).is_absolute() {
            let mut absolute_store_path = config_file_path.clone();
            absolute_store_path.pop();
            absolute_store_path.push(&config.store_path);
            config.store_path = absolute_store_path.to_string_lossy().to_string();
        }

        Ok(config)
    }

    /// Parse the TOML config from a string.
    /// Returns default configuration if it fails to parse.
    fn parse_config(config_str: &str) -> Config {
        match toml::from_str(config_str) {
            Ok(config) => config,
            Err(e) => {
                error!("Error while parsing the configuration: {e}");
                warn!("Using default configuration");
                Config::default()
            }
        }
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store_path)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    fn config_file_path() -> Result<PathBuf, AppError> {
        let mut config_path = dirs::config_dir()
            .ok_or_else(|| AppError::Config("Could not determine config directory.".to_string()))?;
        config_path.push("notelock");
        config_path.push("notelock.toml");
        Ok(config_path)
    }
}

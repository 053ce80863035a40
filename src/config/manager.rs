use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::remote::Credentials;

/// Server the browser connects to
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Read from the file when present, never written back.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 21,
            username: "anonymous".to_string(),
            password: None,
        }
    }
}

/// Application settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    pub connection_timeout: u64,
    pub io_timeout: u64,
    pub history_limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            connection_timeout: 20,
            io_timeout: 60,
            history_limit: 256,
            download_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout)
    }
}

/// Main configuration structure
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub settings: AppSettings,
}

impl Config {
    /// Login for the configured server. An absent password means an empty one.
    pub fn credentials(&self) -> Result<Credentials> {
        let credentials = Credentials::new(
            self.server.host.trim(),
            self.server.port,
            self.server.username.trim(),
            self.server.password.clone().unwrap_or_default(),
        );
        credentials.validate()?;
        Ok(credentials)
    }

    /// Configured directory, else the platform download directory, else `.`.
    pub fn download_dir(&self) -> PathBuf {
        self.settings
            .download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn validate(&self) -> Result<()> {
        self.credentials().map(|_| ())
    }
}

/// Values given on the command line. `Some` wins over the file.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Loads and persists `config.toml`
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Load from the default location, `<config dir>/ftpnav/config.toml`.
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::with_path(config_path)
    }

    pub fn with_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref().to_path_buf();
        let config = Self::load_config_from_path(&config_path)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            AppError::ConfigError("Cannot determine the user config directory".to_string())
        })?;
        Ok(config_dir.join("ftpnav").join("config.toml"))
    }

    fn load_config_from_path(config_path: &Path) -> Result<Config> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(config_path)
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&config_content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            host,
            port,
            username,
            password,
            download_dir,
            log_level,
        } = overrides;

        if let Some(host) = host {
            self.config.server.host = host;
        }
        if let Some(port) = port {
            self.config.server.port = port;
        }
        if let Some(username) = username {
            self.config.server.username = username;
        }
        if password.is_some() {
            self.config.server.password = password;
        }
        if download_dir.is_some() {
            self.config.settings.download_dir = download_dir;
        }
        if let Some(level) = log_level {
            self.config.settings.log_level = level;
        }
    }

    /// Persist current config to disk. The password is left out.
    pub fn save(&self) -> Result<()> {
        self.config.validate()?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }
        let toml = toml::to_string_pretty(&self.config)
            .map_err(|e| AppError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(&self.config_path, toml)
            .map_err(|e| AppError::ConfigError(format!("Failed to write config: {}", e)))?;
        Ok(())
    }
}

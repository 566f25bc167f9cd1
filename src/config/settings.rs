//! TOML-based configuration for flatbridge.
//!
//! Supports a config file (flatbridge.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3001
//! upload_limit_mb = 256
//! cors = true
//!
//! [transfer]
//! holding_dir = "${HOME}/flatbridge/exports"
//! upload_dir = "/tmp/flatbridge"
//! preview_limit = 100
//! default_delimiter = ","
//!
//! [clickhouse]
//! timeout_secs = 300
//!
//! [connections.warehouse]
//! host = "https://ch.internal"
//! database = "analytics"
//! username = "loader"
//! token = "${CH_TOKEN}"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::ConnectionConfig;
use crate::flatfile::PREVIEW_ROW_CAP;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP server settings.
    pub server: ServerSettings,

    /// Transfer settings.
    pub transfer: TransferSettings,

    /// ClickHouse client settings.
    pub clickhouse: ClickHouseSettings,

    /// Named connections for the CLI.
    pub connections: HashMap<String, ConnectionSettings>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Largest accepted multipart upload, in MiB.
    pub upload_limit_mb: usize,

    /// Allow cross-origin requests from any origin.
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            upload_limit_mb: 256,
            cors: true,
        }
    }
}

/// Transfer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Directory export files are written to and served from.
    pub holding_dir: String,

    /// Directory uploaded files are staged in while a request runs.
    pub upload_dir: String,

    /// Row cap for database previews.
    pub preview_limit: u64,

    /// Delimiter used when a request does not name one.
    pub default_delimiter: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            holding_dir: "exports".to_string(),
            upload_dir: env::temp_dir()
                .join("flatbridge-uploads")
                .to_string_lossy()
                .into_owned(),
            preview_limit: PREVIEW_ROW_CAP as u64,
            default_delimiter: ",".to_string(),
        }
    }
}

impl TransferSettings {
    /// Holding directory with environment variables expanded.
    pub fn resolved_holding_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.holding_dir).map(PathBuf::from)
    }

    /// Upload directory with environment variables expanded.
    pub fn resolved_upload_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.upload_dir).map(PathBuf::from)
    }
}

/// ClickHouse client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClickHouseSettings {
    /// Per-request timeout in seconds; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for ClickHouseSettings {
    fn default() -> Self {
        Self { timeout_secs: 300 }
    }
}

/// A named connection (strings support `${ENV_VAR}` expansion).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl ConnectionSettings {
    /// Expand environment variables into a [`ConnectionConfig`].
    pub fn resolve(&self) -> Result<ConnectionConfig, SettingsError> {
        let expand_opt = |v: &Option<String>| v.as_deref().map(expand_env_vars).transpose();
        Ok(ConnectionConfig {
            host: expand_env_vars(&self.host)?,
            port: self.port,
            database: expand_env_vars(&self.database)?,
            username: expand_opt(&self.username)?,
            token: expand_opt(&self.token)?,
        })
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `FLATBRIDGE_CONFIG`
    /// 2. `./flatbridge.toml`
    /// 3. `~/.config/flatbridge/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("FLATBRIDGE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("flatbridge.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("flatbridge").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection ("default" if it exists, otherwise the only one).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        if self.connections.len() == 1 {
            return self.connections.iter().next().map(|(k, v)| (k.as_str(), v));
        }
        None
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.transfer.preview_limit == 0 {
            return Err(SettingsError::InvalidConfig(
                "transfer.preview_limit must be at least 1".into(),
            ));
        }
        if self.server.upload_limit_mb == 0 {
            return Err(SettingsError::InvalidConfig(
                "server.upload_limit_mb must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut name = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                name.push(ch);
            }
            if !closed {
                return Err(SettingsError::InvalidConfig(format!(
                    "unterminated ${{...}} in {s:?}"
                )));
            }
            name
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}

//! ClickHouse connection configuration.
//!
//! A connection config arrives with every request (JSON, camelCase) or is
//! assembled by the CLI from flags and environment variables:
//! - `FLATBRIDGE_CH_HOST`: server hostname or `http(s)://` URL
//! - `FLATBRIDGE_CH_PORT`: HTTP port (optional, 8123 / 8443 by scheme)
//! - `FLATBRIDGE_CH_DATABASE`: database name
//! - `FLATBRIDGE_CH_USER`: username (optional, `default`)
//! - `FLATBRIDGE_CH_TOKEN`: password or access token (optional)

use std::env;
use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};

use crate::sql::{validate_identifier, IdentKind, InvalidIdentifier};

/// Default ClickHouse HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 8123;
/// Default ClickHouse HTTPS port.
pub const DEFAULT_HTTPS_PORT: u16 = 8443;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidName(#[from] InvalidIdentifier),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// ClickHouse connection configuration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Server hostname, `host:port`, or full `http(s)://` URL.
    #[serde(default)]
    pub host: String,
    /// HTTP port. Accepts a number or a numeric string.
    #[serde(default, deserialize_with = "port_from_number_or_string")]
    pub port: Option<u16>,
    /// Database name.
    #[serde(default)]
    pub database: String,
    /// Username (optional).
    #[serde(default)]
    pub username: Option<String>,
    /// Password or access token (optional).
    #[serde(default)]
    pub token: Option<String>,
}

impl ConnectionConfig {
    /// Create a config for `host` and `database` with default port and no credentials.
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required: `FLATBRIDGE_CH_HOST`, `FLATBRIDGE_CH_DATABASE`.
    /// Optional: `FLATBRIDGE_CH_PORT`, `FLATBRIDGE_CH_USER`, `FLATBRIDGE_CH_TOKEN`.
    pub fn from_env() -> Result<Self, ConnectionError> {
        let host = env::var("FLATBRIDGE_CH_HOST")
            .map_err(|_| ConnectionError::MissingEnvVar("FLATBRIDGE_CH_HOST".to_string()))?;
        let database = env::var("FLATBRIDGE_CH_DATABASE")
            .map_err(|_| ConnectionError::MissingEnvVar("FLATBRIDGE_CH_DATABASE".to_string()))?;

        let port = match env::var("FLATBRIDGE_CH_PORT") {
            Ok(p) => Some(p.trim().parse().map_err(|_| {
                ConnectionError::InvalidConfig(format!("FLATBRIDGE_CH_PORT is not a port: {p}"))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            host,
            port,
            database,
            username: env::var("FLATBRIDGE_CH_USER").ok(),
            token: env::var("FLATBRIDGE_CH_TOKEN").ok(),
        })
    }

    /// Check that the required fields are present and the database name is usable.
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.host.trim().is_empty() {
            return Err(ConnectionError::MissingField("host"));
        }
        if self.database.trim().is_empty() {
            return Err(ConnectionError::MissingField("database"));
        }
        validate_identifier(IdentKind::Database, &self.database)?;
        Ok(())
    }

    /// Base URL of the ClickHouse HTTP interface.
    ///
    /// A bare host gets `http://`. An explicit `port` wins over a port in
    /// the host; otherwise the scheme's default is used.
    pub fn base_url(&self) -> Result<Url, ConnectionError> {
        let host = self.host.trim().trim_end_matches('/');
        let raw = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };

        let mut url = Url::parse(&raw)
            .map_err(|e| ConnectionError::InvalidConfig(format!("invalid host {host:?}: {e}")))?;
        if !url.host_str().is_some_and(|h| !h.is_empty()) {
            return Err(ConnectionError::InvalidConfig(format!(
                "invalid host {host:?}: no hostname"
            )));
        }

        let port = match (self.port, url.port()) {
            (Some(p), _) => p,
            (None, Some(p)) => p,
            (None, None) if url.scheme() == "https" => DEFAULT_HTTPS_PORT,
            (None, None) => DEFAULT_HTTP_PORT,
        };
        url.set_port(Some(port))
            .map_err(|_| ConnectionError::InvalidConfig(format!("cannot set port on {host:?}")))?;

        Ok(url)
    }

    /// Username to authenticate as.
    pub fn user(&self) -> &str {
        match self.username.as_deref() {
            Some(u) if !u.is_empty() => u,
            _ => "default",
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(p)) => Ok(Some(p)),
        Some(Port::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Port::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port: {s}"))),
    }
}

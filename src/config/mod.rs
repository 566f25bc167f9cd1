//! Configuration module for flatbridge.
//!
//! Handles per-request connection configuration, environment variables, and
//! the server/CLI settings file.

mod connection;
mod settings;

pub use connection::{ConnectionConfig, ConnectionError, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT};
pub use settings::{
    expand_env_vars, ClickHouseSettings, ConnectionSettings, ServerSettings, Settings,
    SettingsError, TransferSettings,
};

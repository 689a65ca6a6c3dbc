//! Configuration types for watchdog-guard
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::util::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Who may talk to the bot
    pub access: AccessConfig,

    /// Credential encryption settings
    pub security: SecurityConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Access control configuration
///
/// `allowed_users` keeps the raw comma-separated form so that parsing, and its
/// fail-open fallback, happens in one place: the access gate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Comma-separated user ids; empty means open mode
    pub allowed_users: String,

    /// Re-read `ALLOWED_USERS` from the environment on every query
    pub live_reload: bool,

    /// Refuse to start on a malformed allow-list instead of failing open
    pub strict: bool,

    /// Allow-list as configured before `ALLOWED_USERS` was applied.
    ///
    /// Set by the loader; the live source falls back to it while the
    /// variable is unset. `None` means `allowed_users` came from the file.
    #[serde(skip)]
    pub file_allowed_users: Option<String>,
}

impl AccessConfig {
    /// Value used by the live source while `ALLOWED_USERS` is unset
    pub fn fallback_allowed_users(&self) -> &str {
        self.file_allowed_users
            .as_deref()
            .unwrap_or(&self.allowed_users)
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_users: String::new(),
            live_reload: true,
            strict: false,
            file_allowed_users: None,
        }
    }
}

/// Credential encryption configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Operator secret the cipher key is derived from (prefer env var SECRET_KEY)
    pub secret_key: Option<SecretString>,

    /// Maximum token age in seconds; 0 or unset disables expiry
    pub token_ttl_secs: Option<u64>,
}

impl SecurityConfig {
    /// Token time-to-live, if one is configured
    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or any `EnvFilter` directive
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

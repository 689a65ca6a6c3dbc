//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Conventional variables (`ALLOWED_USERS`, `SECRET_KEY`)
//! 2. Prefixed environment variables (WATCHDOG_GUARD__*)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the comma-separated allow-list
pub const ALLOWED_USERS_VAR: &str = "ALLOWED_USERS";

/// Environment variable holding the operator secret
pub const SECRET_KEY_VAR: &str = "SECRET_KEY";

/// Prefix for nested environment overrides
const ENV_PREFIX: &str = "WATCHDOG_GUARD";

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "watchdog-guard.toml",
    ".watchdog-guard.toml",
    "~/.config/watchdog-guard/config.toml",
    "/etc/watchdog-guard/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
///
/// Environment variables are not consulted.
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Defaults come from serde on AppConfig

    // 2. Configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Prefixed variables, e.g. WATCHDOG_GUARD__LOGGING__LEVEL
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    // Allow-list before ALLOWED_USERS, kept for the live source's fallback
    let file_allowed_users = builder
        .build_cloned()
        .map_err(|e| ConfigError::Load(e.to_string()))?
        .get_string("access.allowed_users")
        .unwrap_or_default();

    // 4. Conventional variable names
    builder = apply_conventional_env(builder)?;

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    app_config.access.file_allowed_users = Some(file_allowed_users);

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Map `ALLOWED_USERS` and `SECRET_KEY` onto their config keys
fn apply_conventional_env(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if let Ok(users) = std::env::var(ALLOWED_USERS_VAR) {
        builder = builder
            .set_override("access.allowed_users", users)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    // An empty SECRET_KEY counts as unset
    if let Ok(secret) = std::env::var(SECRET_KEY_VAR)
        && !secret.is_empty()
    {
        builder = builder
            .set_override("security.secret_key", secret)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    Ok(builder)
}

/// Validate configuration values
///
/// A missing secret is not an error here: the cipher reports itself as
/// uninitialized and the startup check decides what to do.
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(secret) = &config.security.secret_key
        && secret.is_empty()
    {
        return Err(ConfigError::Invalid {
            message: "security.secret_key must not be empty; remove it or set a value"
                .to_string(),
        });
    }

    if let Err(e) = EnvFilter::try_new(&config.logging.level) {
        return Err(ConfigError::Invalid {
            message: format!(
                "logging.level '{}' is not a valid filter: {}",
                config.logging.level, e
            ),
        });
    }

    Ok(())
}

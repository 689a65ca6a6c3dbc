//! Configuration module
//!
//! Handles loading and validating configuration from TOML files and environment variables.

pub mod loader;
pub mod types;

pub use loader::{ALLOWED_USERS_VAR, SECRET_KEY_VAR, load_config, load_config_from_str};
pub use types::*;

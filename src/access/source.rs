//! Where the raw allow-list comes from
//!
//! The gate asks its source for the current value on every query, so a source
//! that reads the process environment picks up changes without a restart.

use crate::config::{ALLOWED_USERS_VAR, AccessConfig};
use std::env::{self, VarError};
use tracing::error;

/// Provider of the raw, comma-separated allow-list
pub trait AllowListSource: Send + Sync {
    /// Current raw value; `None` when nothing is configured
    fn raw_allow_list(&self) -> Option<String>;

    /// Short description for logging
    fn describe(&self) -> &'static str;
}

/// Reads the allow-list from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvAllowList {
    var: String,
    fallback: Option<String>,
}

impl EnvAllowList {
    /// Read `ALLOWED_USERS`
    pub fn new() -> Self {
        Self::with_var(ALLOWED_USERS_VAR)
    }

    /// Read a custom variable
    pub fn with_var(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            fallback: None,
        }
    }

    /// Value used while the variable is unset (e.g. from the config file)
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

impl Default for EnvAllowList {
    fn default() -> Self {
        Self::new()
    }
}

impl AllowListSource for EnvAllowList {
    fn raw_allow_list(&self) -> Option<String> {
        match env::var(&self.var) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => self.fallback.clone(),
            Err(e @ VarError::NotUnicode(_)) => {
                error!(
                    error = %e,
                    var = %self.var,
                    "Unreadable allow-list variable, ignoring it"
                );
                self.fallback.clone()
            }
        }
    }

    fn describe(&self) -> &'static str {
        "environment"
    }
}

/// Fixed allow-list captured once
#[derive(Debug, Clone, Default)]
pub struct StaticAllowList {
    raw: String,
}

impl StaticAllowList {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl AllowListSource for StaticAllowList {
    fn raw_allow_list(&self) -> Option<String> {
        Some(self.raw.clone())
    }

    fn describe(&self) -> &'static str {
        "snapshot"
    }
}

/// Pick the source described by the access configuration
pub fn source_from_config(config: &AccessConfig) -> Box<dyn AllowListSource> {
    if config.live_reload {
        Box::new(EnvAllowList::new().with_fallback(config.fallback_allowed_users()))
    } else {
        Box::new(StaticAllowList::new(config.allowed_users.clone()))
    }
}

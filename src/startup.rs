//! Startup security check
//!
//! Run once before the bot starts taking events. A missing or unusable
//! secret is fatal; so is a malformed allow-list when strict mode is on.

use crate::access::{AccessGate, AccessMode, source_from_config};
use crate::cipher::{TokenCipher, generate_secret_key};
use crate::config::AppConfig;
use crate::dispatch::{AccessMiddleware, EventLogger};
use crate::error::StartupError;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What the startup check found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityReport {
    pub access_mode: AccessMode,
    /// Allow-list could not be parsed and the gate is failing open
    pub allow_list_malformed: bool,
}

/// Validate the cipher and the allow-list, logging the outcome.
///
/// On an uninitialized cipher a freshly generated key is logged as an
/// example of what `SECRET_KEY` should look like.
pub fn check_security(
    cipher: &TokenCipher,
    gate: &AccessGate,
    strict: bool,
) -> Result<SecurityReport, StartupError> {
    if !cipher.validate_secret_key() {
        error!("SECRET_KEY not set or invalid");
        info!(example = %generate_secret_key(), "Generated key example");
        return Err(StartupError::SecretKeyInvalid);
    }
    info!("SECRET_KEY is valid");

    let allow_list_malformed = match gate.validate_allow_list() {
        Ok(_) => false,
        Err(e) if strict => {
            error!(error = %e, "Refusing to start with a malformed ALLOWED_USERS");
            return Err(StartupError::AllowList(e));
        }
        Err(e) => {
            warn!(error = %e, "ALLOWED_USERS is malformed, bot is open to all users");
            true
        }
    };

    let access_mode = gate.mode();
    match access_mode {
        AccessMode::Open => info!("Open access for all users"),
        AccessMode::Restricted { allowed } => info!(allowed, "Restricted access"),
    }

    Ok(SecurityReport {
        access_mode,
        allow_list_malformed,
    })
}

/// Everything an event loop needs, built from configuration and checked
#[derive(Debug)]
pub struct SecurityContext {
    pub cipher: Arc<TokenCipher>,
    pub middleware: AccessMiddleware,
    pub event_logger: EventLogger,
    pub report: SecurityReport,
}

impl SecurityContext {
    /// Build the cipher, gate and middleware chain, then run the startup check
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        let event_logger = EventLogger::new()?;
        let cipher = TokenCipher::from_config(&config.security);
        let gate = AccessGate::from_boxed(source_from_config(&config.access));

        let report = check_security(&cipher, &gate, config.access.strict)?;

        Ok(Self {
            cipher: Arc::new(cipher),
            middleware: AccessMiddleware::new(Arc::new(gate)),
            event_logger,
            report,
        })
    }

    pub fn gate(&self) -> &AccessGate {
        self.middleware.gate()
    }
}

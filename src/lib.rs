//! Messaging-bot access gate and credential protection
//!
//! ## Features
//!
//! - **Access gate** - allow-list of user ids from `ALLOWED_USERS`; empty
//!   means open mode, a malformed list fails open with an error logged
//! - **Token cipher** - PBKDF2-derived AES-256-GCM encryption of stored
//!   OAuth credentials, returning `None` instead of failing loudly
//! - **Dispatch middleware** - access check and credential-scrubbing event
//!   log in front of business handlers
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use watchdog_guard::{AccessGate, TokenCipher, util::SecretString};
//!
//! let gate = Arc::new(AccessGate::from_env());
//! if !gate.check(100, Some("alice")).is_allowed() {
//!     return;
//! }
//!
//! let secret = SecretString::new("correct-horse-battery-staple");
//! let cipher = Arc::new(TokenCipher::new(Some(&secret)));
//! let sealed = cipher.encrypt_token("refresh_token_abc123");
//! ```

pub mod access;
pub mod cipher;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod startup;
pub mod util;

// Re-export main types
pub use access::{AccessDecision, AccessGate, AllowSet};
pub use cipher::{TokenCipher, generate_secret_key};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use startup::{SecurityContext, SecurityReport, check_security};

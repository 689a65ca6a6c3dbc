//! Error types for watchdog-guard
//!
//! This module defines the error hierarchy used throughout the crate.
//! Each concern gets its own `thiserror` enum; the public access and
//! cipher contracts convert these into sentinel values at their boundary.

use std::num::ParseIntError;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Startup check failed: {0}")]
    Startup(#[from] StartupError),
}

/// Fatal findings of the startup security check
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("SECRET_KEY not set or invalid")]
    SecretKeyInvalid,

    #[error("ALLOWED_USERS is malformed and strict mode is on: {0}")]
    AllowList(#[from] AllowListError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Invalid redaction pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A single allow-list entry that is not an unsigned integer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("entry '{entry}' is not a user id: {source}")]
pub struct AllowListError {
    pub entry: String,
    #[source]
    pub source: ParseIntError,
}

impl AllowListError {
    pub fn new(entry: impl Into<String>, source: ParseIntError) -> Self {
        Self {
            entry: entry.into(),
            source,
        }
    }
}

/// Token cipher errors
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Encryption not initialized")]
    NotInitialized,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Token is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unsupported token version 0x{0:02x}")]
    UnsupportedVersion(u8),

    #[error("Token failed authentication (tampered or wrong key)")]
    Authentication,

    #[error("Encryption failed")]
    Seal,

    #[error("Token expired: issued at {issued_at}, ttl {ttl_secs}s")]
    Expired { issued_at: u64, ttl_secs: u64 },

    #[error("Token issued in the future: {issued_at} > {now}")]
    FromFuture { issued_at: u64, now: u64 },

    #[error("Decrypted token is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("System clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

/// Errors raised while answering the originator of an event
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to deliver reply: {0}")]
    Reply(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for cipher operations
pub type CipherResult<T> = std::result::Result<T, CipherError>;

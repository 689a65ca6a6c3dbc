//! Utility types shared across the crate.

mod redact;
mod secret;

pub use redact::{MAX_LOGGED_TEXT, Redactor, truncate_for_log};
pub use secret::SecretString;

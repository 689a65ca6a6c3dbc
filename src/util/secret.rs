//! Secret string type for the operator secret.
//!
//! Keeps `SECRET_KEY` out of debug output, logs and error messages.

use serde::Deserialize;
use std::fmt;
use zeroize::Zeroize;

/// A wrapper for secrets that prevents accidental logging.
///
/// - `Debug` and `Display` print `[REDACTED]`
/// - the value is only reachable through `expose_secret()`
/// - the backing buffer is zeroized on drop
///
/// # Example
/// ```
/// use watchdog_guard::util::SecretString;
///
/// let secret = SecretString::new("correct-horse-battery-staple");
/// assert_eq!(format!("{secret:?}"), "[REDACTED]");
/// assert_eq!(secret.expose_secret(), "correct-horse-battery-staple");
/// ```
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret from any string-like value.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Explicitly expose the secret value.
    ///
    /// Only the key derivation should need this.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// True if the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}

//! Key derivation
//!
//! Stretches the operator secret into a 32-byte cipher key with
//! PBKDF2-HMAC-SHA256. Derivation is deterministic: the same secret always
//! yields the same key, so tokens sealed before a restart stay readable.
//!
//! The salt is a fixed constant. Every deployment sharing this code but
//! using a different secret still gets a different key; a per-deployment
//! random salt stored next to the secret would be stronger.

use crate::error::CipherError;
use crate::util::SecretString;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the derived key in bytes
pub const KEY_LEN: usize = 32;

/// Fixed derivation salt
pub const KDF_SALT: &[u8] = b"yt_watchdog_salt";

/// PBKDF2 iteration count
pub const KDF_ITERATIONS: u32 = 100_000;

/// PBKDF2 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub salt: &'static [u8],
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            salt: KDF_SALT,
            iterations: KDF_ITERATIONS,
        }
    }
}

/// Symmetric key derived from the operator secret
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Derive with the default salt and iteration count
    pub fn derive(secret: &SecretString) -> Self {
        Self::derive_with(secret.expose_secret().as_bytes(), KdfParams::default())
    }

    /// Derive with explicit parameters
    pub fn derive_with(secret: &[u8], params: KdfParams) -> Self {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(secret, params.salt, params.iterations, &mut key);
        Self(key)
    }

    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Fresh random key
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Parse the URL-safe base64 text form
    pub fn from_base64(text: &str) -> Result<Self, CipherError> {
        let mut decoded = URL_SAFE
            .decode(text.trim())
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;

        let result = <[u8; KEY_LEN]>::try_from(decoded.as_slice())
            .map(Self)
            .map_err(|_| {
                CipherError::InvalidKey(format!(
                    "expected {} bytes, got {}",
                    KEY_LEN,
                    decoded.len()
                ))
            });
        decoded.zeroize();
        result
    }

    /// URL-safe base64 text form, suitable for configuration files
    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

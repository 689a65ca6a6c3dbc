//! Token cipher
//!
//! Protects long-lived third-party credentials (OAuth refresh tokens and the
//! like) at rest with authenticated encryption.
//!
//! ## Lifecycle
//!
//! A `TokenCipher` is built once at startup from `SECRET_KEY` and shared by
//! reference (`Arc<TokenCipher>`) with every call site. Without a secret the
//! cipher is *uninitialized*: it still exists, but every encrypt/decrypt call
//! logs an error and returns `None`, so startup checks can detect the
//! misconfiguration through [`TokenCipher::is_initialized`].
//!
//! ## Guarantees
//!
//! - key: PBKDF2-HMAC-SHA256, fixed salt, 100 000 iterations (see [`kdf`])
//! - confidentiality and integrity: AES-256-GCM (see [`token`])
//! - freshness: a random nonce per token, so equal plaintexts never produce
//!   equal ciphertexts
//! - optional expiry based on the issue time sealed into each token

pub mod kdf;
pub mod token;

pub use kdf::{DerivedKey, KDF_ITERATIONS, KDF_SALT, KdfParams};
pub use token::SealedToken;

use crate::config::SecurityConfig;
use crate::error::{CipherError, CipherResult};
use crate::util::SecretString;
use aes_gcm::{Aes256Gcm, KeyInit};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

/// Tolerated clock skew for tokens stamped in the future
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Authenticated encryption of credential strings
pub struct TokenCipher {
    engine: Option<Aes256Gcm>,
    ttl: Option<Duration>,
}

impl TokenCipher {
    /// Build from an optional operator secret.
    ///
    /// `None` yields an uninitialized cipher and logs an error.
    pub fn new(secret: Option<&SecretString>) -> Self {
        let Some(secret) = secret.filter(|s| !s.is_empty()) else {
            error!("SECRET_KEY not found in configuration or environment");
            return Self::uninitialized();
        };

        let key = DerivedKey::derive(secret);
        match Self::from_derived_key(&key) {
            Ok(cipher) => cipher,
            Err(e) => {
                error!(error = %e, "Failed to initialize encryption");
                Self::uninitialized()
            }
        }
    }

    /// Build from the security section of the configuration
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.secret_key.as_ref()).with_ttl(config.token_ttl())
    }

    /// Build directly from a derived key
    pub fn from_derived_key(key: &DerivedKey) -> CipherResult<Self> {
        let text = key.to_base64();
        Self::from_key_text(&text)
    }

    /// Build from the URL-safe base64 text form of a 32-byte key
    pub fn from_key_text(text: &str) -> CipherResult<Self> {
        let key = DerivedKey::from_base64(text)?;
        let engine = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;

        debug!("Token cipher initialized");
        Ok(Self {
            engine: Some(engine),
            ttl: None,
        })
    }

    /// A cipher that refuses every operation
    pub fn uninitialized() -> Self {
        Self {
            engine: None,
            ttl: None,
        }
    }

    /// Reject tokens older than `ttl` on decryption
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether the cipher can encrypt and decrypt
    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Alias of [`is_initialized`](Self::is_initialized) for startup validation
    pub fn validate_secret_key(&self) -> bool {
        self.is_initialized()
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Encrypt a credential; `None` on failure (logged)
    pub fn encrypt_token(&self, plaintext: &str) -> Option<String> {
        let result = unix_now().and_then(|now| self.try_encrypt_at(plaintext, now));
        log_failure(result, "Failed to encrypt token")
    }

    /// Encrypt with an explicit issue time (unix seconds)
    pub fn encrypt_token_at(&self, plaintext: &str, issued_at: u64) -> Option<String> {
        log_failure(
            self.try_encrypt_at(plaintext, issued_at),
            "Failed to encrypt token",
        )
    }

    /// Decrypt a credential; `None` if malformed, tampered, expired or on a
    /// wrong key (logged)
    pub fn decrypt_token(&self, token: &str) -> Option<String> {
        let result = unix_now().and_then(|now| self.try_decrypt_at(token, now));
        log_failure(result, "Failed to decrypt token")
    }

    /// Decrypt against an explicit current time (unix seconds)
    pub fn decrypt_token_at(&self, token: &str, now: u64) -> Option<String> {
        log_failure(self.try_decrypt_at(token, now), "Failed to decrypt token")
    }

    /// Encrypt, propagating the failure reason
    pub fn try_encrypt_at(&self, plaintext: &str, issued_at: u64) -> CipherResult<String> {
        let engine = self.engine()?;
        let sealed = SealedToken::seal(engine, plaintext.as_bytes(), issued_at, rand::random())?;
        Ok(sealed.encode())
    }

    /// Decrypt, propagating the failure reason
    pub fn try_decrypt_at(&self, token: &str, now: u64) -> CipherResult<String> {
        let engine = self.engine()?;
        let sealed = SealedToken::decode(token)?;

        if let Some(ttl) = self.ttl {
            check_freshness(sealed.issued_at, now, ttl)?;
        }

        let plaintext = sealed.open(engine)?;
        Ok(String::from_utf8(plaintext)?)
    }

    fn engine(&self) -> CipherResult<&Aes256Gcm> {
        self.engine.as_ref().ok_or(CipherError::NotInitialized)
    }
}

impl fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCipher")
            .field("initialized", &self.is_initialized())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Produce a fresh random key in the text form accepted as `SECRET_KEY`
pub fn generate_secret_key() -> String {
    DerivedKey::generate().to_base64()
}

fn check_freshness(issued_at: u64, now: u64, ttl: Duration) -> CipherResult<()> {
    let ttl_secs = ttl.as_secs();
    if issued_at > now.saturating_add(MAX_CLOCK_SKEW_SECS) {
        return Err(CipherError::FromFuture { issued_at, now });
    }
    if issued_at.saturating_add(ttl_secs) < now {
        return Err(CipherError::Expired {
            issued_at,
            ttl_secs,
        });
    }
    Ok(())
}

fn unix_now() -> CipherResult<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn log_failure<T>(result: CipherResult<T>, message: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(error = %e, "{}", message);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> TokenCipher {
        TokenCipher::from_key_text(&generate_secret_key()).unwrap()
    }

    #[test]
    fn test_uninitialized_without_secret() {
        let cipher = TokenCipher::new(None);
        assert!(!cipher.is_initialized());
        assert!(!cipher.validate_secret_key());
        assert_eq!(cipher.encrypt_token("x"), None);
        assert_eq!(cipher.decrypt_token("x"), None);
    }

    #[test]
    fn test_empty_secret_is_uninitialized() {
        let secret = SecretString::new("");
        assert!(!TokenCipher::new(Some(&secret)).is_initialized());
    }

    #[test]
    fn test_not_initialized_error() {
        let cipher = TokenCipher::uninitialized();
        assert!(matches!(
            cipher.try_encrypt_at("x", 0),
            Err(CipherError::NotInitialized)
        ));
    }

    #[test]
    fn test_roundtrip() {
        let cipher = cipher();
        let token = cipher.encrypt_token("refresh_token_abc123").unwrap();
        assert_eq!(
            cipher.decrypt_token(&token).as_deref(),
            Some("refresh_token_abc123")
        );
    }

    #[test]
    fn test_bad_key_text() {
        assert!(matches!(
            TokenCipher::from_key_text("too-short"),
            Err(CipherError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_check_freshness() {
        let ttl = Duration::from_secs(100);
        assert!(check_freshness(1000, 1000, ttl).is_ok());
        assert!(check_freshness(1000, 1100, ttl).is_ok());
        assert!(matches!(
            check_freshness(1000, 1101, ttl),
            Err(CipherError::Expired { .. })
        ));
        assert!(check_freshness(1060, 1000, ttl).is_ok());
        assert!(matches!(
            check_freshness(1061, 1000, ttl),
            Err(CipherError::FromFuture { .. })
        ));
    }

    #[test]
    fn test_generate_secret_key_is_fresh() {
        let a = generate_secret_key();
        let b = generate_secret_key();
        assert_ne!(a, b);
        assert!(TokenCipher::from_key_text(&a).is_ok());
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", cipher());
        assert!(debug.contains("initialized: true"));
    }
}

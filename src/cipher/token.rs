//! Sealed token layout
//!
//! ```text
//! +---------+----------------+-----------+------------------------------+
//! | version | issued_at (BE) | nonce     | AES-256-GCM ciphertext + tag |
//! | 1 byte  | 8 bytes        | 12 bytes  | n + 16 bytes                 |
//! +---------+----------------+-----------+------------------------------+
//! ```
//!
//! The version byte and issue time are authenticated as associated data, so
//! neither can be altered without failing decryption. The whole frame is
//! stored as URL-safe base64 text.

use crate::error::{CipherError, CipherResult};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

/// Current frame version
pub const TOKEN_VERSION: u8 = 0x01;

/// Nonce length for AES-GCM
pub const NONCE_LEN: usize = 12;

/// Authentication tag length for AES-GCM
pub const TAG_LEN: usize = 16;

/// version + issued_at
const HEADER_LEN: usize = 1 + 8;

/// Smallest possible frame (empty plaintext)
pub const MIN_FRAME_LEN: usize = HEADER_LEN + NONCE_LEN + TAG_LEN;

/// Decoded token frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedToken {
    pub issued_at: u64,
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl SealedToken {
    /// Encrypt `plaintext` under `cipher`
    pub fn seal(
        cipher: &Aes256Gcm,
        plaintext: &[u8],
        issued_at: u64,
        nonce: [u8; NONCE_LEN],
    ) -> CipherResult<Self> {
        let aad = header(issued_at);
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|_| CipherError::Seal)?;

        Ok(Self {
            issued_at,
            nonce,
            ciphertext,
        })
    }

    /// Authenticate and decrypt
    pub fn open(&self, cipher: &Aes256Gcm) -> CipherResult<Vec<u8>> {
        let aad = header(self.issued_at);
        cipher
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: &self.ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| CipherError::Authentication)
    }

    /// Serialize to raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&header(self.issued_at));
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse raw bytes
    pub fn from_bytes(bytes: &[u8]) -> CipherResult<Self> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(CipherError::Malformed(format!(
                "token is {} bytes, minimum is {}",
                bytes.len(),
                MIN_FRAME_LEN
            )));
        }

        let (version, rest) = bytes.split_at(1);
        if version[0] != TOKEN_VERSION {
            return Err(CipherError::UnsupportedVersion(version[0]));
        }

        let (issued_at, rest) = rest.split_at(8);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let issued_at = u64::from_be_bytes(
            issued_at
                .try_into()
                .map_err(|_| CipherError::Malformed("truncated timestamp".into()))?,
        );
        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| CipherError::Malformed("truncated nonce".into()))?;

        Ok(Self {
            issued_at,
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// URL-safe base64 text form
    pub fn encode(&self) -> String {
        URL_SAFE.encode(self.to_bytes())
    }

    /// Parse the text form
    pub fn decode(text: &str) -> CipherResult<Self> {
        let bytes = URL_SAFE.decode(text.trim())?;
        Self::from_bytes(&bytes)
    }
}

fn header(issued_at: u64) -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    out[0] = TOKEN_VERSION;
    out[1..].copy_from_slice(&issued_at.to_be_bytes());
    out
}

//! Password-based encryption for wallet files
//!
//! PBKDF2-HMAC-SHA256 (480 000 rounds) + AES-256-GCM.
//!
//! # Envelope
//!
//! ```json
//! { "version": "1", "salt": "<base64, 16 bytes>", "data": "<base64 nonce || ciphertext || tag>" }
//! ```
//!
//! # Security Notes
//!
//! - Every call draws a fresh salt and a fresh 96-bit nonce
//! - A failed tag check is the only wrong-password signal; it is reported
//!   as [`CryptoError::InvalidPassword`] whatever the cause, and no
//!   plaintext is released
//! - The password is never stored

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::hashes::pbkdf2_sha256;

/// Envelope format version
pub const ENVELOPE_VERSION: &str = "1";

/// PBKDF2-HMAC-SHA256 rounds for the wallet key
pub const PBKDF2_ITERATIONS: u32 = 480_000;

const KEY_LEN: usize = 32;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid password or corrupted data")]
    InvalidPassword,
    #[error("Malformed encrypted envelope: {0}")]
    MalformedEnvelope(String),
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
}

/// At-rest form of an encrypted wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedEnvelope {
    pub version: String,
    pub salt: String,
    pub data: String,
}

fn derive_key(password: &str, salt: &[u8], rounds: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_sha256(password.as_bytes(), salt, rounds, key.as_mut_slice());
    key
}

/// Encrypt `plaintext` under `password`
pub fn seal(plaintext: &[u8], password: &str) -> Result<EncryptedEnvelope, CryptoError> {
    seal_with_rounds(plaintext, password, PBKDF2_ITERATIONS)
}

/// Decrypt an envelope produced by [`seal`]
pub fn open(envelope: &EncryptedEnvelope, password: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    open_with_rounds(envelope, password, PBKDF2_ITERATIONS)
}

pub(crate) fn seal_with_rounds(
    plaintext: &[u8],
    password: &str,
    rounds: u32,
) -> Result<EncryptedEnvelope, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let key = derive_key(password, &salt, rounds);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);

    Ok(EncryptedEnvelope {
        version: ENVELOPE_VERSION.to_string(),
        salt: BASE64.encode(salt),
        data: BASE64.encode(blob),
    })
}

pub(crate) fn open_with_rounds(
    envelope: &EncryptedEnvelope,
    password: &str,
    rounds: u32,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if envelope.version != ENVELOPE_VERSION {
        return Err(CryptoError::MalformedEnvelope(format!(
            "unsupported version '{}'",
            envelope.version
        )));
    }

    let salt = BASE64
        .decode(&envelope.salt)
        .map_err(|e| CryptoError::MalformedEnvelope(format!("salt: {}", e)))?;
    if salt.len() != SALT_LEN {
        return Err(CryptoError::MalformedEnvelope(format!(
            "salt must be {} bytes, got {}",
            SALT_LEN,
            salt.len()
        )));
    }

    let blob = BASE64
        .decode(&envelope.data)
        .map_err(|e| CryptoError::MalformedEnvelope(format!("data: {}", e)))?;
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::MalformedEnvelope("data too short".to_string()));
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);

    let key = derive_key(password, &salt, rounds);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::InvalidPassword)?;

    Ok(Zeroizing::new(plaintext))
}

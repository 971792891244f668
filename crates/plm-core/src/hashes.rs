//! Hash, MAC and key-stretching primitives
//!
//! Thin wrappers so the rest of the crate works with plain byte arrays.

use bitcoin::hashes::{hash160, sha256, sha256d, sha512, Hash, HashEngine, Hmac, HmacEngine};
use sha2::{Sha256, Sha512};

/// SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    sha256::Hash::hash(data).to_byte_array()
}

/// SHA-256 applied twice (Base58Check checksums)
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(data).to_byte_array()
}

/// RIPEMD-160 of SHA-256
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// HMAC-SHA512 over the concatenation of `parts`
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> [u8; 64] {
    let mut engine = HmacEngine::<sha512::Hash>::new(key);
    for part in parts {
        engine.input(part);
    }
    Hmac::from_engine(engine).to_byte_array()
}

/// PBKDF2-HMAC-SHA512, filling `out`
pub fn pbkdf2_sha512(password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
    pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, rounds, out);
}

/// PBKDF2-HMAC-SHA256, filling `out`
pub fn pbkdf2_sha256(password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, out);
}

//! PLM Core
//!
//! Offline HD wallet generation for Palladium.
//!
//! # Pipeline
//!
//! - Mnemonic: BIP-39 or Electrum segwit, 12–24 words
//! - Seed: PBKDF2-HMAC-SHA512, 2048 rounds
//! - Keys: BIP-32 tree, serialized as zprv/zpub
//!   - BIP-39 accounts at m/84h/746h/0h
//!   - Electrum accounts at m/0h
//! - Addresses: P2WPKH bech32 on the external chain (`plm1q...`)
//!
//! # Encrypted Storage
//!
//! Wallet files are encrypted at rest using PBKDF2-HMAC-SHA256 + AES-256-GCM.

pub mod address;
pub mod crypto;
pub mod encoding;
pub mod hashes;
pub mod keys;
pub mod memory;
pub mod params;
pub mod password;
pub mod seed;
pub mod text;
pub mod wallet;

pub use address::{derive_addresses, AddressError, AddressRecord};
pub use crypto::{CryptoError, EncryptedEnvelope};
pub use keys::{ChildNumber, DerivationPath, ExtendedKey, KeyError};
pub use params::{ChainParams, DEFAULT_ADDRESS_COUNT, ELECTRUM_PATH, VALID_WORD_COUNTS};
pub use seed::{generate_mnemonic, mnemonic_to_seed, parse_mnemonic, Seed, SeedError, Standard, WordCount};
pub use wallet::{
    decrypt_wallet, encrypt_wallet, generate_wallet, generate_wallet_with, is_encrypted,
    is_encrypted_json, restore_wallet, ExportMode, WalletError, WalletFile, WalletOptions,
    WalletRecord,
};

//! Wallet orchestration
//!
//! mnemonic → seed → master key → account key → receiving addresses,
//! assembled into an immutable [`WalletRecord`]. Records are stored either
//! as plain JSON or inside an [`EncryptedEnvelope`]; [`WalletFile`] tells
//! the two apart at load time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::address::{derive_addresses, AddressError, AddressRecord};
use crate::crypto::{self, CryptoError, EncryptedEnvelope, PBKDF2_ITERATIONS};
use crate::keys::{ExtendedKey, KeyError};
use crate::params::{ChainParams, DEFAULT_ADDRESS_COUNT};
use crate::seed::{generate_mnemonic, mnemonic_to_seed, parse_mnemonic, SeedError, Standard};

/// Top-level keys of an encrypted wallet file
const ENVELOPE_FIELDS: [&str; 3] = ["version", "salt", "data"];

/// Keys that mark a plaintext wallet file
const WALLET_FIELDS: [&str; 4] = ["mnemonic", "standard", "derivation_path", "addresses"];

#[derive(Error, Debug)]
pub enum WalletError {
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("Malformed wallet file: {0}")]
    MalformedWalletFile(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A fully derived wallet.
///
/// Field order is the on-disk JSON order. Secret strings are wiped on drop.
/// Files only need `standard`, `mnemonic`, `derivation_path` and
/// `addresses`; missing extended keys load as empty strings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct WalletRecord {
    #[zeroize(skip)]
    pub standard: Standard,
    pub mnemonic: String,
    #[serde(default)]
    pub master_zprv: String,
    #[serde(default)]
    pub master_zpub: String,
    pub derivation_path: String,
    #[serde(default)]
    pub zprv: String,
    #[serde(default)]
    pub zpub: String,
    pub addresses: Vec<AddressRecord>,
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("standard", &self.standard)
            .field("master_zpub", &self.master_zpub)
            .field("derivation_path", &self.derivation_path)
            .field("zpub", &self.zpub)
            .field("addresses", &self.addresses.len())
            .finish_non_exhaustive()
    }
}

/// How much key material an export carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// Every field, including per-address keys
    #[default]
    Full,
    /// Address entries reduced to `{path, address}`
    AddressesOnly,
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "full" => Ok(Self::Full),
            "addresses_only" | "addresses" => Ok(Self::AddressesOnly),
            other => Err(format!("unknown export mode '{}'", other)),
        }
    }
}

impl WalletRecord {
    /// Pretty-printed JSON for a wallet file
    pub fn export_json(&self, mode: ExportMode) -> Result<Zeroizing<String>, WalletError> {
        let json = match mode {
            ExportMode::Full => serde_json::to_string_pretty(self)?,
            ExportMode::AddressesOnly => {
                let mut stripped = self.clone();
                stripped.addresses = self.addresses.iter().map(AddressRecord::without_keys).collect();
                serde_json::to_string_pretty(&stripped)?
            }
        };
        Ok(Zeroizing::new(json))
    }
}

/// Parameters for [`generate_wallet_with`]
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WalletOptions {
    pub word_count: usize,
    #[zeroize(skip)]
    pub standard: Standard,
    pub passphrase: String,
    pub address_count: u32,
    #[zeroize(skip)]
    pub params: ChainParams,
}

impl Default for WalletOptions {
    fn default() -> Self {
        Self {
            word_count: 12,
            standard: Standard::Bip39,
            passphrase: String::new(),
            address_count: DEFAULT_ADDRESS_COUNT,
            params: ChainParams::PALLADIUM,
        }
    }
}

impl fmt::Debug for WalletOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletOptions")
            .field("word_count", &self.word_count)
            .field("standard", &self.standard)
            .field("passphrase", &"[redacted]")
            .field("address_count", &self.address_count)
            .field("params", &self.params.name)
            .finish()
    }
}

/// Generate a new wallet with default address count and network
pub fn generate_wallet(
    word_count: usize,
    standard: Standard,
    passphrase: &str,
) -> Result<WalletRecord, WalletError> {
    let mut options = WalletOptions::default();
    options.word_count = word_count;
    options.standard = standard;
    options.passphrase = passphrase.to_string();
    generate_wallet_with(&options)
}

/// Generate a new wallet
pub fn generate_wallet_with(options: &WalletOptions) -> Result<WalletRecord, WalletError> {
    let mnemonic = Zeroizing::new(generate_mnemonic(options.word_count, options.standard)?);
    build_record(
        &mnemonic,
        &options.passphrase,
        options.standard,
        options.address_count,
        &options.params,
    )
}

/// Rebuild a wallet from an existing phrase.
///
/// The phrase is validated under `standard` first; the stored mnemonic is
/// its canonical form.
pub fn restore_wallet(
    mnemonic: &str,
    passphrase: &str,
    standard: Standard,
    address_count: u32,
    params: &ChainParams,
) -> Result<WalletRecord, WalletError> {
    let canonical = parse_mnemonic(mnemonic, standard)?;
    build_record(&canonical, passphrase, standard, address_count, params)
}

fn build_record(
    mnemonic: &str,
    passphrase: &str,
    standard: Standard,
    address_count: u32,
    params: &ChainParams,
) -> Result<WalletRecord, WalletError> {
    let seed = mnemonic_to_seed(mnemonic, passphrase, standard);
    let master = ExtendedKey::new_master(seed.as_bytes())?;
    drop(seed);

    let path = standard.derivation_path(params)?;
    let account = master.derive_path(&path)?;
    let derivation_path = path.to_string();
    log::debug!(
        "deriving {} wallet at {} ({} addresses)",
        standard,
        derivation_path,
        address_count
    );

    let addresses = derive_addresses(&account, address_count, &derivation_path, params)?;

    Ok(WalletRecord {
        standard,
        mnemonic: mnemonic.to_string(),
        master_zprv: master.to_base58(params),
        master_zpub: master.to_public_base58(params),
        derivation_path,
        zprv: account.to_base58(params),
        zpub: account.to_public_base58(params),
        addresses,
    })
}

/// Encrypt the full record under `password`
pub fn encrypt_wallet(record: &WalletRecord, password: &str) -> Result<EncryptedEnvelope, WalletError> {
    encrypt_with_rounds(record, password, PBKDF2_ITERATIONS)
}

/// Decrypt an envelope back into a record
pub fn decrypt_wallet(envelope: &EncryptedEnvelope, password: &str) -> Result<WalletRecord, WalletError> {
    decrypt_with_rounds(envelope, password, PBKDF2_ITERATIONS)
}

fn encrypt_with_rounds(
    record: &WalletRecord,
    password: &str,
    rounds: u32,
) -> Result<EncryptedEnvelope, WalletError> {
    let plaintext = Zeroizing::new(serde_json::to_vec(record)?);
    Ok(crypto::seal_with_rounds(&plaintext, password, rounds)?)
}

fn decrypt_with_rounds(
    envelope: &EncryptedEnvelope,
    password: &str,
    rounds: u32,
) -> Result<WalletRecord, WalletError> {
    let plaintext = crypto::open_with_rounds(envelope, password, rounds)?;
    serde_json::from_slice(&plaintext).map_err(|e| WalletError::MalformedWalletFile(e.to_string()))
}

/// Whether a parsed JSON document is an encrypted envelope: an object
/// with exactly `version`, `salt` and `data`.
pub fn is_encrypted(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => {
            obj.len() == ENVELOPE_FIELDS.len() && ENVELOPE_FIELDS.iter().all(|k| obj.contains_key(*k))
        }
        None => false,
    }
}

/// [`is_encrypted`] over raw text; unparseable input is not encrypted
pub fn is_encrypted_json(json: &str) -> bool {
    serde_json::from_str::<Value>(json)
        .map(|value| is_encrypted(&value))
        .unwrap_or(false)
}

fn is_plain_wallet(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| WALLET_FIELDS.iter().all(|k| obj.contains_key(*k)))
        .unwrap_or(false)
}

/// A wallet file as loaded from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletFile {
    Plain(WalletRecord),
    Encrypted(EncryptedEnvelope),
}

impl WalletFile {
    /// Classify and parse a wallet file
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let value: Value = serde_json::from_str(json)?;

        if is_encrypted(&value) {
            let envelope = serde_json::from_value(value)
                .map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))?;
            return Ok(Self::Encrypted(envelope));
        }

        if is_plain_wallet(&value) {
            let record = serde_json::from_value(value)
                .map_err(|e| WalletError::MalformedWalletFile(e.to_string()))?;
            return Ok(Self::Plain(record));
        }

        Err(WalletError::MalformedWalletFile(
            "neither an encrypted envelope nor a wallet record".to_string(),
        ))
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }
}

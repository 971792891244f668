//! BIP-32 key tree
//!
//! Master key extraction, hardened and normal child derivation, path
//! traversal and zprv/zpub serialization.
//!
//! `bitcoin::bip32` is not used for the tree itself because its version
//! bytes are fixed to Bitcoin's xprv/xpub; the network's zprv/zpub
//! prefixes come from [`ChainParams`] instead.

use std::fmt;
use std::str::FromStr;

use secp256k1::{PublicKey, Scalar, SecretKey, SECP256K1};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::encoding::{base58check_decode, base58check_encode};
use crate::hashes::{hash160, hmac_sha512};
use crate::params::ChainParams;

/// First hardened child index
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// HMAC key for master key generation
const MASTER_KEY_SALT: &[u8] = b"Bitcoin seed";

/// version(4) ‖ depth(1) ‖ fingerprint(4) ‖ child(4) ‖ chain code(32) ‖ key(33)
const SERIALIZED_LEN: usize = 78;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Seed produces an invalid master key")]
    InvalidSeed,
    #[error("Child {0} produces an invalid key")]
    InvalidChildKey(ChildNumber),
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),
    #[error("Invalid extended key: {0}")]
    InvalidExtendedKey(String),
    #[error("Cannot derive hardened child {0} from a public key")]
    HardenedFromPublic(ChildNumber),
}

/// One step of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildNumber {
    index: u32,
    hardened: bool,
}

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self, KeyError> {
        Self::checked(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self, KeyError> {
        Self::checked(index, true)
    }

    fn checked(index: u32, hardened: bool) -> Result<Self, KeyError> {
        if index >= HARDENED_OFFSET {
            return Err(KeyError::InvalidPath(format!(
                "index {} out of range",
                index
            )));
        }
        Ok(Self { index, hardened })
    }

    /// Decode the 32-bit wire form (high bit = hardened)
    pub fn from_u32(raw: u32) -> Self {
        Self {
            index: raw & !HARDENED_OFFSET,
            hardened: raw & HARDENED_OFFSET != 0,
        }
    }

    /// 32-bit wire form
    pub fn to_u32(self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}h", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildNumber {
    type Err = KeyError;

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        let (digits, hardened) = match segment.strip_suffix(['h', 'H', '\'']) {
            Some(rest) => (rest, true),
            None => (segment, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyError::InvalidPath(format!(
                "bad segment '{}'",
                segment
            )));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| KeyError::InvalidPath(format!("bad segment '{}'", segment)))?;
        Self::checked(index, hardened)
    }
}

/// Ordered list of child numbers, textual form `m/84h/746h/0h`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// The empty path `m`
    pub fn master() -> Self {
        Self(Vec::new())
    }

    /// m/84h/{coin_type}h/0h; coin types of 2^31 and above are rejected
    pub fn bip84(coin_type: u32) -> Result<Self, KeyError> {
        Ok(Self(vec![
            ChildNumber::hardened(84)?,
            ChildNumber::hardened(coin_type)?,
            ChildNumber::hardened(0)?,
        ]))
    }

    /// m/0h
    pub fn electrum() -> Self {
        Self(vec![ChildNumber::from_u32(HARDENED_OFFSET)])
    }

    /// Copy of this path extended by one step
    pub fn child(&self, child: ChildNumber) -> Self {
        let mut steps = self.0.clone();
        steps.push(child);
        Self(steps)
    }

    pub fn as_slice(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.0 {
            write!(f, "/{}", child)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(KeyError::InvalidPath(format!(
                "'{}' must start with 'm'",
                s
            )));
        }
        parts
            .map(ChildNumber::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Key material of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyData {
    Private(SecretKey),
    Public(PublicKey),
}

/// A node of the key tree with its chain code and position metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: ChildNumber,
    pub chain_code: [u8; 32],
    key: KeyData,
}

impl ExtendedKey {
    /// Master node: `HMAC-SHA512("Bitcoin seed", seed)` split into key and chain code.
    pub fn new_master(seed: &[u8]) -> Result<Self, KeyError> {
        let i = Zeroizing::new(hmac_sha512(MASTER_KEY_SALT, &[seed]));
        // from_slice rejects zero and values >= curve order
        let secret = SecretKey::from_slice(&i[..32]).map_err(|_| KeyError::InvalidSeed)?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);

        Ok(Self {
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: ChildNumber::from_u32(0),
            chain_code,
            key: KeyData::Private(secret),
        })
    }

    pub fn key_data(&self) -> &KeyData {
        &self.key
    }

    pub fn is_private(&self) -> bool {
        matches!(self.key, KeyData::Private(_))
    }

    /// The private scalar, if this node has one
    pub fn private_key(&self) -> Option<&SecretKey> {
        match &self.key {
            KeyData::Private(secret) => Some(secret),
            KeyData::Public(_) => None,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match &self.key {
            KeyData::Private(secret) => PublicKey::from_secret_key(SECP256K1, secret),
            KeyData::Public(public) => *public,
        }
    }

    /// First four bytes of HASH160 of the compressed public key
    pub fn fingerprint(&self) -> [u8; 4] {
        let digest = hash160(&self.public_key().serialize());
        let mut fp = [0u8; 4];
        fp.copy_from_slice(&digest[..4]);
        fp
    }

    /// Same node with the private key stripped
    pub fn to_public(&self) -> Self {
        Self {
            key: KeyData::Public(self.public_key()),
            ..self.clone()
        }
    }

    /// Derive one child.
    ///
    /// Hardened: `HMAC(chain, 0x00 ‖ k ‖ i)`; normal: `HMAC(chain, P ‖ i)`.
    /// The left half of the MAC is added to the parent key mod n.
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self, KeyError> {
        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| KeyError::InvalidPath("maximum depth exceeded".to_string()))?;
        let index = child.to_u32().to_be_bytes();

        let i = match (&self.key, child.is_hardened()) {
            (KeyData::Private(secret), true) => {
                let secret_bytes = Zeroizing::new(secret.secret_bytes());
                Zeroizing::new(hmac_sha512(
                    &self.chain_code,
                    &[&[0u8][..], &secret_bytes[..], &index[..]],
                ))
            }
            (KeyData::Public(_), true) => return Err(KeyError::HardenedFromPublic(child)),
            (_, false) => Zeroizing::new(hmac_sha512(
                &self.chain_code,
                &[&self.public_key().serialize()[..], &index[..]],
            )),
        };

        let mut tweak_bytes = Zeroizing::new([0u8; 32]);
        tweak_bytes.copy_from_slice(&i[..32]);
        let tweak =
            Scalar::from_be_bytes(*tweak_bytes).map_err(|_| KeyError::InvalidChildKey(child))?;

        let key = match &self.key {
            KeyData::Private(secret) => KeyData::Private(
                secret
                    .add_tweak(&tweak)
                    .map_err(|_| KeyError::InvalidChildKey(child))?,
            ),
            KeyData::Public(public) => KeyData::Public(
                public
                    .add_exp_tweak(SECP256K1, &tweak)
                    .map_err(|_| KeyError::InvalidChildKey(child))?,
            ),
        };

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);

        Ok(Self {
            depth,
            parent_fingerprint: self.fingerprint(),
            child_number: child,
            chain_code,
            key,
        })
    }

    /// Walk every step of `path` from this node
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, KeyError> {
        path.as_slice()
            .iter()
            .try_fold(self.clone(), |node, child| node.derive_child(*child))
    }

    fn serialize(&self, params: &ChainParams) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(SERIALIZED_LEN));
        let version = match self.key {
            KeyData::Private(_) => params.zprv_version,
            KeyData::Public(_) => params.zpub_version,
        };
        out.extend_from_slice(&version.to_be_bytes());
        out.push(self.depth);
        out.extend_from_slice(&self.parent_fingerprint);
        out.extend_from_slice(&self.child_number.to_u32().to_be_bytes());
        out.extend_from_slice(&self.chain_code);
        match &self.key {
            KeyData::Private(secret) => {
                out.push(0);
                out.extend_from_slice(&Zeroizing::new(secret.secret_bytes())[..]);
            }
            KeyData::Public(public) => out.extend_from_slice(&public.serialize()),
        }
        out
    }

    /// Base58Check form: zprv for private nodes, zpub for public ones
    pub fn to_base58(&self, params: &ChainParams) -> String {
        base58check_encode(&self.serialize(params))
    }

    /// Base58Check zpub form, for either kind of node
    pub fn to_public_base58(&self, params: &ChainParams) -> String {
        self.to_public().to_base58(params)
    }

    /// Parse a zprv or zpub string
    pub fn from_base58(s: &str, params: &ChainParams) -> Result<Self, KeyError> {
        let data = Zeroizing::new(
            base58check_decode(s).map_err(|e| KeyError::InvalidExtendedKey(e.to_string()))?,
        );
        if data.len() != SERIALIZED_LEN {
            return Err(KeyError::InvalidExtendedKey(format!(
                "expected {} bytes, got {}",
                SERIALIZED_LEN,
                data.len()
            )));
        }

        let version = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let depth = data[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let child_number =
            ChildNumber::from_u32(u32::from_be_bytes([data[9], data[10], data[11], data[12]]));
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);
        let key_bytes = &data[45..78];

        let key = if version == params.zprv_version {
            if key_bytes[0] != 0 {
                return Err(KeyError::InvalidExtendedKey(
                    "private key must be prefixed with 0x00".to_string(),
                ));
            }
            KeyData::Private(
                SecretKey::from_slice(&key_bytes[1..])
                    .map_err(|_| KeyError::InvalidExtendedKey("scalar out of range".to_string()))?,
            )
        } else if version == params.zpub_version {
            KeyData::Public(
                PublicKey::from_slice(key_bytes)
                    .map_err(|_| KeyError::InvalidExtendedKey("invalid curve point".to_string()))?,
            )
        } else {
            return Err(KeyError::InvalidExtendedKey(format!(
                "unknown version 0x{:08x}",
                version
            )));
        };

        if depth == 0 && (parent_fingerprint != [0u8; 4] || child_number.to_u32() != 0) {
            return Err(KeyError::InvalidExtendedKey(
                "master key with non-zero parent".to_string(),
            ));
        }

        Ok(Self {
            depth,
            parent_fingerprint,
            child_number,
            chain_code,
            key,
        })
    }
}

//! Receiving addresses on the external chain
//!
//! Each leaf `account/0/i` becomes a native segwit (P2WPKH) address:
//! bech32(hrp, v0, HASH160(compressed pubkey)).

use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::encoding::{encode_segwit_v0, EncodingError};
use crate::hashes::hash160;
use crate::keys::{ChildNumber, ExtendedKey, KeyError};
use crate::params::ChainParams;

/// External (receiving) chain index below the account node
pub const EXTERNAL_CHAIN: u32 = 0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// One derived address. `pubkey` and `privkey` are hex and are left out
/// of addresses-only exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AddressRecord {
    pub path: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privkey: Option<String>,
}

impl AddressRecord {
    /// Copy with key material removed
    pub fn without_keys(&self) -> Self {
        Self {
            path: self.path.clone(),
            address: self.address.clone(),
            pubkey: None,
            privkey: None,
        }
    }
}

/// P2WPKH address for a compressed public key
pub fn p2wpkh_address(public_key: &PublicKey, params: &ChainParams) -> Result<String, EncodingError> {
    encode_segwit_v0(params.hrp, &hash160(&public_key.serialize()))
}

/// Derive `count` addresses from an account node, index 0 first.
///
/// `base_path` is only used for the `path` labels (`{base_path}/0/{i}`).
/// A public account node yields records without `privkey`.
pub fn derive_addresses(
    account: &ExtendedKey,
    count: u32,
    base_path: &str,
    params: &ChainParams,
) -> Result<Vec<AddressRecord>, AddressError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let external = account.derive_child(ChildNumber::normal(EXTERNAL_CHAIN)?)?;

    (0..count)
        .map(|i| -> Result<AddressRecord, AddressError> {
            let leaf = external.derive_child(ChildNumber::normal(i)?)?;
            let public_key = leaf.public_key();
            Ok(AddressRecord {
                path: format!("{}/{}/{}", base_path, EXTERNAL_CHAIN, i),
                address: p2wpkh_address(&public_key, params)?,
                pubkey: Some(hex::encode(public_key.serialize())),
                privkey: leaf
                    .private_key()
                    .map(|secret| hex::encode(&Zeroizing::new(secret.secret_bytes())[..])),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::decode_segwit_address;

    fn account() -> ExtendedKey {
        ExtendedKey::new_master(&[0x42u8; 64])
            .unwrap()
            .derive_path(&ChainParams::PALLADIUM.bip84_path().unwrap())
            .unwrap()
    }

    #[test]
    fn test_zero_count_is_empty() {
        let addresses = derive_addresses(&account(), 0, "m/84h/746h/0h", &ChainParams::PALLADIUM).unwrap();
        assert!(addresses.is_empty());
    }

    #[test]
    fn test_paths_and_order() {
        let addresses = derive_addresses(&account(), 3, "m/84h/746h/0h", &ChainParams::PALLADIUM).unwrap();
        let paths: Vec<&str> = addresses.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(
            paths,
            ["m/84h/746h/0h/0/0", "m/84h/746h/0h/0/1", "m/84h/746h/0h/0/2"]
        );
    }

    #[test]
    fn test_addresses_deterministic_and_distinct() {
        let params = ChainParams::PALLADIUM;
        let first = derive_addresses(&account(), 5, "m/0h", &params).unwrap();
        let second = derive_addresses(&account(), 5, "m/0h", &params).unwrap();
        assert_eq!(first, second);

        for pair in first.windows(2) {
            assert_ne!(pair[0].address, pair[1].address);
            assert_ne!(pair[0].pubkey, pair[1].pubkey);
        }
    }

    #[test]
    fn test_address_commits_to_pubkey() {
        let params = ChainParams::PALLADIUM;
        let records = derive_addresses(&account(), 2, "m", &params).unwrap();
        for record in &records {
            assert!(record.address.starts_with("plm1q"));
            let (version, program) = decode_segwit_address(params.hrp, &record.address).unwrap();
            assert_eq!(version, 0);

            let pubkey = hex::decode(record.pubkey.as_ref().unwrap()).unwrap();
            assert_eq!(pubkey.len(), 33);
            assert_eq!(program, hash160(&pubkey).to_vec());
        }
    }

    #[test]
    fn test_leaf_key_matches_path_walk() {
        let params = ChainParams::PALLADIUM;
        let account = account();
        let records = derive_addresses(&account, 4, "m", &params).unwrap();

        let leaf = account.derive_path(&"m/0/3".parse().unwrap()).unwrap();
        assert_eq!(
            records[3].privkey.as_deref(),
            Some(hex::encode(leaf.private_key().unwrap().secret_bytes()).as_str())
        );
    }

    #[test]
    fn test_watch_only_account_has_no_privkeys() {
        let params = ChainParams::PALLADIUM;
        let full = derive_addresses(&account(), 3, "m", &params).unwrap();
        let watch = derive_addresses(&account().to_public(), 3, "m", &params).unwrap();

        for (f, w) in full.iter().zip(&watch) {
            assert_eq!(f.address, w.address);
            assert_eq!(f.pubkey, w.pubkey);
            assert!(w.privkey.is_none());
        }
    }

    #[test]
    fn test_without_keys_serialization() {
        let records = derive_addresses(&account(), 1, "m", &ChainParams::PALLADIUM).unwrap();
        let json = serde_json::to_value(records[0].without_keys()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("path"));
        assert!(obj.contains_key("address"));
    }
}

//! Network constants
//!
//! Version bytes and address prefixes are a compatibility contract with
//! the target network's reference wallets. Do not renumber them.

use crate::keys::{DerivationPath, KeyError};

/// Mnemonic lengths accepted by the generator
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Addresses derived per wallet unless the caller asks otherwise
pub const DEFAULT_ADDRESS_COUNT: u32 = 10;

/// Account path used by Electrum segwit wallets
pub const ELECTRUM_PATH: &str = "m/0h";

/// Per-network parameters for serialization and address encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    /// Display name
    pub name: &'static str,
    /// Bech32 human-readable part
    pub hrp: &'static str,
    /// SLIP-44 coin type used in the BIP-84 account path
    pub coin_type: u32,
    /// Version prefix for private extended keys (zprv)
    pub zprv_version: u32,
    /// Version prefix for public extended keys (zpub)
    pub zpub_version: u32,
}

impl ChainParams {
    /// Palladium mainnet
    pub const PALLADIUM: ChainParams = ChainParams {
        name: "palladium",
        hrp: "plm",
        coin_type: 746,
        zprv_version: 0x04B2_430C,
        zpub_version: 0x04B2_4746,
    };

    /// BIP-84 account path: m/84h/{coin_type}h/0h
    pub fn bip84_path(&self) -> Result<DerivationPath, KeyError> {
        DerivationPath::bip84(self.coin_type)
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::PALLADIUM
    }
}

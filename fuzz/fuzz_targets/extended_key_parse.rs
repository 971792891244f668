#![no_main]

use libfuzzer_sys::fuzz_target;
use plm_core::keys::ExtendedKey;
use plm_core::params::ChainParams;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Anything that parses must serialize back to the same string
    if let Ok(key) = ExtendedKey::from_base58(s, &ChainParams::PALLADIUM) {
        assert_eq!(key.to_base58(&ChainParams::PALLADIUM), s);
        let _ = key.to_public_base58(&ChainParams::PALLADIUM);
    }

    let _ = s.parse::<plm_core::keys::DerivationPath>();
});

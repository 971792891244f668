#![no_main]

use libfuzzer_sys::fuzz_target;
use plm_core::wallet::{is_encrypted_json, WalletFile};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let encrypted = is_encrypted_json(s);
    match WalletFile::from_json(s) {
        Ok(WalletFile::Encrypted(_)) => assert!(encrypted),
        Ok(WalletFile::Plain(record)) => {
            assert!(!encrypted);
            let _ = record.export_json(plm_core::ExportMode::AddressesOnly);
        }
        Err(_) => {}
    }
});

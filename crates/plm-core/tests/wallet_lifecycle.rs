//! End-to-end wallet lifecycle.
//!
//! 1. Generate (both standards, every length)
//! 2. Export and reload plaintext files
//! 3. Encrypt, write, read back and decrypt
//! 4. Restore from the mnemonic
//! 5. Watch-only derivation from the account zpub
//!
//! Run with: cargo test -p plm-core --test wallet_lifecycle

use std::fs;

use plm_core::address::derive_addresses;
use plm_core::keys::ExtendedKey;
use plm_core::params::{ChainParams, VALID_WORD_COUNTS};
use plm_core::wallet::{
    decrypt_wallet, encrypt_wallet, generate_wallet, generate_wallet_with, is_encrypted_json,
    restore_wallet, ExportMode, WalletFile, WalletOptions,
};
use plm_core::Standard;

// ============================================================================
// 1. Generation
// ============================================================================

#[test]
fn test_every_length_and_standard() {
    for standard in [Standard::Bip39, Standard::Electrum] {
        for words in VALID_WORD_COUNTS {
            let mut options = WalletOptions::default();
            options.word_count = words;
            options.standard = standard;
            options.address_count = 2;

            let record = generate_wallet_with(&options).unwrap();
            assert_eq!(record.mnemonic.split(' ').count(), words);
            assert_eq!(record.standard, standard);
            assert_eq!(record.addresses.len(), 2);
            assert_eq!(
                record.derivation_path,
                standard.derivation_path(&ChainParams::PALLADIUM).unwrap().to_string()
            );
        }
    }
}

#[test]
fn test_fresh_wallets_differ() {
    let a = generate_wallet(12, Standard::Bip39, "").unwrap();
    let b = generate_wallet(12, Standard::Bip39, "").unwrap();
    assert_ne!(a.mnemonic, b.mnemonic);
    assert_ne!(a.master_zprv, b.master_zprv);
    assert_ne!(a.addresses[0].address, b.addresses[0].address);
}

// ============================================================================
// 2. Plaintext files
// ============================================================================

#[test]
fn test_plaintext_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");

    let record = generate_wallet(18, Standard::Bip39, "").unwrap();
    fs::write(&path, record.export_json(ExportMode::Full).unwrap().as_bytes()).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(!is_encrypted_json(&contents));
    match WalletFile::from_json(&contents).unwrap() {
        WalletFile::Plain(loaded) => assert_eq!(loaded, record),
        WalletFile::Encrypted(_) => panic!("plaintext file classified as encrypted"),
    }
}

#[test]
fn test_addresses_only_file_keeps_wallet_keys() {
    let record = generate_wallet(12, Standard::Bip39, "").unwrap();
    let json = record.export_json(ExportMode::AddressesOnly).unwrap();

    let WalletFile::Plain(loaded) = WalletFile::from_json(&json).unwrap() else {
        panic!("expected a plaintext wallet");
    };
    assert_eq!(loaded.mnemonic, record.mnemonic);
    assert_eq!(loaded.zprv, record.zprv);
    for (loaded, original) in loaded.addresses.iter().zip(&record.addresses) {
        assert_eq!(loaded.address, original.address);
        assert!(loaded.pubkey.is_none());
        assert!(loaded.privkey.is_none());
    }
}

// ============================================================================
// 3. Encrypted files
// ============================================================================

#[test]
fn test_encrypted_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.enc.json");
    let password = "correct horse battery staple";

    let record = generate_wallet(24, Standard::Electrum, "").unwrap();
    let envelope = encrypt_wallet(&record, password).unwrap();
    fs::write(&path, serde_json::to_string_pretty(&envelope).unwrap()).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(is_encrypted_json(&contents));
    assert!(!contents.contains(&record.mnemonic));

    let WalletFile::Encrypted(loaded) = WalletFile::from_json(&contents).unwrap() else {
        panic!("expected an encrypted wallet");
    };
    assert_eq!(decrypt_wallet(&loaded, password).unwrap(), record);
}

// ============================================================================
// 4. Restore
// ============================================================================

#[test]
fn test_restore_reproduces_wallet() {
    for standard in [Standard::Bip39, Standard::Electrum] {
        let original = generate_wallet(12, standard, "my passphrase").unwrap();
        let restored = restore_wallet(
            &original.mnemonic,
            "my passphrase",
            standard,
            original.addresses.len() as u32,
            &ChainParams::PALLADIUM,
        )
        .unwrap();
        assert_eq!(restored, original);
    }
}

#[test]
fn test_restore_with_wrong_passphrase_is_another_wallet() {
    let original = generate_wallet(12, Standard::Bip39, "right").unwrap();
    let other = restore_wallet(&original.mnemonic, "wrong", Standard::Bip39, 1, &ChainParams::PALLADIUM)
        .unwrap();
    assert_eq!(other.mnemonic, original.mnemonic);
    assert_ne!(other.master_zpub, original.master_zpub);
}

// ============================================================================
// 5. Watch-only
// ============================================================================

#[test]
fn test_zpub_derives_same_addresses() {
    let params = ChainParams::PALLADIUM;
    let record = generate_wallet(12, Standard::Bip39, "").unwrap();

    let account = ExtendedKey::from_base58(&record.zpub, &params).unwrap();
    assert!(!account.is_private());

    let watch = derive_addresses(
        &account,
        record.addresses.len() as u32,
        &record.derivation_path,
        &params,
    )
    .unwrap();

    for (watched, full) in watch.iter().zip(&record.addresses) {
        assert_eq!(watched.path, full.path);
        assert_eq!(watched.address, full.address);
        assert_eq!(watched.pubkey, full.pubkey);
        assert!(watched.privkey.is_none());
    }
}

//! Command implementations: generate, restore, open, list, export-mnemonic, delete.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use plm_core::crypto::CryptoError;
use plm_core::password::MAX_DECRYPT_ATTEMPTS;
use plm_core::wallet::{
    decrypt_wallet, encrypt_wallet, generate_wallet_with, is_encrypted_json, restore_wallet,
    WalletError, WalletFile, WalletOptions, WalletRecord,
};
use plm_core::{ChainParams, Standard};
use zeroize::Zeroizing;

use crate::config::WalletConfig;
use crate::prompt::{passphrase_from_env, Prompter};

/// What to do with a freshly built wallet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// File name under the wallets directory; stdout when absent
    pub name: Option<String>,
    /// Write an encrypted envelope instead of plaintext
    pub encrypt: bool,
}

pub fn generate<R: BufRead>(
    config: &WalletConfig,
    save: &SaveOptions,
    prompter: &mut Prompter<R>,
) -> Result<()> {
    let mut options = WalletOptions::default();
    options.word_count = config.wallet.word_count;
    options.standard = config.standard()?;
    options.address_count = config.wallet.address_count;
    options.passphrase = passphrase_from_env().to_string();

    log::info!(
        "Generating {}-word {} wallet",
        options.word_count,
        options.standard
    );
    let record = generate_wallet_with(&options).context("Failed to generate wallet")?;
    emit(&record, config, save, prompter)
}

pub fn restore<R: BufRead>(
    config: &WalletConfig,
    save: &SaveOptions,
    prompter: &mut Prompter<R>,
) -> Result<()> {
    let standard = config.standard()?;
    let mnemonic = prompter.read_line("Mnemonic: ")?;
    let passphrase = passphrase_from_env();

    log::info!("Restoring {} wallet", standard);
    let record = restore_wallet(
        &mnemonic,
        &passphrase,
        standard,
        config.wallet.address_count,
        &ChainParams::PALLADIUM,
    )
    .context("Failed to restore wallet")?;
    emit(&record, config, save, prompter)
}

pub fn open<R: BufRead>(
    config: &WalletConfig,
    file: &Path,
    prompter: &mut Prompter<R>,
) -> Result<()> {
    let record = load_record(config, file, prompter)?;
    let json = record.export_json(config.export_mode()?)?;
    println!("{}", json.as_str());
    Ok(())
}

/// Write only the mnemonic of a wallet file to `{wallets_dir}/NAME.txt`
pub fn export_mnemonic<R: BufRead>(
    config: &WalletConfig,
    file: &Path,
    save: &SaveOptions,
    prompter: &mut Prompter<R>,
) -> Result<()> {
    let name = save
        .name
        .as_deref()
        .context("export-mnemonic needs --name <NAME>")?;
    anyhow::ensure!(!save.encrypt, "--encrypt does not apply to export-mnemonic");

    let record = load_record(config, file, prompter)?;
    anyhow::ensure!(!record.mnemonic.is_empty(), "Wallet has no mnemonic");

    let path = save_file(&config.storage.wallets_dir, name, "txt", &record.mnemonic)?;
    println!("Mnemonic exported to: {}", path.display());
    Ok(())
}

/// Remove a wallet file after a y/N confirmation, unless `assume_yes`
pub fn delete<R: BufRead>(
    config: &WalletConfig,
    file: &Path,
    assume_yes: bool,
    prompter: &mut Prompter<R>,
) -> Result<()> {
    let path = resolve_wallet_path(&config.storage.wallets_dir, file);
    anyhow::ensure!(path.is_file(), "No wallet file at {}", path.display());
    anyhow::ensure!(
        path.extension().and_then(|e| e.to_str()) == Some("json"),
        "Not a wallet file: {}",
        path.display()
    );

    let name = file_label(&path);
    if !assume_yes {
        let answer = prompter.read_line(&format!(
            "Delete '{}'? This cannot be undone [y/N]: ",
            name
        ))?;
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            println!("Kept {}", name);
            return Ok(());
        }
    }

    fs::remove_file(&path).with_context(|| format!("Failed to delete {}", path.display()))?;
    log::info!("deleted {}", path.display());
    println!("Deleted {}", name);
    Ok(())
}

pub fn list(config: &WalletConfig) -> Result<()> {
    let dir = &config.storage.wallets_dir;
    let entries = list_wallets(dir)?;
    if entries.is_empty() {
        println!("No wallets in {}", dir.display());
        return Ok(());
    }
    for (name, kind) in entries {
        println!("{:<40} {}", name, kind);
    }
    Ok(())
}

/// What `list` found in a wallet file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletKind {
    Encrypted,
    Plain { standard: Standard, addresses: usize },
    Unreadable,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypted => f.write_str("encrypted"),
            Self::Plain {
                standard,
                addresses,
            } => write!(f, "plain      {:<9} {} addresses", standard.label(), addresses),
            Self::Unreadable => f.write_str("unreadable"),
        }
    }
}

/// `*.json` files in `dir`, sorted by name
fn list_wallets(dir: &Path) -> Result<Vec<(String, WalletKind)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let kind = match fs::read_to_string(&path).map(Zeroizing::new) {
            Ok(contents) if is_encrypted_json(&contents) => WalletKind::Encrypted,
            Ok(contents) => match WalletFile::from_json(&contents) {
                Ok(WalletFile::Plain(record)) => WalletKind::Plain {
                    standard: record.standard,
                    addresses: record.addresses.len(),
                },
                Ok(WalletFile::Encrypted(_)) => WalletKind::Encrypted,
                Err(_) => WalletKind::Unreadable,
            },
            Err(_) => WalletKind::Unreadable,
        };
        entries.push((file_label(&path), kind));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Read a wallet file, unlocking it if it is encrypted
fn load_record<R: BufRead>(
    config: &WalletConfig,
    file: &Path,
    prompter: &mut Prompter<R>,
) -> Result<WalletRecord> {
    let path = resolve_wallet_path(&config.storage.wallets_dir, file);
    let contents = Zeroizing::new(
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read wallet file: {}", path.display()))?,
    );

    match WalletFile::from_json(&contents)
        .with_context(|| format!("Not a wallet file: {}", path.display()))?
    {
        WalletFile::Plain(record) => Ok(record),
        WalletFile::Encrypted(envelope) => unlock(&envelope, &file_label(&path), prompter),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn unlock<R: BufRead>(
    envelope: &plm_core::EncryptedEnvelope,
    name: &str,
    prompter: &mut Prompter<R>,
) -> Result<WalletRecord> {
    for attempt in 1..=MAX_DECRYPT_ATTEMPTS {
        let password = prompter.unlock_password(name)?;
        match decrypt_wallet(envelope, &password) {
            Ok(record) => return Ok(record),
            Err(WalletError::Crypto(CryptoError::InvalidPassword)) => {
                log::warn!("Failed unlock attempt {} for {}", attempt, name);
                eprintln!(
                    "❌ Invalid password ({}/{})",
                    attempt, MAX_DECRYPT_ATTEMPTS
                );
                if prompter.password_from_env() {
                    break;
                }
            }
            Err(e) => return Err(e).context("Failed to decrypt wallet"),
        }
    }
    bail!("Could not unlock {}", name)
}

fn emit<R: BufRead>(
    record: &WalletRecord,
    config: &WalletConfig,
    save: &SaveOptions,
    prompter: &mut Prompter<R>,
) -> Result<()> {
    let contents = if save.encrypt {
        let password = prompter.new_password()?;
        let envelope = encrypt_wallet(record, &password).context("Failed to encrypt wallet")?;
        Zeroizing::new(serde_json::to_string_pretty(&envelope)?)
    } else {
        record.export_json(config.export_mode()?)?
    };

    match &save.name {
        Some(name) => {
            let path = save_file(&config.storage.wallets_dir, name, "json", &contents)?;
            println!("Saved to: {}", path.display());
            print_summary(record);
        }
        None => println!("{}", contents.as_str()),
    }
    Ok(())
}

fn print_summary(record: &WalletRecord) {
    println!("  Standard:  {}", record.standard);
    println!("  Path:      {}", record.derivation_path);
    println!("  zpub:      {}", record.zpub);
    for address in &record.addresses {
        println!("  {:<22} {}", address.path, address.address);
    }
}

/// Bare names refer to the wallets directory; anything with a directory
/// component is taken as given.
fn resolve_wallet_path(wallets_dir: &Path, file: &Path) -> PathBuf {
    if file.exists() || file.components().count() > 1 {
        file.to_path_buf()
    } else {
        wallets_dir.join(file)
    }
}

/// Write `{dir}/{name}.{extension}` readable only by the owner.
/// Existing files are never overwritten.
fn save_file(dir: &Path, name: &str, extension: &str, contents: &str) -> Result<PathBuf> {
    anyhow::ensure!(
        !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..",
        "Invalid wallet name: {:?}",
        name
    );

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create wallets directory: {}", dir.display()))?;

    let suffix = format!(".{}", extension);
    let file_name = if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    };
    let path = dir.join(file_name);

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;

    log::debug!("wrote {}", path.display());
    Ok(path)
}

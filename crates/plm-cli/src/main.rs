//! PLM Wallet — offline HD wallet generator for Palladium
//!
//! Generates, restores, encrypts and opens wallet files built by `plm-core`.
//!
//! # Usage
//!
//! ```bash
//! plm-wallet generate --words 24 --standard electrum --name cold --encrypt
//! echo "abandon ... about" | plm-wallet restore
//! plm-wallet open cold.json
//! plm-wallet export-mnemonic cold.json --name cold-phrase
//! plm-wallet delete cold.json
//! plm-wallet --config plm-wallet.toml --validate
//! ```

mod commands;
mod config;
mod prompt;

use anyhow::{Context, Result};
use std::io;
use std::path::PathBuf;

use commands::SaveOptions;
use config::{CliOverrides, WalletConfig};
use prompt::Prompter;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Generate,
    Restore,
    Open(PathBuf),
    ExportMnemonic(PathBuf),
    Delete(PathBuf),
    List,
}

#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    validate_only: bool,
    command: Option<Command>,
    overrides: CliOverrides,
    save: SaveOptions,
    assume_yes: bool,
}

enum Parsed {
    Run(Args),
    Help,
    Version,
}

fn main() -> Result<()> {
    // Security hardening: keep seed material out of core dumps
    plm_core::memory::disable_core_dumps();

    let args = match parse_args(std::env::args().skip(1))? {
        Parsed::Run(args) => args,
        Parsed::Help => {
            print_help();
            return Ok(());
        }
        Parsed::Version => {
            println!("plm-wallet {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
    };

    // Load config
    let mut config = WalletConfig::load(args.config_path.as_deref())
        .context("Failed to load configuration")?;

    // Apply env, then CLI overrides
    config.apply_env_overrides();
    config.apply_cli_overrides(&args.overrides);

    // Validate
    config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    env_logger::Builder::new()
        .parse_filters(&config.storage.log_level)
        .init();

    if args.validate_only {
        println!("✅ Configuration is valid.");
        println!("  Word count:    {}", config.wallet.word_count);
        println!("  Standard:      {}", config.standard()?);
        println!("  Addresses:     {}", config.wallet.address_count);
        println!("  Export mode:   {}", config.wallet.export_mode);
        println!("  Wallets dir:   {}", config.storage.wallets_dir.display());
        println!("  Log level:     {}", config.storage.log_level);
        return Ok(());
    }

    let stdin = io::stdin();
    let mut prompter = Prompter::from_env(stdin.lock());

    match args.command {
        Some(Command::Generate) => commands::generate(&config, &args.save, &mut prompter),
        Some(Command::Restore) => commands::restore(&config, &args.save, &mut prompter),
        Some(Command::Open(file)) => commands::open(&config, &file, &mut prompter),
        Some(Command::ExportMnemonic(file)) => {
            commands::export_mnemonic(&config, &file, &args.save, &mut prompter)
        }
        Some(Command::Delete(file)) => {
            commands::delete(&config, &file, args.assume_yes, &mut prompter)
        }
        Some(Command::List) => commands::list(&config),
        None => {
            print_help();
            anyhow::bail!("No command given")
        }
    }
}

fn parse_args<I>(args: I) -> Result<Parsed>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{} requires a value", flag))
        };

        match arg.as_str() {
            "--config" | "-c" => parsed.config_path = Some(PathBuf::from(value("--config")?)),
            "--words" | "-w" => {
                let words = value("--words")?;
                parsed.overrides.word_count = Some(
                    words
                        .parse()
                        .with_context(|| format!("Invalid word count: {}", words))?,
                );
            }
            "--standard" | "-s" => parsed.overrides.standard = Some(value("--standard")?),
            "--addresses" | "-n" => {
                let count = value("--addresses")?;
                parsed.overrides.address_count = Some(
                    count
                        .parse()
                        .with_context(|| format!("Invalid address count: {}", count))?,
                );
            }
            "--export" => parsed.overrides.export_mode = Some(value("--export")?),
            "--wallets-dir" => {
                parsed.overrides.wallets_dir = Some(PathBuf::from(value("--wallets-dir")?))
            }
            "--name" | "-o" => parsed.save.name = Some(value("--name")?),
            "--encrypt" | "-e" => parsed.save.encrypt = true,
            "--yes" | "-y" => parsed.assume_yes = true,
            "--validate" => parsed.validate_only = true,
            "--help" | "-h" => return Ok(Parsed::Help),
            "--version" | "-V" => return Ok(Parsed::Version),
            "generate" if parsed.command.is_none() => parsed.command = Some(Command::Generate),
            "restore" if parsed.command.is_none() => parsed.command = Some(Command::Restore),
            "list" if parsed.command.is_none() => parsed.command = Some(Command::List),
            "open" if parsed.command.is_none() => {
                parsed.command = Some(Command::Open(PathBuf::from(value("open")?)))
            }
            "export-mnemonic" if parsed.command.is_none() => {
                parsed.command = Some(Command::ExportMnemonic(PathBuf::from(
                    value("export-mnemonic")?,
                )))
            }
            "delete" if parsed.command.is_none() => {
                parsed.command = Some(Command::Delete(PathBuf::from(value("delete")?)))
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(Parsed::Run(parsed))
}

fn print_help() {
    println!(
        r#"PLM Wallet — offline HD wallet generator for Palladium

USAGE:
    plm-wallet [OPTIONS] <COMMAND>

COMMANDS:
    generate              Generate a new wallet
    restore               Rebuild a wallet from a mnemonic read on stdin
    open <FILE>           Open a wallet file (asks for the password if encrypted)
    export-mnemonic <FILE>
                          Write only the wallet's mnemonic to <wallets-dir>/<NAME>.txt
    delete <FILE>         Delete a wallet file after confirmation
    list                  List wallet files with their standard and address count

OPTIONS:
    -c, --config <PATH>   Config file path (default: ./plm-wallet.toml if present)
    -w, --words <N>       Mnemonic length: 12, 15, 18, 21 or 24
    -s, --standard <STD>  bip39 or electrum
    -n, --addresses <N>   Number of receiving addresses to derive
    --export <MODE>       full or addresses_only
    --wallets-dir <PATH>  Directory wallet files are saved to
    -o, --name <NAME>     Save under the wallets directory instead of printing
    -e, --encrypt         Encrypt the saved wallet with a password
    -y, --yes             Delete without asking for confirmation
    --validate            Validate configuration and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    PLM_WORD_COUNT          Mnemonic length
    PLM_STANDARD            Mnemonic standard
    PLM_ADDRESS_COUNT       Number of addresses
    PLM_WALLETS_DIR         Wallets directory
    PLM_LOG_LEVEL           Log level (error/warn/info/debug/trace)
    PLM_WALLET_PASSWORD     Encryption password (skips the prompt)
    PLM_WALLET_PASSPHRASE   Optional mnemonic passphrase

EXAMPLES:
    # Print a new 12-word BIP39 wallet
    plm-wallet generate

    # Encrypted 24-word Electrum wallet saved to wallets/cold.json
    plm-wallet generate -w 24 -s electrum -o cold -e

    # Restore and print only addresses
    plm-wallet restore --export addresses_only < mnemonic.txt

    # Back up just the phrase of wallets/cold.json to wallets/cold-phrase.txt
    plm-wallet export-mnemonic cold.json -o cold-phrase
"#
    );
}

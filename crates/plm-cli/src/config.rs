//! Wallet tool configuration, parsed from TOML file + environment variable overrides.
//!
//! Priority: command-line flags > environment variables > config file > defaults.

use anyhow::{Context, Result};
use plm_core::params::VALID_WORD_COUNTS;
use plm_core::{ExportMode, Standard};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "plm-wallet.toml";

/// Upper bound on derived addresses per wallet
pub const MAX_ADDRESS_COUNT: u32 = 1000;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Wallet generation defaults
    #[serde(default)]
    pub wallet: WalletSection,

    /// Files and logging
    #[serde(default)]
    pub storage: StorageSection,
}

/// Wallet generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSection {
    /// Mnemonic length: 12, 15, 18, 21 or 24
    #[serde(default = "default_word_count")]
    pub word_count: usize,

    /// Mnemonic standard: "bip39" or "electrum"
    #[serde(default = "default_standard")]
    pub standard: String,

    /// Receiving addresses derived per wallet
    #[serde(default = "default_address_count")]
    pub address_count: u32,

    /// "full" or "addresses_only"
    #[serde(default = "default_export_mode")]
    pub export_mode: String,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            word_count: default_word_count(),
            standard: default_standard(),
            address_count: default_address_count(),
            export_mode: default_export_mode(),
        }
    }
}

/// Files and logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory wallet files are saved to and listed from
    #[serde(default = "default_wallets_dir")]
    pub wallets_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            wallets_dir: default_wallets_dir(),
            log_level: default_log_level(),
        }
    }
}

fn default_word_count() -> usize {
    12
}

fn default_standard() -> String {
    "bip39".to_string()
}

fn default_address_count() -> u32 {
    plm_core::DEFAULT_ADDRESS_COUNT
}

fn default_export_mode() -> String {
    "full".to_string()
}

fn default_wallets_dir() -> PathBuf {
    PathBuf::from("wallets")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub word_count: Option<usize>,
    pub standard: Option<String>,
    pub address_count: Option<u32>,
    pub export_mode: Option<String>,
    pub wallets_dir: Option<PathBuf>,
}

// ============================================================================
// Loading & overrides
// ============================================================================

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: WalletConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Load an explicitly requested file, or the default file if present,
    /// or fall back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `PLM_WORD_COUNT`
    /// - `PLM_STANDARD`
    /// - `PLM_ADDRESS_COUNT`
    /// - `PLM_WALLETS_DIR`
    /// - `PLM_LOG_LEVEL`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("PLM_WORD_COUNT") {
            if let Ok(words) = v.parse::<usize>() {
                self.wallet.word_count = words;
            }
        }
        if let Some(v) = var("PLM_STANDARD") {
            self.wallet.standard = v;
        }
        if let Some(v) = var("PLM_ADDRESS_COUNT") {
            if let Ok(count) = v.parse::<u32>() {
                self.wallet.address_count = count;
            }
        }
        if let Some(v) = var("PLM_WALLETS_DIR") {
            self.storage.wallets_dir = PathBuf::from(v);
        }
        if let Some(v) = var("PLM_LOG_LEVEL") {
            self.storage.log_level = v;
        }
    }

    /// Apply command-line flags (highest priority).
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(words) = cli.word_count {
            self.wallet.word_count = words;
        }
        if let Some(ref standard) = cli.standard {
            self.wallet.standard = standard.clone();
        }
        if let Some(count) = cli.address_count {
            self.wallet.address_count = count;
        }
        if let Some(ref mode) = cli.export_mode {
            self.wallet.export_mode = mode.clone();
        }
        if let Some(ref dir) = cli.wallets_dir {
            self.storage.wallets_dir = dir.clone();
        }
    }

    /// Parsed mnemonic standard
    pub fn standard(&self) -> Result<Standard> {
        self.wallet
            .standard
            .parse::<Standard>()
            .map_err(|e| anyhow::anyhow!("wallet.standard: {}", e))
    }

    /// Parsed export mode
    pub fn export_mode(&self) -> Result<ExportMode> {
        self.wallet
            .export_mode
            .parse::<ExportMode>()
            .map_err(|e| anyhow::anyhow!("wallet.export_mode: {}", e))
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            VALID_WORD_COUNTS.contains(&self.wallet.word_count),
            "wallet.word_count must be one of {:?}, got {}",
            VALID_WORD_COUNTS,
            self.wallet.word_count
        );

        self.standard()?;
        self.export_mode()?;

        anyhow::ensure!(
            self.wallet.address_count <= MAX_ADDRESS_COUNT,
            "wallet.address_count must be <= {}",
            MAX_ADDRESS_COUNT
        );

        anyhow::ensure!(
            !self.storage.wallets_dir.as_os_str().is_empty(),
            "storage.wallets_dir must not be empty"
        );

        anyhow::ensure!(
            matches!(
                self.storage.log_level.to_ascii_lowercase().as_str(),
                "error" | "warn" | "info" | "debug" | "trace" | "off"
            ),
            "storage.log_level must be one of error/warn/info/debug/trace/off"
        );

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Secret input: passwords, passphrases and mnemonics.
//!
//! Passwords come from `PLM_WALLET_PASSWORD` when set, otherwise from
//! stdin one line at a time. Prompts go to stderr so stdout stays clean
//! for wallet JSON.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use plm_core::password::{validate_new_password, validate_unlock_password, PasswordStrength};
use zeroize::Zeroizing;

/// Encryption password for non-interactive use
pub const PASSWORD_ENV: &str = "PLM_WALLET_PASSWORD";

/// Optional BIP-39 / Electrum passphrase
pub const PASSPHRASE_ENV: &str = "PLM_WALLET_PASSPHRASE";

pub struct Prompter<R> {
    lines: io::Lines<R>,
    env_password: Option<Zeroizing<String>>,
}

impl<R: BufRead> Prompter<R> {
    pub fn new(reader: R, env_password: Option<String>) -> Self {
        Self {
            lines: reader.lines(),
            env_password: env_password.map(Zeroizing::new),
        }
    }

    /// Reader plus `PLM_WALLET_PASSWORD`, if set
    pub fn from_env(reader: R) -> Self {
        Self::new(reader, std::env::var(PASSWORD_ENV).ok())
    }

    /// Whether passwords come from the environment rather than the reader
    pub fn password_from_env(&self) -> bool {
        self.env_password.is_some()
    }

    /// Read one line, without its line terminator
    pub fn read_line(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        eprint!("{}", prompt);
        io::stderr().flush().ok();
        match self.lines.next() {
            Some(line) => {
                let line = Zeroizing::new(line.context("Failed to read input")?);
                Ok(Zeroizing::new(line.trim_end_matches('\r').to_string()))
            }
            None => bail!("Unexpected end of input"),
        }
    }

    /// Password for a new encrypted file: typed twice, at least 8 characters
    pub fn new_password(&mut self) -> Result<Zeroizing<String>> {
        let (password, confirmation) = match &self.env_password {
            Some(pw) => (pw.clone(), pw.clone()),
            None => {
                let password = self.read_line("New wallet password: ")?;
                let confirmation = self.read_line("Confirm password: ")?;
                (password, confirmation)
            }
        };

        let analysis = validate_new_password(&password, &confirmation)?;
        if analysis.strength < PasswordStrength::Strong {
            log::warn!("password strength: {}", analysis.strength.label());
            for warning in &analysis.warnings {
                eprintln!("⚠️  {}", warning);
            }
        }
        Ok(password)
    }

    /// Password to unlock an existing file
    pub fn unlock_password(&mut self, file_name: &str) -> Result<Zeroizing<String>> {
        let password = match &self.env_password {
            Some(pw) => pw.clone(),
            None => self.read_line(&format!("Password for {}: ", file_name))?,
        };
        validate_unlock_password(&password)?;
        Ok(password)
    }
}

/// Passphrase from `PLM_WALLET_PASSPHRASE`, empty if unset
pub fn passphrase_from_env() -> Zeroizing<String> {
    Zeroizing::new(std::env::var(PASSPHRASE_ENV).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), None)
    }

    #[test]
    fn test_read_line_strips_terminators() {
        let mut p = prompter("first line\r\nsecond\n");
        assert_eq!(p.read_line("").unwrap().as_str(), "first line");
        assert_eq!(p.read_line("").unwrap().as_str(), "second");
        assert!(p.read_line("").is_err());
    }

    #[test]
    fn test_new_password_confirmed() {
        let mut p = prompter("long enough pw\nlong enough pw\n");
        assert_eq!(p.new_password().unwrap().as_str(), "long enough pw");
    }

    #[test]
    fn test_new_password_mismatch() {
        let mut p = prompter("long enough pw\nlong enough px\n");
        let err = p.new_password().unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn test_new_password_too_short() {
        let mut p = prompter("short\nshort\n");
        assert!(p.new_password().is_err());
    }

    #[test]
    fn test_env_password_skips_reader() {
        let mut p = Prompter::new(Cursor::new(Vec::new()), Some("from the environment".to_string()));
        assert!(p.password_from_env());
        assert_eq!(p.new_password().unwrap().as_str(), "from the environment");
        assert_eq!(
            p.unlock_password("w.json").unwrap().as_str(),
            "from the environment"
        );
    }

    #[test]
    fn test_unlock_rejects_empty() {
        let mut p = prompter("\n");
        assert!(p.unlock_password("w.json").is_err());
    }
}

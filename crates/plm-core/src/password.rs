//! Password policy for wallet encryption
//!
//! New passwords must be at least [`MIN_PASSWORD_LEN`] characters and
//! typed twice. Unlock passwords only need to be non-empty. Strength
//! estimation is advisory: it produces warnings, never a rejection.

use std::collections::HashSet;

use thiserror::Error;

/// Minimum length (in characters) of a new encryption password
pub const MIN_PASSWORD_LEN: usize = 8;

/// Interactive unlock attempts before a front end gives up
pub const MAX_DECRYPT_ATTEMPTS: u32 = 3;

/// Entropy at or above which a password is reported as strong
pub const RECOMMENDED_ENTROPY_BITS: f64 = 60.0;

/// Substrings that make a password trivially guessable
const COMMON_FRAGMENTS: &[&str] = &[
    "password", "123456", "qwerty", "letmein", "iloveyou", "admin", "welcome", "monkey",
    "dragon", "abc123", "bitcoin", "palladium", "wallet", "satoshi", "crypto", "seed",
];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password is empty")]
    Empty,
    #[error("Password too short (minimum {} characters)", MIN_PASSWORD_LEN)]
    TooShort,
    #[error("Passwords do not match")]
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    VeryWeak,
    Weak,
    Fair,
    Strong,
}

impl PasswordStrength {
    fn from_bits(bits: f64) -> Self {
        match bits {
            b if b < 28.0 => Self::VeryWeak,
            b if b < 40.0 => Self::Weak,
            b if b < RECOMMENDED_ENTROPY_BITS => Self::Fair,
            _ => Self::Strong,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryWeak => "very weak",
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Strong => "strong",
        }
    }
}

/// Result of [`estimate_entropy`]
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordAnalysis {
    pub entropy_bits: f64,
    pub strength: PasswordStrength,
    pub warnings: Vec<String>,
}

impl PasswordAnalysis {
    pub fn is_recommended(&self) -> bool {
        self.strength == PasswordStrength::Strong
    }
}

/// Check a new encryption password and its confirmation
pub fn validate_new_password(
    password: &str,
    confirmation: &str,
) -> Result<PasswordAnalysis, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    if password != confirmation {
        return Err(PasswordError::Mismatch);
    }
    Ok(estimate_entropy(password))
}

/// Check a password offered to unlock an existing wallet
pub fn validate_unlock_password(password: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        Err(PasswordError::Empty)
    } else {
        Ok(())
    }
}

/// Rough entropy estimate from character classes, with penalties for
/// repetition, runs and well-known fragments.
pub fn estimate_entropy(password: &str) -> PasswordAnalysis {
    let mut warnings = Vec::new();
    let chars: Vec<char> = password.chars().collect();
    if chars.is_empty() {
        return PasswordAnalysis {
            entropy_bits: 0.0,
            strength: PasswordStrength::VeryWeak,
            warnings: vec!["Password is empty".to_string()],
        };
    }

    let pool: f64 = [
        (chars.iter().any(|c| c.is_ascii_lowercase()), 26.0),
        (chars.iter().any(|c| c.is_ascii_uppercase()), 26.0),
        (chars.iter().any(|c| c.is_ascii_digit()), 10.0),
        (chars.iter().any(|c| c.is_ascii_punctuation() || *c == ' '), 33.0),
        (chars.iter().any(|c| !c.is_ascii()), 100.0),
    ]
    .iter()
    .filter(|(present, _)| *present)
    .map(|(_, size)| size)
    .sum();

    let len = chars.len() as f64;
    let mut bits = len * pool.max(2.0).log2();

    let distinct = chars.iter().collect::<HashSet<_>>().len() as f64;
    if distinct / len < 0.5 {
        bits *= distinct / len + 0.25;
        warnings.push("Many repeated characters".to_string());
    }

    let runs = chars
        .windows(3)
        .filter(|w| {
            let (a, b, c) = (w[0] as i64, w[1] as i64, w[2] as i64);
            (b - a == 1 && c - b == 1) || (a - b == 1 && b - c == 1)
        })
        .count();
    if runs > 1 {
        bits -= runs as f64 * 3.0;
        warnings.push("Contains sequences like 'abc' or '321'".to_string());
    }

    let lower = password.to_lowercase();
    if COMMON_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        bits /= 2.0;
        warnings.push("Contains a common word or pattern".to_string());
    }

    if chars.len() < MIN_PASSWORD_LEN {
        warnings.push(format!("Shorter than {} characters", MIN_PASSWORD_LEN));
    }

    let entropy_bits = bits.max(0.0);
    let strength = PasswordStrength::from_bits(entropy_bits);
    if strength < PasswordStrength::Strong {
        warnings.push(format!(
            "Estimated {:.0} bits; {:.0}+ recommended for wallet encryption",
            entropy_bits, RECOMMENDED_ENTROPY_BITS
        ));
    }

    PasswordAnalysis {
        entropy_bits,
        strength,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_password_rules() {
        assert_eq!(validate_new_password("", ""), Err(PasswordError::Empty));
        assert_eq!(validate_new_password("short", "short"), Err(PasswordError::TooShort));
        assert_eq!(
            validate_new_password("longenough", "longenougH"),
            Err(PasswordError::Mismatch)
        );
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 4 characters, 8 bytes
        assert_eq!(validate_new_password("ääää", "ääää"), Err(PasswordError::TooShort));
        assert!(validate_new_password("ääääääää", "ääääääää").is_ok());
    }

    #[test]
    fn test_weak_password_still_accepted() {
        let analysis = validate_new_password("password1", "password1").unwrap();
        assert!(!analysis.is_recommended());
        assert!(analysis.warnings.iter().any(|w| w.contains("common")));
    }

    #[test]
    fn test_unlock_password_only_needs_content() {
        assert_eq!(validate_unlock_password(""), Err(PasswordError::Empty));
        assert!(validate_unlock_password("x").is_ok());
    }

    #[test]
    fn test_empty_estimate() {
        let analysis = estimate_entropy("");
        assert_eq!(analysis.entropy_bits, 0.0);
        assert_eq!(analysis.strength, PasswordStrength::VeryWeak);
    }

    #[test]
    fn test_passphrase_is_strong() {
        let analysis = estimate_entropy("correct horse battery staple");
        assert!(analysis.is_recommended(), "{:?}", analysis);
    }

    #[test]
    fn test_repetition_and_runs_penalized() {
        let repeated = estimate_entropy("aaaaaaaaaaaa");
        let varied = estimate_entropy("qxmtpjwrkzvb");
        assert!(repeated.entropy_bits < varied.entropy_bits);

        let run = estimate_entropy("abcdefgh");
        assert!(run.warnings.iter().any(|w| w.contains("sequences")));
        assert!(run.strength <= PasswordStrength::Weak);
    }

    #[test]
    fn test_digits_only_is_weak() {
        assert!(estimate_entropy("12345678").strength <= PasswordStrength::Weak);
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(PasswordStrength::from_bits(10.0), PasswordStrength::VeryWeak);
        assert_eq!(PasswordStrength::from_bits(30.0), PasswordStrength::Weak);
        assert_eq!(PasswordStrength::from_bits(50.0), PasswordStrength::Fair);
        assert_eq!(PasswordStrength::from_bits(60.0), PasswordStrength::Strong);
        assert_eq!(PasswordStrength::Fair.label(), "fair");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PasswordError::TooShort.to_string(),
            "Password too short (minimum 8 characters)"
        );
    }
}

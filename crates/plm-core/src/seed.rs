//! Mnemonic generation and seed derivation
//!
//! Two incompatible standards are supported:
//!
//! - **BIP-39**: entropy plus a SHA-256 checksum, split into 11-bit words.
//!   Seed = PBKDF2-HMAC-SHA512(mnemonic, "mnemonic" + passphrase, 2048).
//! - **Electrum (segwit)**: entropy is mapped to words without a checksum and
//!   the phrase is accepted only if `HMAC-SHA512("Seed version", phrase)`
//!   starts with the hex prefix `100`. Generation is a rejection loop with
//!   expected ~4096 attempts. Seed = PBKDF2-HMAC-SHA512(normalized mnemonic,
//!   "electrum" + normalized passphrase, 2048).
//!
//! The Electrum loop has no iteration cap. Non-termination has negligible
//! probability; callers that need to abort use [`generate_electrum_with`].

use std::fmt;
use std::str::FromStr;

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::hashes::{hmac_sha512, pbkdf2_sha512, sha256};
use crate::keys::{DerivationPath, KeyError};
use crate::memory::LockedBuffer;
use crate::params::{ChainParams, VALID_WORD_COUNTS};
use crate::text::normalize_text;

/// PBKDF2 rounds for mnemonic stretching (both standards)
pub const SEED_ITERATIONS: u32 = 2048;

/// Length of a derived seed in bytes
pub const SEED_LEN: usize = 64;

/// HMAC key used by Electrum to tag the seed version
const ELECTRUM_VERSION_KEY: &[u8] = b"Seed version";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("Invalid word count {0}: must be one of 12, 15, 18, 21, 24")]
    InvalidWordCount(usize),
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Mnemonic search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
}

/// Mnemonic standard, which also selects the account derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Standard {
    #[serde(rename = "BIP39")]
    Bip39,
    #[serde(rename = "Electrum")]
    Electrum,
}

impl Standard {
    /// Label stored in exported wallet files
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bip39 => "BIP39",
            Self::Electrum => "Electrum",
        }
    }

    /// Account path for this standard
    pub fn derivation_path(&self, params: &ChainParams) -> Result<DerivationPath, KeyError> {
        match self {
            Self::Bip39 => params.bip84_path(),
            Self::Electrum => Ok(DerivationPath::electrum()),
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Standard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bip39" => Ok(Self::Bip39),
            "electrum" => Ok(Self::Electrum),
            other => Err(format!("unknown mnemonic standard '{}'", other)),
        }
    }
}

/// Supported mnemonic lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    Words12,
    Words15,
    Words18,
    Words21,
    Words24,
}

impl WordCount {
    pub fn words(&self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words15 => 15,
            Self::Words18 => 18,
            Self::Words21 => 21,
            Self::Words24 => 24,
        }
    }

    /// 128, 160, 192, 224 or 256
    pub fn entropy_bits(&self) -> usize {
        self.words() * 32 / 3
    }

    pub fn entropy_bytes(&self) -> usize {
        self.entropy_bits() / 8
    }
}

impl TryFrom<usize> for WordCount {
    type Error = SeedError;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        match count {
            12 => Ok(Self::Words12),
            15 => Ok(Self::Words15),
            18 => Ok(Self::Words18),
            21 => Ok(Self::Words21),
            24 => Ok(Self::Words24),
            other => Err(SeedError::InvalidWordCount(other)),
        }
    }
}

/// 64-byte seed held in locked memory and wiped on drop.
pub struct Seed(LockedBuffer);

impl Seed {
    fn zeroed() -> Self {
        Self(LockedBuffer::new(SEED_LEN))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed([redacted])")
    }
}

/// The English BIP-39 word list
pub fn wordlist() -> &'static [&'static str; 2048] {
    Language::English.word_list()
}

/// Generate a new mnemonic phrase.
///
/// The word count is checked before any randomness is drawn.
pub fn generate_mnemonic(word_count: usize, standard: Standard) -> Result<String, SeedError> {
    let word_count = WordCount::try_from(word_count)?;
    match standard {
        Standard::Bip39 => generate_bip39(word_count),
        Standard::Electrum => generate_electrum(word_count),
    }
}

/// Draw fresh entropy from the OS CSPRNG
fn random_entropy(word_count: WordCount) -> Zeroizing<Vec<u8>> {
    let mut entropy = Zeroizing::new(vec![0u8; word_count.entropy_bytes()]);
    OsRng.fill_bytes(&mut entropy);
    entropy
}

/// Generate a BIP-39 mnemonic
pub fn generate_bip39(word_count: WordCount) -> Result<String, SeedError> {
    let entropy = random_entropy(word_count);
    entropy_to_mnemonic(&entropy)
}

/// Encode entropy (16–32 bytes, multiple of 4) as a BIP-39 phrase
pub fn entropy_to_mnemonic(entropy: &[u8]) -> Result<String, SeedError> {
    Mnemonic::from_entropy_in(Language::English, entropy)
        .map(|m| m.to_string())
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))
}

/// Recover the entropy behind a BIP-39 phrase, verifying its checksum
pub fn mnemonic_to_entropy(phrase: &str) -> Result<Zeroizing<Vec<u8>>, SeedError> {
    let mnemonic = Mnemonic::parse_in(Language::English, phrase)
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_entropy()))
}

/// Generate an Electrum segwit mnemonic with no way to abort
pub fn generate_electrum(word_count: WordCount) -> Result<String, SeedError> {
    generate_electrum_with(word_count, |_| true)
}

/// Generate an Electrum segwit mnemonic.
///
/// `should_continue` is called with the number of attempts made so far
/// before each new attempt; returning `false` stops the search with
/// [`SeedError::Cancelled`].
pub fn generate_electrum_with<F>(word_count: WordCount, mut should_continue: F) -> Result<String, SeedError>
where
    F: FnMut(u64) -> bool,
{
    let mut attempts: u64 = 0;
    loop {
        if !should_continue(attempts) {
            return Err(SeedError::Cancelled { attempts });
        }
        attempts += 1;

        let entropy = random_entropy(word_count);
        let candidate = electrum_candidate(&entropy, word_count);
        if is_electrum_segwit_seed(&candidate) {
            log::debug!("electrum seed accepted after {} attempts", attempts);
            return Ok(candidate.to_string());
        }
    }
}

/// Map entropy to an Electrum candidate phrase.
///
/// The 256-bit integer `(entropy << (256 - bits)) | (sha256(entropy) >> bits)`
/// is sliced into 11-bit groups, most significant group first, keeping the
/// lowest `11 * word_count` bits.
pub fn electrum_candidate(entropy: &[u8], word_count: WordCount) -> Zeroizing<String> {
    let hash = sha256(entropy);

    // Entropy is byte-aligned, so the shift-and-or is a concatenation
    let mut combined = Zeroizing::new([0u8; 32]);
    let split = entropy.len().min(32);
    combined[..split].copy_from_slice(&entropy[..split]);
    combined[split..].copy_from_slice(&hash[..32 - split]);

    let words = wordlist();
    let count = word_count.words();
    let phrase = (0..count)
        .map(|i| words[bits_at(&combined, 11 * (count - 1 - i))])
        .collect::<Vec<_>>()
        .join(" ");
    Zeroizing::new(phrase)
}

/// Read 11 bits starting at bit `shift` (counted from the least significant
/// bit) of a big-endian 256-bit integer. Bits above 255 read as zero.
fn bits_at(value: &[u8; 32], shift: usize) -> usize {
    let mut index = 0usize;
    for offset in (0..11).rev() {
        let pos = shift + offset;
        let bit = if pos >= 256 {
            0
        } else {
            (value[31 - pos / 8] >> (pos % 8)) & 1
        };
        index = (index << 1) | bit as usize;
    }
    index
}

/// Whether `phrase` carries Electrum's native segwit version prefix `100`
pub fn is_electrum_segwit_seed(phrase: &str) -> bool {
    let normalized = Zeroizing::new(normalize_text(phrase));
    let mac = hmac_sha512(ELECTRUM_VERSION_KEY, &[normalized.as_bytes()]);
    mac[0] == 0x10 && mac[1] & 0xF0 == 0
}

/// Parse an existing phrase under `standard` and return its canonical form.
///
/// BIP-39 phrases must pass the word list and checksum; the result is the
/// words joined by single spaces. Electrum phrases must carry the segwit
/// version prefix; the result is the normalized phrase.
pub fn parse_mnemonic(phrase: &str, standard: Standard) -> Result<Zeroizing<String>, SeedError> {
    match standard {
        Standard::Bip39 => {
            let mnemonic = Mnemonic::parse_in(Language::English, phrase)
                .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))?;
            Ok(Zeroizing::new(mnemonic.to_string()))
        }
        Standard::Electrum => {
            if !is_electrum_segwit_seed(phrase) {
                return Err(SeedError::InvalidMnemonic(
                    "not an Electrum segwit seed".to_string(),
                ));
            }
            Ok(Zeroizing::new(normalize_text(phrase)))
        }
    }
}

/// Check that an existing phrase is valid under `standard`
pub fn validate_mnemonic(phrase: &str, standard: Standard) -> Result<(), SeedError> {
    parse_mnemonic(phrase, standard).map(|_| ())
}

/// Stretch a mnemonic and passphrase into a 64-byte seed.
///
/// BIP-39 hashes the phrase exactly as given. Electrum normalizes both the
/// phrase and the passphrase first. Keep this asymmetry; each ecosystem's
/// reference wallets depend on it.
pub fn mnemonic_to_seed(mnemonic: &str, passphrase: &str, standard: Standard) -> Seed {
    let mut seed = Seed::zeroed();
    match standard {
        Standard::Bip39 => {
            let salt = Zeroizing::new(format!("mnemonic{}", passphrase));
            pbkdf2_sha512(
                mnemonic.as_bytes(),
                salt.as_bytes(),
                SEED_ITERATIONS,
                seed.0.as_mut_slice(),
            );
        }
        Standard::Electrum => {
            let phrase = Zeroizing::new(normalize_text(mnemonic));
            let salt = Zeroizing::new(format!("electrum{}", normalize_text(passphrase)));
            pbkdf2_sha512(
                phrase.as_bytes(),
                salt.as_bytes(),
                SEED_ITERATIONS,
                seed.0.as_mut_slice(),
            );
        }
    }
    seed
}

/// Whether `count` is one of [`VALID_WORD_COUNTS`]
pub fn is_valid_word_count(count: usize) -> bool {
    VALID_WORD_COUNTS.contains(&count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon \
                                 abandon abandon abandon abandon abandon about";

    const ELECTRUM_REFERENCE: &str =
        "wild father tree among universe such mobile favorite target dynamic credit identify";

    #[test]
    fn test_word_count_entropy_table() {
        let table = [(12, 128), (15, 160), (18, 192), (21, 224), (24, 256)];
        for (words, bits) in table {
            let wc = WordCount::try_from(words).unwrap();
            assert_eq!(wc.words(), words);
            assert_eq!(wc.entropy_bits(), bits);
            assert_eq!(wc.entropy_bytes(), bits / 8);
        }
    }

    #[test]
    fn test_invalid_word_count() {
        assert_eq!(
            generate_mnemonic(13, Standard::Bip39),
            Err(SeedError::InvalidWordCount(13))
        );
        assert_eq!(
            generate_mnemonic(0, Standard::Electrum),
            Err(SeedError::InvalidWordCount(0))
        );
        assert!(!is_valid_word_count(13));
        assert!(is_valid_word_count(24));
    }

    #[test]
    fn test_bip39_all_lengths_use_wordlist() {
        let words = wordlist();
        for count in VALID_WORD_COUNTS {
            let phrase = generate_mnemonic(count, Standard::Bip39).unwrap();
            let tokens: Vec<&str> = phrase.split(' ').collect();
            assert_eq!(tokens.len(), count);
            assert!(tokens.iter().all(|t| words.contains(t)));
        }
    }

    #[test]
    fn test_bip39_entropy_roundtrip() {
        let phrase = generate_mnemonic(18, Standard::Bip39).unwrap();
        let entropy = mnemonic_to_entropy(&phrase).unwrap();
        assert_eq!(entropy.len(), 24);
        assert_eq!(entropy_to_mnemonic(&entropy).unwrap(), phrase);
    }

    #[test]
    fn test_zero_entropy_vector() {
        let phrase = entropy_to_mnemonic(&[0u8; 16]).unwrap();
        assert_eq!(phrase, ABANDON_ABOUT);
    }

    /// Trezor reference vector, passphrase "TREZOR"
    #[test]
    fn test_bip39_seed_vector() {
        let seed = mnemonic_to_seed(ABANDON_ABOUT, "TREZOR", Standard::Bip39);
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn test_electrum_all_lengths_accepted() {
        let words = wordlist();
        for count in VALID_WORD_COUNTS {
            let phrase = generate_mnemonic(count, Standard::Electrum).unwrap();
            let tokens: Vec<&str> = phrase.split(' ').collect();
            assert_eq!(tokens.len(), count);
            assert!(tokens.iter().all(|t| words.contains(t)));

            let mac = hmac_sha512(b"Seed version", &[normalize_text(&phrase).as_bytes()]);
            assert!(hex::encode(mac).starts_with("100"));
        }
    }

    #[test]
    fn test_electrum_reference_seed_recognized() {
        assert!(is_electrum_segwit_seed(ELECTRUM_REFERENCE));
        assert!(!is_electrum_segwit_seed(ABANDON_ABOUT));
    }

    #[test]
    fn test_electrum_candidate_is_deterministic() {
        let entropy = [0x5Au8; 16];
        let a = electrum_candidate(&entropy, WordCount::Words12);
        let b = electrum_candidate(&entropy, WordCount::Words12);
        assert_eq!(*a, *b);
        assert_eq!(a.split(' ').count(), 12);
    }

    #[test]
    fn test_electrum_candidate_vectors() {
        let entropy: Vec<u8> = (0u8..16).collect();
        assert_eq!(
            electrum_candidate(&entropy, WordCount::Words12).as_str(),
            "winner carry clutch scheme sand remove quarter snack embark artist phrase cabbage"
        );

        let entropy: Vec<u8> = (0u8..20).collect();
        assert_eq!(
            electrum_candidate(&entropy, WordCount::Words15).as_str(),
            "flash addict bright valve ancient embark language push wide thank scene base light ensure marriage"
        );

        // 24 words span 264 bits; the top 8 read as zero
        let entropy: Vec<u8> = (0u8..32).collect();
        assert_eq!(
            electrum_candidate(&entropy, WordCount::Words24).as_str(),
            "abandon abandon dog alcohol doctor loan bring abuse anxiety flash addict bright \
             valve ancient embark glad bench radar ship cram payment mix inner sentence"
        );
    }

    #[test]
    fn test_electrum_candidate_accepted_as_segwit() {
        let mut entropy = [0u8; 16];
        entropy[14..].copy_from_slice(&4705u16.to_be_bytes());
        let phrase = electrum_candidate(&entropy, WordCount::Words12);
        assert_eq!(
            phrase.as_str(),
            "bulk dolphin fiction inside gold increase basket cancel resist kingdom friend ability"
        );
        assert!(is_electrum_segwit_seed(&phrase));
    }

    #[test]
    fn test_electrum_candidate_low_bits_come_from_hash() {
        // 12 words read the low 132 bits: 4 entropy bits, then 128 hash bits
        let entropy = [0u8; 16];
        let hash = sha256(&entropy);
        let phrase = electrum_candidate(&entropy, WordCount::Words12);
        let last_word = phrase.split(' ').last().unwrap();
        let expected_index = ((hash[14] as usize) << 8 | hash[15] as usize) & 0x7FF;
        assert_eq!(last_word, wordlist()[expected_index]);
    }

    #[test]
    fn test_bits_at_reads_lsb_offsets() {
        let mut value = [0u8; 32];
        value[31] = 0xFF;
        value[30] = 0x07;
        assert_eq!(bits_at(&value, 0), 0x7FF);
        assert_eq!(bits_at(&value, 8), 0x007);
        assert_eq!(bits_at(&value, 250), 0);
    }

    #[test]
    fn test_electrum_cancellation_hook() {
        let result = generate_electrum_with(WordCount::Words12, |_| false);
        assert_eq!(result, Err(SeedError::Cancelled { attempts: 0 }));
    }

    #[test]
    fn test_electrum_hook_sees_increasing_attempts() {
        let mut seen = Vec::new();
        let result = generate_electrum_with(WordCount::Words12, |n| {
            seen.push(n);
            n < 5
        });
        match result {
            Ok(phrase) => assert!(is_electrum_segwit_seed(&phrase)),
            Err(e) => assert_eq!(e, SeedError::Cancelled { attempts: 5 }),
        }
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
    }

    /// Electrum's published segwit seed vectors
    #[test]
    fn test_electrum_seed_vectors() {
        let seed = mnemonic_to_seed(ELECTRUM_REFERENCE, "", Standard::Electrum);
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "aac2a6302e48577ab4b46f23dbae0774e2e62c796f797d0a1b5faeb528301e3064342dafb79069e7c4c6b8c38ae11d7a973bec0d4f70626f8cc5184a8d0b0756"
        );

        let seed = mnemonic_to_seed(
            ELECTRUM_REFERENCE,
            "Did you ever hear the tragedy of Darth Plagueis the Wise?",
            Standard::Electrum,
        );
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "4aa29f2aeb0127efb55138ab9e7be83b36750358751906f86c662b21a1ea1370f949e6d1a12fa56d3d93cadda93038c76ac8118597364e46f5156fde6183c82f"
        );
    }

    #[test]
    fn test_seed_is_deterministic() {
        let a = mnemonic_to_seed(ABANDON_ABOUT, "pass", Standard::Electrum);
        let b = mnemonic_to_seed(ABANDON_ABOUT, "pass", Standard::Electrum);
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.as_bytes().len(), SEED_LEN);
    }

    #[test]
    fn test_electrum_seed_normalizes_input() {
        let plain = mnemonic_to_seed(ABANDON_ABOUT, "passphrase", Standard::Electrum);
        let messy = mnemonic_to_seed(
            &format!("  {}  ", ABANDON_ABOUT.to_uppercase()),
            "PASSPHRASE",
            Standard::Electrum,
        );
        assert_eq!(plain.as_bytes(), messy.as_bytes());
    }

    #[test]
    fn test_bip39_seed_does_not_normalize() {
        let plain = mnemonic_to_seed(ABANDON_ABOUT, "", Standard::Bip39);
        let upper = mnemonic_to_seed(&ABANDON_ABOUT.to_uppercase(), "", Standard::Bip39);
        assert_ne!(plain.as_bytes(), upper.as_bytes());
    }

    #[test]
    fn test_standards_produce_different_seeds() {
        let bip39 = mnemonic_to_seed(ABANDON_ABOUT, "", Standard::Bip39);
        let electrum = mnemonic_to_seed(ABANDON_ABOUT, "", Standard::Electrum);
        assert_ne!(bip39.as_bytes(), electrum.as_bytes());
    }

    #[test]
    fn test_validate_mnemonic() {
        assert!(validate_mnemonic(ABANDON_ABOUT, Standard::Bip39).is_ok());
        assert!(validate_mnemonic("abandon abandon abandon", Standard::Bip39).is_err());
        assert!(validate_mnemonic(ABANDON_ABOUT, Standard::Electrum).is_err());
    }

    #[test]
    fn test_parse_mnemonic_canonical_forms() {
        let spaced = ABANDON_ABOUT.replace(' ', "   ");
        let parsed = parse_mnemonic(&format!("  {}\n", spaced), Standard::Bip39).unwrap();
        assert_eq!(parsed.as_str(), ABANDON_ABOUT);

        let parsed = parse_mnemonic(&ELECTRUM_REFERENCE.to_uppercase(), Standard::Electrum).unwrap();
        assert_eq!(parsed.as_str(), ELECTRUM_REFERENCE);
    }

    #[test]
    fn test_standard_labels_and_parsing() {
        assert_eq!(Standard::Bip39.to_string(), "BIP39");
        assert_eq!("electrum".parse::<Standard>().unwrap(), Standard::Electrum);
        assert_eq!("BIP39".parse::<Standard>().unwrap(), Standard::Bip39);
        assert!("slip39".parse::<Standard>().is_err());
        assert_eq!(
            serde_json::to_string(&Standard::Electrum).unwrap(),
            "\"Electrum\""
        );
    }

    #[test]
    fn test_standard_account_paths() {
        let params = ChainParams::PALLADIUM;
        assert_eq!(Standard::Bip39.derivation_path(&params).unwrap().to_string(), "m/84h/746h/0h");
        assert_eq!(Standard::Electrum.derivation_path(&params).unwrap().to_string(), "m/0h");

        let mut bad = params;
        bad.coin_type = u32::MAX;
        assert!(Standard::Bip39.derivation_path(&bad).is_err());
        assert!(Standard::Electrum.derivation_path(&bad).is_ok());
    }

    #[test]
    fn test_seed_debug_redacted() {
        let seed = mnemonic_to_seed(ABANDON_ABOUT, "", Standard::Bip39);
        assert_eq!(format!("{:?}", seed), "Seed([redacted])");
    }
}

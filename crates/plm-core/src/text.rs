//! Text normalization for Electrum seeds and passphrases

use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// Normalize text the way Electrum does before hashing a seed phrase:
/// NFKD, lowercase, strip combining marks, collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|&c| canonical_combining_class(c) == 0)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use plm_core::seed::{electrum_candidate, parse_mnemonic, Standard, WordCount};

fuzz_target!(|data: &[u8]| {
    // Both standards must return Ok or Err for any phrase, never panic.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_mnemonic(s, Standard::Bip39);
        let _ = parse_mnemonic(s, Standard::Electrum);
    }

    // Candidate mapping accepts any entropy length up to 32 bytes
    if data.len() <= 32 {
        let _ = electrum_candidate(data, WordCount::Words24);
    }
});

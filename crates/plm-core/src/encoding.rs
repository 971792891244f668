//! Base58Check and Bech32 (segwit v0) codecs

use bitcoin::base58;
use bitcoin::bech32::{segwit, Fe32, Hrp};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Invalid base58check string: {0}")]
    Base58(String),
    #[error("Invalid human-readable part: {0}")]
    InvalidHrp(String),
    #[error("Invalid bech32 address: {0}")]
    Bech32(String),
    #[error("Address prefix mismatch: expected {expected}, found {found}")]
    HrpMismatch { expected: String, found: String },
    #[error("Unsupported witness version {0}")]
    UnsupportedWitnessVersion(u8),
}

/// Base58 encode `data` with a 4-byte double-SHA256 checksum appended
pub fn base58check_encode(data: &[u8]) -> String {
    base58::encode_check(data)
}

/// Decode a Base58Check string, verifying and stripping the checksum
pub fn base58check_decode(s: &str) -> Result<Vec<u8>, EncodingError> {
    base58::decode_check(s).map_err(|e| EncodingError::Base58(e.to_string()))
}

/// Encode a version-0 witness program as a bech32 address
pub fn encode_segwit_v0(hrp: &str, program: &[u8]) -> Result<String, EncodingError> {
    let hrp = Hrp::parse(hrp).map_err(|e| EncodingError::InvalidHrp(e.to_string()))?;
    segwit::encode_v0(hrp, program).map_err(|e| EncodingError::Bech32(e.to_string()))
}

/// Decode a segwit v0 address, checking it carries the expected prefix.
///
/// Returns the witness version and program.
pub fn decode_segwit_address(expected_hrp: &str, address: &str) -> Result<(u8, Vec<u8>), EncodingError> {
    let (hrp, version, program) =
        segwit::decode(address).map_err(|e| EncodingError::Bech32(e.to_string()))?;

    let found = hrp.to_lowercase();
    if found != expected_hrp.to_lowercase() {
        return Err(EncodingError::HrpMismatch {
            expected: expected_hrp.to_string(),
            found,
        });
    }
    if version != Fe32::Q {
        return Err(EncodingError::UnsupportedWitnessVersion(version.to_u8()));
    }

    Ok((version.to_u8(), program))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58check_checksum_is_double_sha256() {
        let data = b"plm";
        let raw = base58::decode(&base58check_encode(data)).unwrap();
        let (payload, checksum) = raw.split_at(raw.len() - 4);
        assert_eq!(payload, data);
        assert_eq!(checksum, &crate::hashes::double_sha256(data)[..4]);
    }

    #[test]
    fn test_base58check_roundtrip() {
        let data = [0x04, 0xb2, 0x43, 0x0c, 0x00, 0x01, 0x02];
        let encoded = base58check_encode(&data);
        assert_eq!(base58check_decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_base58check_rejects_bad_checksum() {
        let mut encoded = base58check_encode(b"palladium").into_bytes();
        let last = encoded.len() - 1;
        encoded[last] = if encoded[last] == b'1' { b'2' } else { b'1' };
        let corrupted = String::from_utf8(encoded).unwrap();
        assert!(base58check_decode(&corrupted).is_err());
    }

    /// BIP-173 example: P2WPKH for 0279BE66...F81798
    #[test]
    fn test_bip173_p2wpkh_vector() {
        let program = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        let address = encode_segwit_v0("bc", &program).unwrap();
        assert_eq!(address, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");

        let (version, decoded) = decode_segwit_address("bc", &address).unwrap();
        assert_eq!(version, 0);
        assert_eq!(decoded, program);
    }

    #[test]
    fn test_decode_rejects_other_prefix() {
        let program = [7u8; 20];
        let address = encode_segwit_v0("plm", &program).unwrap();
        assert!(address.starts_with("plm1q"));

        let err = decode_segwit_address("bc", &address).unwrap_err();
        assert!(matches!(err, EncodingError::HrpMismatch { .. }));
    }

    #[test]
    fn test_invalid_hrp_rejected() {
        assert!(matches!(
            encode_segwit_v0("", &[0u8; 20]),
            Err(EncodingError::InvalidHrp(_))
        ));
    }
}

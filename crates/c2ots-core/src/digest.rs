//! # Digest Helpers
//!
//! SHA-256 primitives and hex conversion shared by the reducers and the
//! resolver.
//!
//! ## Byte Order
//!
//! Bitcoin displays transaction ids and Merkle roots byte-reversed relative
//! to the order used when hashing. Everything inside the graph uses the
//! internal (hashing) order; [`reversed`] converts display-order values at the
//! boundary.

use sha2::{Digest, Sha256};

use crate::error::HexError;

/// Compute SHA-256 of raw bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

/// Compute double SHA-256, Bitcoin's transaction id and Merkle node digest.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Return a byte-reversed copy.
pub fn reversed(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

/// Encode bytes as lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string (either case) into bytes.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, HexError> {
    hex::decode(value.trim()).map_err(|e| HexError {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            encode_hex(&sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256d_is_two_rounds() {
        assert_eq!(sha256d(b"abc"), sha256(&sha256(b"abc")));
    }

    #[test]
    fn decode_accepts_upper_case() {
        assert_eq!(decode_hex("DEADbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn decode_rejects_odd_length_and_non_hex() {
        assert!(decode_hex("abc").is_err());
        let err = decode_hex("zz").unwrap_err();
        assert_eq!(err.value, "zz");
    }

    #[test]
    fn reversed_flips_order() {
        assert_eq!(reversed(&[1, 2, 3]), vec![3, 2, 1]);
        assert!(reversed(&[]).is_empty());
    }
}

//! Attestations: claims that a node's message is anchored externally.

use std::fmt;

use crate::digest::encode_hex;

/// Tag used for placeholder attestations migrated from Bitcoin
/// `OP_RETURN` anchors whose block has not been located yet.
pub const BITCOIN_OP_RETURN_TAG: [u8; 8] = [0x68, 0x7f, 0xe3, 0xfe, 0x79, 0x5e, 0x9a, 0x0d];

/// A claim attached to a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attestation {
    /// The digest is claimed to be anchored in the system identified by
    /// `tag`, recorded as `payload`, but nothing has been verified yet.
    Unknown {
        /// 8-byte system identifier.
        tag: [u8; 8],
        /// System-specific locator, e.g. a transaction hash.
        payload: Vec<u8>,
    },
    /// The node's message equals, byte for byte in internal order, the
    /// Merkle root of the Bitcoin block at `height`.
    BitcoinBlockHeader {
        /// Block height.
        height: u64,
    },
}

impl Attestation {
    /// Placeholder for a Bitcoin `OP_RETURN` anchor in transaction `payload`.
    pub fn bitcoin_op_return(payload: Vec<u8>) -> Self {
        Self::Unknown {
            tag: BITCOIN_OP_RETURN_TAG,
            payload,
        }
    }

    /// Whether this attestation still awaits resolution.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

impl fmt::Display for Attestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { tag, payload } => write!(
                f,
                "UnknownAttestation {} {}",
                encode_hex(tag),
                encode_hex(payload)
            ),
            Self::BitcoinBlockHeader { height } => {
                write!(f, "BitcoinBlockHeaderAttestation({height})")
            }
        }
    }
}

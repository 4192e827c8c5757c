//! Chainpoint migration error types.

use c2ots_core::{GraphError, HexError};

/// Errors from parsing, validating, or reducing a Chainpoint proof.
#[derive(Debug, thiserror::Error)]
pub enum ChainpointError {
    /// The document header is not a supported Chainpoint version. Raised
    /// before any reduction takes place.
    #[error("unsupported proof format: {0}")]
    UnsupportedFormat(String),

    /// Recomputing the proof path does not reproduce the declared root.
    #[error("invalid merkle root: expected {expected}, computed {computed}")]
    InvalidMerkleRoot {
        /// Root declared by (or derived from) the document.
        expected: String,
        /// Root obtained by walking the proof.
        computed: String,
    },

    /// A digest or sibling field is not valid hex.
    #[error(transparent)]
    InvalidHex(#[from] HexError),

    /// An anchor entry cannot be interpreted.
    #[error("invalid anchor `{anchor_id}`: {reason}")]
    InvalidAnchor {
        /// The anchor identifier as written in the document.
        anchor_id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The document body does not match the expected schema.
    #[error("malformed proof document: {0}")]
    Json(#[from] serde_json::Error),

    /// A graph mutation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

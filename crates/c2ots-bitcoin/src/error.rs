//! # Resolution Errors
//!
//! [`SourceError`] is what a [`BlockSource`](crate::source::BlockSource)
//! reports; [`ResolveError`] is what the resolver reports, wrapping source
//! failures together with the verification failures it detects itself.

use std::time::Duration;

use c2ots_core::GraphError;
use thiserror::Error;

/// Failure reported by a block data source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The backend could not be reached or is not configured.
    #[error("{backend} unavailable: {reason}")]
    Unavailable {
        /// Name of the data source.
        backend: String,
        /// Failure reason.
        reason: String,
    },

    /// The backend has no record of the requested item.
    #[error("{backend} has no {kind} {id}")]
    NotFound {
        /// Name of the data source.
        backend: String,
        /// `transaction` or `block`.
        kind: &'static str,
        /// The requested hash.
        id: String,
    },

    /// The backend answered with data that cannot be interpreted.
    #[error("{backend} returned malformed data: {reason}")]
    Malformed {
        /// Name of the data source.
        backend: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Failure while turning a placeholder into a verified block attestation.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The leaf digest does not occur in the raw transaction.
    #[error("payload {payload} not found in raw transaction {tx_hash}")]
    PayloadNotFound {
        /// Transaction that was searched.
        tx_hash: String,
        /// The digest looked for, hex encoded.
        payload: String,
    },

    /// Hashing the rebuilt transaction does not give the expected txid.
    #[error("transaction {tx_hash} hashes to {computed}")]
    TxidMismatch {
        /// Transaction hash as requested.
        tx_hash: String,
        /// Txid derived from the raw bytes, display order.
        computed: String,
    },

    /// The reconstructed Merkle root differs from the block header.
    #[error("merkle mismatch in block {block_hash}: header {expected}, computed {computed}")]
    MerkleMismatch {
        /// Block that was rebuilt.
        block_hash: String,
        /// Root reported by the source, display order.
        expected: String,
        /// Root reached by the graph, display order.
        computed: String,
    },

    /// The source reported a block without transactions.
    #[error("block {block_hash} has no transactions")]
    EmptyBlock {
        /// The block hash.
        block_hash: String,
    },

    /// The block's transaction list does not contain the anchoring tx.
    #[error("transaction {tx_hash} is not listed in block {block_hash}")]
    TxNotInBlock {
        /// The anchoring transaction.
        tx_hash: String,
        /// The block the source placed it in.
        block_hash: String,
    },

    /// The data source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A data source call did not answer in time.
    #[error("{backend} {call} timed out after {after:?}")]
    Timeout {
        /// Name of the data source.
        backend: String,
        /// The call that timed out.
        call: &'static str,
        /// The configured limit.
        after: Duration,
    },

    /// A graph mutation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A resolution task panicked or was cancelled.
    #[error("resolution task failed: {0}")]
    Task(String),

    /// Every attempted source failed for this transaction.
    #[error("could not resolve {tx_hash}: full node: {}; lite: {lite}", describe_attempt(.full_node))]
    ResolutionFailed {
        /// The anchoring transaction.
        tx_hash: String,
        /// Full-node failure, `None` when the full node was skipped.
        full_node: Option<Box<ResolveError>>,
        /// Lite (explorer) failure.
        lite: Box<ResolveError>,
    },
}

fn describe_attempt(attempt: &Option<Box<ResolveError>>) -> String {
    match attempt {
        Some(err) => err.to_string(),
        None => "skipped".to_string(),
    }
}

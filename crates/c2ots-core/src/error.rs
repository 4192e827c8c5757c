//! # Error Types
//!
//! Errors raised by graph mutation and digest decoding. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Graph errors name the node(s) involved and, where a message comparison
//!   failed, both messages in hex.
//! - Hex errors carry the offending input so the caller can report which
//!   document field was malformed.

use thiserror::Error;

use crate::op::Op;
use crate::timestamp::NodeId;

/// Error during a timestamp graph operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node id does not belong to this graph.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Linking would break the edge invariant.
    #[error("edge `{op}` from node {parent} does not produce the message of node {child}")]
    EdgeMismatch {
        /// The node the edge starts from.
        parent: NodeId,
        /// The operation on the edge.
        op: Op,
        /// The node the edge would point to.
        child: NodeId,
    },

    /// Two nodes that must carry the same digest do not.
    #[error("message mismatch at node {node}: expected {expected}, found {found}")]
    MessageMismatch {
        /// The node whose message was checked.
        node: NodeId,
        /// Expected message, hex encoded.
        expected: String,
        /// Actual message, hex encoded.
        found: String,
    },
}

/// A string could not be decoded as hex.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hex `{value}`: {reason}")]
pub struct HexError {
    /// The rejected input.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

//! # c2ots-core — Timestamp Operation Graph
//!
//! The data model every other crate in the workspace builds on. A timestamp
//! is a directed graph whose nodes carry a message (a byte string) and whose
//! edges are byte transformations: following an edge applies its [`Op`] to
//! the parent's message and yields the child's message. Attestations hang off
//! nodes and claim that a message is anchored somewhere external.
//!
//! ## Key Design Principles
//!
//! 1. **Arena, not pointers.** Nodes live in a [`TimestampGraph`] and are
//!    addressed by [`NodeId`]. Grafting a subtree is an explicit index copy,
//!    never an aliasing hazard.
//!
//! 2. **Edge invariant.** For every edge `(op, child)` of a node `n`,
//!    `child.message == op.apply(n.message)`. Every mutation path either
//!    computes the child itself or checks the invariant before linking.
//!
//! 3. **Closed variants.** [`Op`] and [`Attestation`] are exhaustive enums;
//!    callers match on them instead of probing for fields.
//!
//! 4. **Iterative traversal.** Leaf walks use an explicit stack so deep
//!    proofs cannot exhaust the call stack.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `c2ots-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod attestation;
pub mod digest;
pub mod error;
pub mod op;
pub mod timestamp;

pub use attestation::{Attestation, BITCOIN_OP_RETURN_TAG};
pub use digest::{decode_hex, encode_hex, reversed, sha256, sha256d};
pub use error::{GraphError, HexError};
pub use op::Op;
pub use timestamp::{NodeId, TimestampGraph};

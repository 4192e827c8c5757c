//! # c2ots-chainpoint — Chainpoint Proof Migration
//!
//! Reads Chainpoint v2 receipts and v3 proofs and rebuilds them as a
//! [`c2ots_core::TimestampGraph`]:
//!
//! - **Document detection** from `@context` and `type`; anything else is
//!   rejected before reduction.
//! - **Root self-validation**: the proof path is recomputed without a graph
//!   and must reproduce the declared root (v2) or the calendar root every
//!   reduced leaf reaches (v3).
//! - **Path reduction** into `prepend`/`append`/`sha256` edges.
//! - **Attestation grafting**: v2 `BTCOpReturn` anchors become placeholder
//!   attestations at every leaf; v3 `btc` anchors become block header
//!   attestations where they are declared, and the calendar chain is joined
//!   to the Bitcoin chain.
//!
//! ## Crate Policy
//!
//! - Depends only on `c2ots-core` internally.
//! - Pure and synchronous: no I/O beyond parsing the input string.

pub mod document;
pub mod error;
pub mod graft;
pub mod migrate;
pub mod reduce;
pub mod root;

pub use document::{
    AnchorKind, AnchorV2, AnchorV3, Branch, BranchOp, ChainpointDocument, ChainpointV2,
    ChainpointV3, HashOp, ProofStep,
};
pub use error::ChainpointError;
pub use graft::{insert_unknown_attestations, join_calendar_and_bitcoin};
pub use migrate::{migrate, Migration};
pub use reduce::{reduce_chainpoint_v2, reduce_chainpoint_v3};
pub use root::{recompute_merkle_root_v2, recompute_merkle_root_v3};

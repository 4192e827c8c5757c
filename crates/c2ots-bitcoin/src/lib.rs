//! # c2ots-bitcoin — Bitcoin Attestation Resolution
//!
//! Replaces placeholder `OP_RETURN` attestations left by the migration with
//! verified block header attestations.
//!
//! - **Data sources** ([`BlockSource`]): the three lookups the resolver
//!   needs, behind one async trait. [`MemoryBlockSource`] answers from a
//!   chain snapshot.
//! - **Merkle reconstruction** ([`build_merkle_tree`]): the block's
//!   transaction tree as graph edges.
//! - **Resolution** ([`Resolver`]): commitment of the leaf digest into its
//!   transaction, the transaction into its block, full-node first with
//!   lite fallback, concurrent over all placeholders.
//!
//! ## Crate Policy
//!
//! - Depends only on `c2ots-core` internally.
//! - Network transports are not part of this crate; callers provide
//!   [`BlockSource`] implementations.
//! - The caller's graph is only mutated once every placeholder resolved.

pub mod config;
pub mod error;
pub mod merkle;
pub mod resolver;
pub mod source;

pub use config::{ConfigError, ResolverConfig, DEFAULT_REQUEST_TIMEOUT};
pub use error::{ResolveError, SourceError};
pub use merkle::{build_merkle_tree, cat_sha256d};
pub use resolver::{
    pending_placeholders, resolve, Placeholder, Resolution, Resolved, Resolver, Sources,
    FULL_NODE,
};
pub use source::{BlockInfo, BlockSource, ChainSnapshot, MemoryBlockSource, TxInfo};

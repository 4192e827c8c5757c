//! # c2ots-cli — Command-Line Interface
//!
//! ## Subcommands
//!
//! - `migrate`: migrate a Chainpoint proof, resolve its Bitcoin
//!   placeholders against chain data, print the resulting graph
//! - `root`: recompute a proof's Merkle root(s) for self-validation
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the domain crates and only format output.
//! - Handlers write to a caller-supplied writer so they can be tested.

pub mod migrate;
pub mod root;

use std::path::Path;

use anyhow::{Context, Result};
use c2ots_chainpoint::ChainpointDocument;

/// Read and parse a Chainpoint document from disk.
pub fn read_document(path: &Path) -> Result<ChainpointDocument> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ChainpointDocument::from_json(&input)
        .with_context(|| format!("failed to parse {}", path.display()))
}

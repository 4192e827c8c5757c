//! # Root Subcommand
//!
//! Recomputes the Merkle root(s) a proof commits to, without building a
//! graph. Exits with status 1 when a v2 receipt's declared root does not
//! match.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use c2ots_chainpoint::{recompute_merkle_root_v2, recompute_merkle_root_v3, ChainpointDocument};

use crate::read_document;

/// Arguments for the root subcommand.
#[derive(Args, Debug)]
pub struct RootArgs {
    /// Path to the Chainpoint proof (JSON).
    #[arg(long)]
    pub chainpoint: PathBuf,
}

/// Execute the root subcommand.
pub fn run_root(args: &RootArgs, out: &mut impl Write) -> Result<u8> {
    let document = read_document(&args.chainpoint)?;
    match &document {
        ChainpointDocument::V2(doc) => {
            let computed = recompute_merkle_root_v2(&doc.target_hash, &doc.proof)?;
            let matches = computed.eq_ignore_ascii_case(doc.merkle_root.trim());
            writeln!(out, "computed {computed}")?;
            writeln!(out, "declared {}", doc.merkle_root.trim())?;
            if !matches {
                writeln!(out, "MISMATCH")?;
                return Ok(1);
            }
            writeln!(out, "OK")?;
        }
        ChainpointDocument::V3(doc) => {
            let calendar = doc
                .calendar_branch()
                .context("chainpoint v3 proof has no calendar branch")?;
            let cal_root = recompute_merkle_root_v3(&doc.hash, &calendar.ops)?;
            writeln!(out, "calendar {cal_root}")?;
            if let Some(bitcoin) = calendar.bitcoin_branch() {
                let btc_root = recompute_merkle_root_v3(&cal_root, &bitcoin.ops)?;
                writeln!(out, "bitcoin {btc_root}")?;
            }
        }
    }
    Ok(0)
}

//! # Path Reducers
//!
//! Turn a Chainpoint proof path into a chain of graph edges hanging off an
//! existing node. Each reducer returns the tip of the chain it built.
//!
//! - v2: `{left: s}` becomes `prepend(s)`, `{right: s}` becomes `append(s)`,
//!   each followed by `sha256`.
//! - v3: `{l}` / `{r}` become `prepend` / `append` of the sibling's byte
//!   encoding, `sha-256` is one `sha256` edge, `sha-256-x2` two. `btc`
//!   anchors attach a [`Attestation::BitcoinBlockHeader`] at the current
//!   node; other anchor types carry no verifiable claim and are skipped.

use c2ots_core::{decode_hex, encode_hex, Attestation, NodeId, Op, TimestampGraph};

use crate::document::{AnchorV3, BranchOp, HashOp, ProofStep};
use crate::error::ChainpointError;

/// Reduce a v2 proof path starting at `node`. Returns the chain tip.
///
/// `node` stays the entry of the chain: it keeps the target digest and is
/// where placeholder attestations are later searched from. The final digest
/// is the tip's message.
pub fn reduce_chainpoint_v2(
    graph: &mut TimestampGraph,
    node: NodeId,
    proof: &[ProofStep],
) -> Result<NodeId, ChainpointError> {
    let mut tip = node;
    for step in proof {
        let op = match step {
            ProofStep::Left(sibling) => Op::Prepend(decode_hex(sibling)?),
            ProofStep::Right(sibling) => Op::Append(decode_hex(sibling)?),
        };
        tip = graph.add_edge(tip, op)?;
        tip = graph.add_edge(tip, Op::Sha256)?;
    }
    Ok(tip)
}

/// Reduce a v3 operation list starting at `node`. Returns the chain tip.
pub fn reduce_chainpoint_v3(
    graph: &mut TimestampGraph,
    node: NodeId,
    ops: &[BranchOp],
) -> Result<NodeId, ChainpointError> {
    let mut tip = node;
    for op in ops {
        match op {
            BranchOp::Prepend(sibling) => {
                tip = graph.add_edge(tip, Op::Prepend(sibling_bytes(sibling)?))?;
            }
            BranchOp::Append(sibling) => {
                tip = graph.add_edge(tip, Op::Append(sibling_bytes(sibling)?))?;
            }
            BranchOp::Hash(HashOp::Sha256) => {
                tip = graph.add_edge(tip, Op::Sha256)?;
            }
            BranchOp::Hash(HashOp::Sha256x2) => {
                tip = graph.add_edge(tip, Op::Sha256)?;
                tip = graph.add_edge(tip, Op::Sha256)?;
            }
            BranchOp::Anchors(anchors) => attest_anchors(graph, tip, anchors)?,
        }
    }
    Ok(tip)
}

fn attest_anchors(
    graph: &mut TimestampGraph,
    node: NodeId,
    anchors: &[AnchorV3],
) -> Result<(), ChainpointError> {
    for anchor in anchors {
        if anchor.kind != "btc" {
            tracing::debug!(kind = %anchor.kind, anchor_id = %anchor.anchor_id, "skipping non-bitcoin anchor");
            continue;
        }
        let height = anchor
            .anchor_id
            .trim()
            .parse::<u64>()
            .map_err(|e| ChainpointError::InvalidAnchor {
                anchor_id: anchor.anchor_id.clone(),
                reason: format!("btc anchor id is not a block height: {e}"),
            })?;
        graph.attest(node, Attestation::BitcoinBlockHeader { height })?;
    }
    Ok(())
}

/// Whether `value` is read as hex: non-empty, hex digits only, even length.
pub fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.len() % 2 == 0 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Byte encoding of a v3 sibling: hex-decoded when [`is_hex`], otherwise
/// the UTF-8 bytes of the string.
pub fn sibling_bytes(value: &str) -> Result<Vec<u8>, ChainpointError> {
    if is_hex(value) {
        Ok(decode_hex(value)?)
    } else {
        Ok(value.as_bytes().to_vec())
    }
}

/// Hex form of a v3 sibling, as used by the string root walk.
pub fn sibling_hex(value: &str) -> String {
    if is_hex(value) {
        value.to_ascii_lowercase()
    } else {
        encode_hex(value.as_bytes())
    }
}

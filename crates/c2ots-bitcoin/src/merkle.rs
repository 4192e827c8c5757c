//! # Block Merkle Reconstruction
//!
//! Rebuilds a block's transaction Merkle tree as real graph edges, so the
//! path from any transaction leaf to the root can be followed by walking
//! the graph.
//!
//! Pairing follows Bitcoin's rule: adjacent nodes are combined left to
//! right, and an odd trailing node is paired with itself. Each combination
//! is [`cat_sha256d`]: both children reach one shared concatenation node,
//! followed by two `sha256` edges.
//!
//! Leaf messages are txids in internal byte order (the reverse of the
//! display hex), and so is the resulting root.

use c2ots_core::{GraphError, NodeId, Op, TimestampGraph};

/// Join `left` and `right` into `sha256(sha256(left || right))`.
///
/// `left` gets `append(right)` and `right` gets `prepend(left)`, both
/// reaching the same node. When `left` and `right` are the same node only
/// the append edge exists. Returns the parent.
pub fn cat_sha256d(
    graph: &mut TimestampGraph,
    left: NodeId,
    right: NodeId,
) -> Result<NodeId, GraphError> {
    let left_message = graph.message(left)?.to_vec();
    let right_message = graph.message(right)?.to_vec();

    let joined = graph.add_edge(left, Op::Append(right_message))?;
    if left != right {
        graph.link(right, Op::Prepend(left_message), joined)?;
    }
    let once = graph.add_edge(joined, Op::Sha256)?;
    graph.add_edge(once, Op::Sha256)
}

/// Build the Merkle tree over `leaves` and return its root node.
///
/// A single leaf is its own root. Returns `None` for an empty slice.
pub fn build_merkle_tree(
    graph: &mut TimestampGraph,
    leaves: &[NodeId],
) -> Result<Option<NodeId>, GraphError> {
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = pair.get(1).copied().unwrap_or(left);
            next.push(cat_sha256d(graph, left, right)?);
        }
        level = next;
    }
    Ok(level.first().copied())
}

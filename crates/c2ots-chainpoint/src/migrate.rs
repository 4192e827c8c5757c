//! # Migration Pipeline
//!
//! Synchronous half of the conversion: validate the document's own Merkle
//! claims, reduce its proof path into a fresh [`TimestampGraph`], and graft
//! attestations onto the result. Nothing here touches the network; v2
//! placeholders are resolved later by `c2ots-bitcoin`.

use c2ots_core::{decode_hex, encode_hex, NodeId, TimestampGraph};

use crate::document::{ChainpointDocument, ChainpointV2, ChainpointV3, CAL_ANCHOR_BRANCH};
use crate::error::ChainpointError;
use crate::graft::{insert_unknown_attestations, join_calendar_and_bitcoin};
use crate::reduce::{reduce_chainpoint_v2, reduce_chainpoint_v3};
use crate::root::{check_root, recompute_merkle_root_v2, recompute_merkle_root_v3};

/// A migrated proof: the graph and the node holding the target
/// hash.
#[derive(Debug, Clone)]
pub struct Migration {
    pub graph: TimestampGraph,
    pub root: NodeId,
}

impl Migration {
    /// Indented text form of the whole graph.
    pub fn render(&self) -> Result<String, ChainpointError> {
        Ok(self.graph.render_tree(self.root)?)
    }
}

/// Convert a parsed Chainpoint document into a timestamp graph.
///
/// Fails with [`ChainpointError::InvalidMerkleRoot`] before building
/// anything if the proof path does not reproduce the document's root.
pub fn migrate(document: &ChainpointDocument) -> Result<Migration, ChainpointError> {
    let migration = match document {
        ChainpointDocument::V2(doc) => migrate_v2(doc)?,
        ChainpointDocument::V3(doc) => migrate_v3(doc)?,
    };
    tracing::info!(
        version = document.version(),
        target_hash = document.target_hash(),
        nodes = migration.graph.len(),
        "proof migrated"
    );
    Ok(migration)
}

fn migrate_v2(doc: &ChainpointV2) -> Result<Migration, ChainpointError> {
    let computed = recompute_merkle_root_v2(&doc.target_hash, &doc.proof)?;
    check_root(&doc.merkle_root, &computed)?;

    let (mut graph, root) = TimestampGraph::with_root(decode_hex(&doc.target_hash)?);
    let tip = reduce_chainpoint_v2(&mut graph, root, &doc.proof)?;
    tracing::debug!(steps = doc.proof.len(), tip = %tip, "v2 path reduced");

    let inserted = insert_unknown_attestations(&mut graph, root, &doc.anchors)?;
    if inserted == 0 {
        tracing::warn!(anchors = doc.anchors.len(), "no bitcoin anchors in receipt");
    }
    Ok(Migration { graph, root })
}

fn migrate_v3(doc: &ChainpointV3) -> Result<Migration, ChainpointError> {
    let calendar = doc.calendar_branch().ok_or_else(|| {
        ChainpointError::UnsupportedFormat(format!("chainpoint v3 proof has no {CAL_ANCHOR_BRANCH}"))
    })?;
    let cal_root_hex = recompute_merkle_root_v3(&doc.hash, &calendar.ops)?;

    let (mut graph, root) = TimestampGraph::with_root(decode_hex(&doc.hash)?);
    reduce_chainpoint_v3(&mut graph, root, &calendar.ops)?;
    for leaf in graph.leaves(root)? {
        check_root(&cal_root_hex, &encode_hex(graph.message(leaf)?))?;
    }

    match calendar.bitcoin_branch() {
        Some(bitcoin) => {
            let btc_root = graph.add_node(decode_hex(&cal_root_hex)?);
            reduce_chainpoint_v3(&mut graph, btc_root, &bitcoin.ops)?;
            let btc_root_hex = recompute_merkle_root_v3(&cal_root_hex, &bitcoin.ops)?;
            tracing::debug!(calendar_root = %cal_root_hex, bitcoin_root = %btc_root_hex, "v3 branches reduced");
            join_calendar_and_bitcoin(&mut graph, root, btc_root)?;
        }
        None => {
            tracing::warn!(calendar_root = %cal_root_hex, "proof has no bitcoin branch yet");
        }
    }
    Ok(Migration { graph, root })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn v2_root_mismatch_builds_nothing() {
        let doc = ChainpointDocument::from_value(json!({
            "@context": "https://w3id.org/chainpoint/v2",
            "type": "ChainpointSHA256v2",
            "targetHash": "aa",
            "merkleRoot": "bb",
            "proof": [{"right": "cc"}],
            "anchors": [{"type": "BTCOpReturn", "sourceId": "dd"}]
        }))
        .unwrap();
        assert!(matches!(
            migrate(&doc),
            Err(ChainpointError::InvalidMerkleRoot { .. })
        ));
    }

    #[test]
    fn v2_empty_proof_attests_the_target_itself() {
        let doc = ChainpointDocument::from_value(json!({
            "@context": "https://w3id.org/chainpoint/v2",
            "type": "ChainpointSHA256v2",
            "targetHash": "aa",
            "merkleRoot": "AA",
            "proof": [],
            "anchors": [{"type": "BTCOpReturn", "sourceId": "dd"}]
        }))
        .unwrap();
        let migration = migrate(&doc).unwrap();
        assert_eq!(migration.graph.len(), 1);
        assert_eq!(migration.graph.directly_verified(migration.root).unwrap(), vec![migration.root]);
    }

    #[test]
    fn v3_without_calendar_branch_is_unsupported() {
        let doc = ChainpointDocument::from_value(json!({
            "@context": "https://w3id.org/chainpoint/v3",
            "type": "Chainpoint",
            "hash": "aa",
            "branches": [{"label": "something_else", "ops": []}]
        }))
        .unwrap();
        assert!(matches!(
            migrate(&doc),
            Err(ChainpointError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn v3_calendar_only_proof_has_no_attestations() {
        let doc = ChainpointDocument::from_value(json!({
            "@context": "https://w3id.org/chainpoint/v3",
            "type": "Chainpoint",
            "hash": "aa",
            "branches": [{"label": "cal_anchor_branch", "ops": [{"r": "bb"}, {"op": "sha-256"}]}]
        }))
        .unwrap();
        let migration = migrate(&doc).unwrap();
        assert_eq!(migration.graph.len(), 3);
        assert!(migration.graph.all_attestations(migration.root).unwrap().is_empty());
    }
}

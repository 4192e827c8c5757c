//! Attestation grafting: placeholder insertion at the leaves of a reduced
//! v2 proof, and the calendar/Bitcoin join for v3 proofs.

use c2ots_core::{decode_hex, Attestation, NodeId, TimestampGraph};

use crate::document::{AnchorKind, AnchorV2};
use crate::error::ChainpointError;

/// Attach a placeholder attestation at every leaf below `root` for each
/// recognized anchor. Returns the number of attestations inserted.
///
/// `BTCOpReturn` anchors become [`Attestation::bitcoin_op_return`] with the
/// decoded `sourceId` as payload. Other anchor types are logged and skipped.
pub fn insert_unknown_attestations(
    graph: &mut TimestampGraph,
    root: NodeId,
    anchors: &[AnchorV2],
) -> Result<usize, ChainpointError> {
    let mut inserted = 0;
    for anchor in anchors {
        match &anchor.kind {
            AnchorKind::BtcOpReturn => {
                let payload =
                    decode_hex(&anchor.source_id).map_err(|e| ChainpointError::InvalidAnchor {
                        anchor_id: anchor.source_id.clone(),
                        reason: e.to_string(),
                    })?;
                let attestation = Attestation::bitcoin_op_return(payload);
                let count = graph.attach_at_leaves(root, &attestation)?;
                tracing::debug!(source_id = %anchor.source_id, leaves = count, "placeholder attached");
                inserted += count;
            }
            AnchorKind::Other(kind) => {
                tracing::warn!(kind = %kind, source_id = %anchor.source_id, "unsupported anchor type, skipping");
            }
        }
    }
    Ok(inserted)
}

/// Continue every leaf of the calendar chain at `cal_root` with the Bitcoin
/// chain at `btc_root`. Attestations sitting on `btc_root` itself are copied
/// onto the joined leaves. Returns the number of leaves joined.
pub fn join_calendar_and_bitcoin(
    graph: &mut TimestampGraph,
    cal_root: NodeId,
    btc_root: NodeId,
) -> Result<usize, ChainpointError> {
    let leaves: Vec<NodeId> = graph
        .leaves(cal_root)?
        .into_iter()
        .filter(|leaf| *leaf != btc_root)
        .collect();
    let joined = graph.concat(cal_root, btc_root)?;

    let carried: Vec<Attestation> = graph.attestations_of(btc_root)?.iter().cloned().collect();
    for leaf in leaves {
        for att in &carried {
            graph.attest(leaf, att.clone())?;
        }
    }
    Ok(joined)
}

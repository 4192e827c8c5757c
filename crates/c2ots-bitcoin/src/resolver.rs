//! # Attestation Resolver
//!
//! Turns each placeholder `UnknownAttestation` (Bitcoin `OP_RETURN` tag,
//! payload = txid) into a verified [`Attestation::BitcoinBlockHeader`].
//!
//! ## Per placeholder
//!
//! 1. Fetch the raw transaction and locate the leaf digest in its bytes.
//! 2. Commit the digest to the transaction: `prepend(prefix)`,
//!    `append(suffix)`, `sha256`, `sha256`. The result must equal the txid
//!    in internal byte order.
//! 3. Look up the confirming block: height, Merkle root, transaction list.
//! 4. Rebuild the block's Merkle tree and check it against the header.
//! 5. Attest the tree root with the block height, and continue the
//!    transaction node into the tree through its matching leaf.
//!
//! All of this is built in a standalone fragment graph. The fragment only
//! reaches the caller's graph in [`Resolver::resolve_all`], after every
//! placeholder resolved, so a failed run leaves the graph untouched.
//!
//! ## Sources
//!
//! The full node is tried first, then the lite source. A missing full node
//! counts as a failed attempt. `prefer_lite` skips the full node. Every
//! source call is bounded by the configured timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use c2ots_core::{
    decode_hex, encode_hex, reversed, Attestation, GraphError, NodeId, Op, TimestampGraph,
    BITCOIN_OP_RETURN_TAG,
};
use tokio::task::JoinSet;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, SourceError};
use crate::merkle::build_merkle_tree;
use crate::source::BlockSource;

/// Name reported for the full-node slot when none is configured.
pub const FULL_NODE: &str = "full-node";

/// A placeholder attestation awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The leaf the attestation sits on.
    pub leaf: NodeId,
    /// The attestation itself, removed once resolved.
    pub attestation: Attestation,
    /// Anchoring transaction, display-order hex.
    pub tx_hash: String,
    /// The leaf's message: the digest committed in the transaction.
    pub message: Vec<u8>,
}

/// A verified path from a placeholder leaf to a block header.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub tx_hash: String,
    pub block_hash: String,
    pub height: u64,
    /// Name of the source that answered.
    pub backend: String,
    /// Standalone graph holding the path.
    pub graph: TimestampGraph,
    /// Fragment node carrying the leaf message.
    pub root: NodeId,
}

/// Summary of one applied resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub leaf: NodeId,
    pub tx_hash: String,
    pub height: u64,
    pub backend: String,
}

/// Placeholders at the leaves below `root`, in leaf order.
///
/// Only unknown attestations carrying the Bitcoin `OP_RETURN` tag qualify;
/// resolved block header attestations are never returned.
pub fn pending_placeholders(
    graph: &TimestampGraph,
    root: NodeId,
) -> Result<Vec<Placeholder>, GraphError> {
    let mut pending = Vec::new();
    for leaf in graph.directly_verified(root)? {
        let message = graph.message(leaf)?;
        for attestation in graph.attestations_of(leaf)? {
            match attestation {
                Attestation::Unknown { tag, payload } if *tag == BITCOIN_OP_RETURN_TAG => {
                    pending.push(Placeholder {
                        leaf,
                        attestation: attestation.clone(),
                        tx_hash: encode_hex(payload),
                        message: message.to_vec(),
                    });
                }
                Attestation::Unknown { tag, .. } => {
                    tracing::debug!(leaf = %leaf, tag = %encode_hex(tag), "unknown attestation tag, not resolvable");
                }
                Attestation::BitcoinBlockHeader { .. } => {}
            }
        }
    }
    Ok(pending)
}

/// Resolve one placeholder against a single source.
pub async fn resolve(
    source: &dyn BlockSource,
    tx_hash: &str,
    message: &[u8],
    timeout: Duration,
) -> Result<Resolution, ResolveError> {
    let backend = source.name();

    let raw_hex = bounded(backend, "raw_tx", timeout, source.raw_tx(tx_hash)).await?;
    let raw = decode_hex(&raw_hex).map_err(|e| SourceError::Malformed {
        backend: backend.to_string(),
        reason: e.to_string(),
    })?;

    let positions = find_all(&raw, message);
    let Some(&position) = positions.first() else {
        return Err(ResolveError::PayloadNotFound {
            tx_hash: tx_hash.to_string(),
            payload: encode_hex(message),
        });
    };
    if positions.len() > 1 {
        tracing::warn!(tx_hash, matches = positions.len(), "payload occurs more than once, using the first");
    }

    let (mut fragment, root) = TimestampGraph::with_root(message.to_vec());
    let mut tx_node = root;
    let prefix = &raw[..position];
    let suffix = &raw[position + message.len()..];
    if !prefix.is_empty() {
        tx_node = fragment.add_edge(tx_node, Op::Prepend(prefix.to_vec()))?;
    }
    if !suffix.is_empty() {
        tx_node = fragment.add_edge(tx_node, Op::Append(suffix.to_vec()))?;
    }
    tx_node = fragment.add_edge(tx_node, Op::Sha256)?;
    tx_node = fragment.add_edge(tx_node, Op::Sha256)?;

    let txid = reversed(&decode_hex(tx_hash).map_err(|e| SourceError::Malformed {
        backend: backend.to_string(),
        reason: e.to_string(),
    })?);
    if fragment.message(tx_node)? != txid.as_slice() {
        return Err(ResolveError::TxidMismatch {
            tx_hash: tx_hash.to_string(),
            computed: encode_hex(&reversed(fragment.message(tx_node)?)),
        });
    }

    let info = bounded(backend, "tx", timeout, source.tx(tx_hash)).await?;
    let block = bounded(backend, "block", timeout, source.block(&info.blockhash)).await?;
    tracing::debug!(tx_hash, block_hash = %info.blockhash, height = block.height, txs = block.tx.len(), "block fetched");

    let mut leaves = Vec::with_capacity(block.tx.len());
    let mut matching = None;
    for id in &block.tx {
        let bytes = decode_hex(id).map_err(|e| SourceError::Malformed {
            backend: backend.to_string(),
            reason: e.to_string(),
        })?;
        let leaf = fragment.add_node(reversed(&bytes));
        if matching.is_none() && id.eq_ignore_ascii_case(tx_hash) {
            matching = Some(leaf);
        }
        leaves.push(leaf);
    }

    let tip = build_merkle_tree(&mut fragment, &leaves)?.ok_or_else(|| ResolveError::EmptyBlock {
        block_hash: info.blockhash.clone(),
    })?;
    let header_root = decode_hex(&block.merkleroot).map_err(|e| SourceError::Malformed {
        backend: backend.to_string(),
        reason: e.to_string(),
    })?;
    if fragment.message(tip)? != reversed(&header_root).as_slice() {
        return Err(ResolveError::MerkleMismatch {
            block_hash: info.blockhash,
            expected: block.merkleroot.to_ascii_lowercase(),
            computed: encode_hex(&reversed(fragment.message(tip)?)),
        });
    }
    let matching = matching.ok_or_else(|| ResolveError::TxNotInBlock {
        tx_hash: tx_hash.to_string(),
        block_hash: info.blockhash.clone(),
    })?;

    let attestation = Attestation::BitcoinBlockHeader {
        height: block.height,
    };
    if matching == tip {
        // Single-transaction block: the txid is the Merkle root.
        fragment.attest(tx_node, attestation)?;
    } else {
        fragment.attest(tip, attestation)?;
        fragment.replace_edges(tx_node, matching)?;
    }

    Ok(Resolution {
        tx_hash: tx_hash.to_string(),
        block_hash: info.blockhash,
        height: block.height,
        backend: backend.to_string(),
        graph: fragment,
        root,
    })
}

/// Byte offsets of every occurrence of `needle` in `haystack`.
fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(offset, _)| offset)
        .collect()
}

async fn bounded<T>(
    backend: &str,
    call: &'static str,
    limit: Duration,
    request: impl Future<Output = Result<T, SourceError>>,
) -> Result<T, ResolveError> {
    match tokio::time::timeout(limit, request).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ResolveError::Timeout {
            backend: backend.to_string(),
            call,
            after: limit,
        }),
    }
}

/// The data sources available to a resolver.
#[derive(Clone)]
pub struct Sources {
    /// Locally trusted node, if one is configured.
    pub full_node: Option<Arc<dyn BlockSource>>,
    /// Public explorer.
    pub lite: Arc<dyn BlockSource>,
}

impl std::fmt::Debug for Sources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sources")
            .field("full_node", &self.full_node.as_ref().map(|s| s.name().to_string()))
            .field("lite", &self.lite.name())
            .finish()
    }
}

/// Resolves placeholders against a full node with lite fallback.
#[derive(Debug, Clone)]
pub struct Resolver {
    sources: Sources,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(sources: Sources, config: ResolverConfig) -> Self {
        Self { sources, config }
    }

    /// Resolve one transaction, falling back from full node to lite.
    ///
    /// Fails with [`ResolveError::ResolutionFailed`] carrying the error of
    /// every attempted source.
    pub async fn resolve_with_fallback(
        &self,
        tx_hash: &str,
        message: &[u8],
    ) -> Result<Resolution, ResolveError> {
        let timeout = self.config.request_timeout;

        let full_node = if self.config.prefer_lite {
            tracing::debug!(tx_hash, "lite source preferred, skipping full node");
            None
        } else {
            match &self.sources.full_node {
                Some(node) => {
                    tracing::info!(tx_hash, source = node.name(), "resolving via full node");
                    match resolve(node.as_ref(), tx_hash, message, timeout).await {
                        Ok(resolution) => return Ok(resolution),
                        Err(e) => {
                            tracing::warn!(tx_hash, source = node.name(), error = %e, "full node failed, falling back to lite");
                            Some(Box::new(e))
                        }
                    }
                }
                None => {
                    tracing::warn!(tx_hash, "no full node configured, falling back to lite");
                    Some(Box::new(ResolveError::Source(SourceError::Unavailable {
                        backend: FULL_NODE.to_string(),
                        reason: "not configured".to_string(),
                    })))
                }
            }
        };

        let lite = self.sources.lite.as_ref();
        tracing::info!(tx_hash, source = lite.name(), "resolving via lite source");
        match resolve(lite, tx_hash, message, timeout).await {
            Ok(resolution) => Ok(resolution),
            Err(e) => Err(ResolveError::ResolutionFailed {
                tx_hash: tx_hash.to_string(),
                full_node,
                lite: Box::new(e),
            }),
        }
    }

    /// Resolve every placeholder below `root` concurrently and apply the
    /// results to `graph`.
    ///
    /// One task per placeholder. All tasks run to completion; if any
    /// failed, the first error in completion order is returned and `graph`
    /// is not modified. Otherwise each fragment is grafted onto its leaf
    /// and the placeholder attestation is removed.
    pub async fn resolve_all(
        &self,
        graph: &mut TimestampGraph,
        root: NodeId,
    ) -> Result<Vec<Resolved>, ResolveError> {
        let pending = pending_placeholders(graph, root)?;
        tracing::info!(placeholders = pending.len(), "resolving placeholders");

        let mut tasks = JoinSet::new();
        for (index, placeholder) in pending.into_iter().enumerate() {
            let resolver = self.clone();
            tasks.spawn(async move {
                let result = resolver
                    .resolve_with_fallback(&placeholder.tx_hash, &placeholder.message)
                    .await;
                (index, placeholder, result)
            });
        }

        let mut completed = Vec::new();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, placeholder, Ok(resolution))) => {
                    completed.push((index, placeholder, resolution));
                }
                Ok((_, placeholder, Err(e))) => {
                    tracing::warn!(tx_hash = %placeholder.tx_hash, error = %e, "placeholder unresolved");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(ResolveError::Task(e.to_string()));
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        completed.sort_by_key(|(index, _, _)| *index);
        let mut resolved = Vec::with_capacity(completed.len());
        for (_, placeholder, resolution) in completed {
            graph.graft(placeholder.leaf, &resolution.graph, resolution.root)?;
            graph.remove_attestation(placeholder.leaf, &placeholder.attestation)?;
            tracing::info!(
                tx_hash = %resolution.tx_hash,
                height = resolution.height,
                source = %resolution.backend,
                "placeholder resolved"
            );
            resolved.push(Resolved {
                leaf: placeholder.leaf,
                tx_hash: resolution.tx_hash,
                height: resolution.height,
                backend: resolution.backend,
            });
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_all_is_byte_aligned() {
        assert_eq!(find_all(&[0x01, 0x12, 0x23], &[0x12]), vec![1]);
        // "12" spans a nibble boundary in the hex form "011223" only.
        assert!(find_all(&[0x01, 0x23], &[0x12]).is_empty());
        assert_eq!(find_all(&[0xaa, 0xaa, 0xaa], &[0xaa, 0xaa]), vec![0, 1]);
        assert!(find_all(&[0xaa], &[]).is_empty());
        assert!(find_all(&[0xaa], &[0xaa, 0xbb]).is_empty());
    }

    #[test]
    fn placeholders_skip_foreign_tags_and_block_headers() {
        let (mut graph, root) = TimestampGraph::with_root(vec![0x01]);
        let leaf = graph.add_edge(root, Op::Sha256).unwrap();
        graph
            .attest(leaf, Attestation::bitcoin_op_return(vec![0xab]))
            .unwrap();
        graph
            .attest(
                leaf,
                Attestation::Unknown {
                    tag: [0; 8],
                    payload: vec![0xcd],
                },
            )
            .unwrap();
        graph
            .attest(leaf, Attestation::BitcoinBlockHeader { height: 1 })
            .unwrap();

        let pending = pending_placeholders(&graph, root).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].leaf, leaf);
        assert_eq!(pending[0].tx_hash, "ab");
        assert_eq!(pending[0].message, graph.message(leaf).unwrap());
    }
}

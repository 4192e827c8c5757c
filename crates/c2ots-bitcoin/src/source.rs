//! # Block Data Sources
//!
//! The [`BlockSource`] trait is the only way the resolver learns about the
//! chain. It mirrors the three calls every Bitcoin backend offers, whether a
//! local node over RPC or a public explorer over HTTP:
//!
//! | Call | Node RPC | Explorer |
//! |---|---|---|
//! | [`raw_tx`](BlockSource::raw_tx) | `getrawtransaction` | `/rawtx/{txid}` |
//! | [`tx`](BlockSource::tx) | `getrawtransaction … true` | `/tx/{txid}` |
//! | [`block`](BlockSource::block) | `getblock` | `/block/{hash}` |
//!
//! Hashes are exchanged in display (reversed) hex order, as both kinds of
//! backend do. [`MemoryBlockSource`] answers from an in-process snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// The part of a transaction lookup the resolver needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    /// Hash of the block that confirmed the transaction.
    pub blockhash: String,
}

/// The part of a block lookup the resolver needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    /// Merkle root from the block header, display order.
    pub merkleroot: String,
    /// Transaction ids in block order, display order.
    pub tx: Vec<String>,
}

/// A provider of Bitcoin transaction and block data.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Serialized transaction as hex.
    async fn raw_tx(&self, tx_hash: &str) -> Result<String, SourceError>;

    /// Confirmation data for a transaction.
    async fn tx(&self, tx_hash: &str) -> Result<TxInfo, SourceError>;

    /// Header and transaction list of a block.
    async fn block(&self, block_hash: &str) -> Result<BlockInfo, SourceError>;
}

/// Serialized chain data, keyed by display-order hex hashes.
///
/// ```json
/// {
///   "rawtx":  { "<txid>": "<raw tx hex>" },
///   "tx":     { "<txid>": { "blockhash": "<hash>" } },
///   "blocks": { "<hash>": { "height": 1, "merkleroot": "<hex>", "tx": ["<txid>"] } }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainSnapshot {
    #[serde(default)]
    pub rawtx: HashMap<String, String>,
    #[serde(default)]
    pub tx: HashMap<String, TxInfo>,
    #[serde(default)]
    pub blocks: HashMap<String, BlockInfo>,
}

/// In-process block source backed by a [`ChainSnapshot`].
///
/// Used for offline resolution against exported chain data and in tests.
/// Lookups are case-insensitive on the hash.
#[derive(Debug, Clone)]
pub struct MemoryBlockSource {
    name: String,
    snapshot: ChainSnapshot,
}

impl MemoryBlockSource {
    /// An empty source.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_snapshot(name, ChainSnapshot::default())
    }

    /// A source answering from `snapshot`.
    pub fn from_snapshot(name: impl Into<String>, snapshot: ChainSnapshot) -> Self {
        let snapshot = ChainSnapshot {
            rawtx: lowercase_keys(snapshot.rawtx),
            tx: lowercase_keys(snapshot.tx),
            blocks: lowercase_keys(snapshot.blocks),
        };
        Self {
            name: name.into(),
            snapshot,
        }
    }

    /// Parse a JSON chain snapshot.
    pub fn from_json(name: impl Into<String>, input: &str) -> Result<Self, SourceError> {
        let name = name.into();
        let snapshot: ChainSnapshot =
            serde_json::from_str(input).map_err(|e| SourceError::Malformed {
                backend: name.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_snapshot(name, snapshot))
    }

    /// Record a confirmed transaction.
    pub fn insert_transaction(
        &mut self,
        tx_hash: &str,
        raw_hex: impl Into<String>,
        block_hash: &str,
    ) {
        let key = tx_hash.to_ascii_lowercase();
        self.snapshot.rawtx.insert(key.clone(), raw_hex.into());
        self.snapshot.tx.insert(
            key,
            TxInfo {
                blockhash: block_hash.to_string(),
            },
        );
    }

    /// Record a block.
    pub fn insert_block(&mut self, block_hash: &str, block: BlockInfo) {
        self.snapshot
            .blocks
            .insert(block_hash.to_ascii_lowercase(), block);
    }

    fn not_found(&self, kind: &'static str, id: &str) -> SourceError {
        SourceError::NotFound {
            backend: self.name.clone(),
            kind,
            id: id.to_string(),
        }
    }
}

fn lowercase_keys<V>(map: HashMap<String, V>) -> HashMap<String, V> {
    map.into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect()
}

#[async_trait]
impl BlockSource for MemoryBlockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn raw_tx(&self, tx_hash: &str) -> Result<String, SourceError> {
        self.snapshot
            .rawtx
            .get(&tx_hash.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| self.not_found("transaction", tx_hash))
    }

    async fn tx(&self, tx_hash: &str) -> Result<TxInfo, SourceError> {
        self.snapshot
            .tx
            .get(&tx_hash.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| self.not_found("transaction", tx_hash))
    }

    async fn block(&self, block_hash: &str) -> Result<BlockInfo, SourceError> {
        self.snapshot
            .blocks
            .get(&block_hash.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| self.not_found("block", block_hash))
    }
}

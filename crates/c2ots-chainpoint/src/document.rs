//! # Chainpoint Proof Documents
//!
//! Typed models for the two supported Chainpoint receipt versions and the
//! header check that selects between them.
//!
//! ## Version 2
//!
//! ```json
//! {
//!   "@context": "https://w3id.org/chainpoint/v2",
//!   "type": "ChainpointSHA256v2",
//!   "targetHash": "<hex>",
//!   "merkleRoot": "<hex>",
//!   "proof": [{"left": "<hex>"}, {"right": "<hex>"}],
//!   "anchors": [{"type": "BTCOpReturn", "sourceId": "<txid>"}]
//! }
//! ```
//!
//! ## Version 3
//!
//! ```json
//! {
//!   "@context": "https://w3id.org/chainpoint/v3",
//!   "type": "Chainpoint",
//!   "hash": "<hex>",
//!   "branches": [{
//!     "label": "cal_anchor_branch",
//!     "ops": [{"l": "node_id:..."}, {"op": "sha-256"}, {"anchors": [...]}],
//!     "branches": [{"label": "btc_anchor_branch", "ops": [...]}]
//!   }]
//! }
//! ```
//!
//! Proof steps and branch operations are closed enums: each JSON object has
//! exactly one key, which selects the variant.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ChainpointError;

/// `@context` of a Chainpoint v2 receipt.
pub const CHAINPOINT_V2_CONTEXT: &str = "https://w3id.org/chainpoint/v2";
/// `type` of a Chainpoint v2 receipt.
pub const CHAINPOINT_V2_TYPE: &str = "ChainpointSHA256v2";
/// `@context` of a Chainpoint v3 proof.
pub const CHAINPOINT_V3_CONTEXT: &str = "https://w3id.org/chainpoint/v3";
/// `type` of a Chainpoint v3 proof.
pub const CHAINPOINT_V3_TYPE: &str = "Chainpoint";

/// Label of the calendar branch in a v3 proof.
pub const CAL_ANCHOR_BRANCH: &str = "cal_anchor_branch";
/// Label of the Bitcoin branch nested under the calendar branch.
pub const BTC_ANCHOR_BRANCH: &str = "btc_anchor_branch";

/// A parsed Chainpoint proof of either supported version.
#[derive(Debug, Clone)]
pub enum ChainpointDocument {
    /// Chainpoint v2 receipt.
    V2(ChainpointV2),
    /// Chainpoint v3 proof.
    V3(ChainpointV3),
}

impl ChainpointDocument {
    /// Parse a JSON document, rejecting unsupported headers before looking
    /// at the body.
    pub fn from_json(input: &str) -> Result<Self, ChainpointError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Detect the version from `@context` and `type`, then decode the body.
    pub fn from_value(value: Value) -> Result<Self, ChainpointError> {
        let context = value.get("@context").and_then(Value::as_str);
        let kind = value.get("type").and_then(Value::as_str);

        match (context, kind) {
            (Some(CHAINPOINT_V2_CONTEXT), Some(CHAINPOINT_V2_TYPE)) => {
                if value.get("anchors").is_none() {
                    return Err(ChainpointError::UnsupportedFormat(
                        "chainpoint v2 receipts without anchors are not supported".into(),
                    ));
                }
                Ok(Self::V2(serde_json::from_value(value)?))
            }
            (Some(CHAINPOINT_V3_CONTEXT), Some(CHAINPOINT_V3_TYPE)) => {
                Ok(Self::V3(serde_json::from_value(value)?))
            }
            (Some(CHAINPOINT_V2_CONTEXT), other) => Err(ChainpointError::UnsupportedFormat(
                format!("chainpoint v2 type must be {CHAINPOINT_V2_TYPE}, got {other:?}"),
            )),
            (Some(CHAINPOINT_V3_CONTEXT), other) => Err(ChainpointError::UnsupportedFormat(
                format!("chainpoint v3 type must be {CHAINPOINT_V3_TYPE}, got {other:?}"),
            )),
            (other, _) => Err(ChainpointError::UnsupportedFormat(format!(
                "unrecognized @context {other:?}"
            ))),
        }
    }

    /// Short version label for logs.
    pub fn version(&self) -> &'static str {
        match self {
            Self::V2(_) => "chainpoint-v2",
            Self::V3(_) => "chainpoint-v3",
        }
    }

    /// The digest the proof starts from.
    pub fn target_hash(&self) -> &str {
        match self {
            Self::V2(doc) => &doc.target_hash,
            Self::V3(doc) => &doc.hash,
        }
    }
}

// -- Version 2 ----------------------------------------------------------------

/// Chainpoint v2 receipt body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainpointV2 {
    pub target_hash: String,
    pub merkle_root: String,
    #[serde(default)]
    pub proof: Vec<ProofStep>,
    pub anchors: Vec<AnchorV2>,
}

/// One sibling in a v2 proof path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofStep {
    /// Sibling on the left: `SHA256(sibling || current)`.
    Left(String),
    /// Sibling on the right: `SHA256(current || sibling)`.
    Right(String),
}

/// A v2 anchor: where the Merkle root was published.
#[derive(Debug, Clone, Deserialize)]
pub struct AnchorV2 {
    #[serde(rename = "type")]
    pub kind: AnchorKind,
    #[serde(rename = "sourceId")]
    pub source_id: String,
}

/// Anchor systems known to the migration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AnchorKind {
    /// Bitcoin `OP_RETURN`; `sourceId` is the transaction hash.
    BtcOpReturn,
    /// Any other system; carried through for logging only.
    Other(String),
}

impl From<String> for AnchorKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "BTCOpReturn" => Self::BtcOpReturn,
            _ => Self::Other(value),
        }
    }
}

// -- Version 3 ----------------------------------------------------------------

/// Chainpoint v3 proof body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainpointV3 {
    pub hash: String,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl ChainpointV3 {
    /// The top-level calendar branch.
    pub fn calendar_branch(&self) -> Option<&Branch> {
        self.branches.iter().find(|b| b.label == CAL_ANCHOR_BRANCH)
    }
}

/// A labeled list of operations, possibly with nested branches.
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub label: String,
    #[serde(default)]
    pub ops: Vec<BranchOp>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl Branch {
    /// The nested Bitcoin branch, if this calendar branch has one.
    pub fn bitcoin_branch(&self) -> Option<&Branch> {
        self.branches.iter().find(|b| b.label == BTC_ANCHOR_BRANCH)
    }
}

/// One entry of a v3 `ops` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum BranchOp {
    /// `{"l": v}`: prepend the byte encoding of `v`.
    #[serde(rename = "l")]
    Prepend(String),
    /// `{"r": v}`: append the byte encoding of `v`.
    #[serde(rename = "r")]
    Append(String),
    /// `{"op": "sha-256" | "sha-256-x2"}`.
    #[serde(rename = "op")]
    Hash(HashOp),
    /// `{"anchors": [...]}`: anchors declared at this exact position.
    #[serde(rename = "anchors")]
    Anchors(Vec<AnchorV3>),
}

/// Hash operations allowed in v3 proofs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HashOp {
    #[serde(rename = "sha-256")]
    Sha256,
    #[serde(rename = "sha-256-x2")]
    Sha256x2,
}

/// A v3 anchor entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnchorV3 {
    /// `cal`, `btc`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// For `btc` anchors, the block height.
    pub anchor_id: String,
}

//! # Document Migration Tests
//!
//! End-to-end migration of the fixture receipts, plus a property check that
//! any single-bit change to a v2 receipt's root or path is rejected.

use c2ots_chainpoint::{
    migrate, recompute_merkle_root_v2, recompute_merkle_root_v3, ChainpointDocument,
    ChainpointError,
};
use c2ots_core::{decode_hex, encode_hex, Attestation, Op, BITCOIN_OP_RETURN_TAG};
use proptest::prelude::*;
use serde_json::Value;

const V2_FIXTURE: &str = include_str!("fixtures/chainpoint_v2.json");
const V3_FIXTURE: &str = include_str!("fixtures/chainpoint_v3.json");

const V2_ROOT: &str = "51296468ea48ddbcc546abb85b935c73058fd8acdb0b953da6aa1ae966581a7a";
const V2_TX: &str = "37d3d1c5c901caf76bde4e894b89893f252e6a62fb33a3798e33a733cebe04b8";
const V3_CAL_ROOT: &str = "c4cd647c1df8f672e1e2fd186df4fa78d94e0d5af77f7b91a9199358149d3425";
const V3_BTC_ROOT: &str = "ea4b1aefbf18f3c353c2c03b3c220cf4f358c6a02c0ad8919e62facf072e451e";

#[test]
fn v2_fixture_migrates_to_a_single_placeholder_leaf() {
    let doc = ChainpointDocument::from_json(V2_FIXTURE).unwrap();
    let migration = migrate(&doc).unwrap();
    let graph = &migration.graph;

    let leaves = graph.leaves(migration.root).unwrap();
    assert_eq!(leaves.len(), 1);
    assert_eq!(encode_hex(graph.message(leaves[0]).unwrap()), V2_ROOT);

    let expected = Attestation::Unknown {
        tag: BITCOIN_OP_RETURN_TAG,
        payload: decode_hex(V2_TX).unwrap(),
    };
    assert_eq!(
        graph.all_attestations(migration.root).unwrap(),
        vec![(leaves[0], expected)]
    );
    assert_eq!(graph.directly_verified(migration.root).unwrap(), leaves);

    let rendered = migration.render().unwrap();
    assert!(rendered.starts_with("# bdf8c9bd"));
    assert!(rendered.contains(&format!("verify UnknownAttestation 687fe3fe795e9a0d {V2_TX}")));
}

#[test]
fn v2_path_replays_to_the_declared_root() {
    let doc = ChainpointDocument::from_json(V2_FIXTURE).unwrap();
    let migration = migrate(&doc).unwrap();
    let graph = &migration.graph;

    let mut cursor = migration.root;
    let mut message = graph.message(cursor).unwrap().to_vec();
    let mut names = Vec::new();
    while let Some((op, child)) = graph.edges(cursor).unwrap().first() {
        names.push(op.name());
        message = op.apply(&message);
        cursor = *child;
    }
    assert_eq!(
        names,
        vec!["prepend", "sha256", "prepend", "sha256", "append", "sha256"]
    );
    // Replaying the operations reproduces the declared root.
    assert_eq!(encode_hex(&message), V2_ROOT);
}

#[test]
fn v3_fixture_joins_calendar_and_bitcoin_chains() {
    let doc = ChainpointDocument::from_json(V3_FIXTURE).unwrap();
    let ChainpointDocument::V3(v3) = &doc else {
        panic!("expected a v3 document");
    };
    let calendar = v3.calendar_branch().unwrap();
    assert_eq!(
        recompute_merkle_root_v3(&v3.hash, &calendar.ops).unwrap(),
        V3_CAL_ROOT
    );
    let bitcoin = calendar.bitcoin_branch().unwrap();
    assert_eq!(
        recompute_merkle_root_v3(V3_CAL_ROOT, &bitcoin.ops).unwrap(),
        V3_BTC_ROOT
    );

    let migration = migrate(&doc).unwrap();
    let graph = &migration.graph;
    let leaves = graph.leaves(migration.root).unwrap();
    assert_eq!(leaves.len(), 1);
    assert_eq!(encode_hex(graph.message(leaves[0]).unwrap()), V3_BTC_ROOT);

    // Inline btc anchors are already resolved.
    assert_eq!(
        graph.all_attestations(migration.root).unwrap(),
        vec![(leaves[0], Attestation::BitcoinBlockHeader { height: 500_000 })]
    );
    assert!(graph.directly_verified(migration.root).unwrap().is_empty());
}

#[test]
fn v3_non_hex_siblings_are_utf8_prepends() {
    let doc = ChainpointDocument::from_json(V3_FIXTURE).unwrap();
    let migration = migrate(&doc).unwrap();
    let first = &migration.graph.edges(migration.root).unwrap()[0].0;
    assert_eq!(
        first,
        &Op::Prepend(b"node_id:52f3a4c0-3c22-11e8-9f6b-01ab3e2a4f1d".to_vec())
    );
}

#[test]
fn v3_tampered_calendar_sibling_changes_the_reached_root() {
    let mut value: Value = serde_json::from_str(V3_FIXTURE).unwrap();
    value["branches"][0]["ops"][2]["l"] = Value::String("core_id:1a2c".into());
    let doc = ChainpointDocument::from_value(value).unwrap();
    let migration = migrate(&doc).unwrap();
    let leaves = migration.graph.leaves(migration.root).unwrap();
    assert_ne!(encode_hex(migration.graph.message(leaves[0]).unwrap()), V3_BTC_ROOT);
}

#[test]
fn unsupported_type_is_rejected_before_reduction() {
    let mut value: Value = serde_json::from_str(V2_FIXTURE).unwrap();
    value["type"] = Value::String("ChainpointSHA3v2".into());
    assert!(matches!(
        ChainpointDocument::from_value(value),
        Err(ChainpointError::UnsupportedFormat(_))
    ));
}

fn flip_bit(hex: &str, bit: usize) -> String {
    let mut bytes = decode_hex(hex).unwrap();
    let index = (bit / 8) % bytes.len();
    bytes[index] ^= 1 << (bit % 8);
    encode_hex(&bytes)
}

proptest! {
    /// Flipping any one bit of the declared root fails validation.
    #[test]
    fn v2_root_bit_flip_is_rejected(bit in 0usize..256) {
        let mut value: Value = serde_json::from_str(V2_FIXTURE).unwrap();
        value["merkleRoot"] = Value::String(flip_bit(V2_ROOT, bit));
        let doc = ChainpointDocument::from_value(value).unwrap();
        let is_invalid_root = matches!(migrate(&doc), Err(ChainpointError::InvalidMerkleRoot { .. }));
        prop_assert!(is_invalid_root);
    }

    /// Flipping any one bit of any proof sibling fails validation.
    #[test]
    fn v2_sibling_bit_flip_is_rejected(step in 0usize..3, bit in 0usize..256) {
        let mut value: Value = serde_json::from_str(V2_FIXTURE).unwrap();
        let entry = value["proof"][step].as_object_mut().unwrap();
        let sibling = entry.values_mut().next().unwrap();
        let flipped = flip_bit(sibling.as_str().unwrap(), bit);
        *sibling = Value::String(flipped);

        let doc = ChainpointDocument::from_value(value).unwrap();
        let ChainpointDocument::V2(v2) = &doc else {
            panic!("expected a v2 document");
        };
        prop_assert_ne!(recompute_merkle_root_v2(&v2.target_hash, &v2.proof).unwrap(), V2_ROOT);
        let is_invalid_root = matches!(migrate(&doc), Err(ChainpointError::InvalidMerkleRoot { .. }));
        prop_assert!(is_invalid_root);
    }
}

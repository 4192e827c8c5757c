//! Merkle root recomputation for self-validating proofs.
//!
//! Both walks run without touching a graph, so a document can be checked
//! before anything is built from it.

use c2ots_core::{decode_hex, encode_hex, sha256};

use crate::document::{BranchOp, HashOp, ProofStep};
use crate::error::ChainpointError;
use crate::reduce::sibling_hex;

/// Walk a v2 proof on bytes: each step hashes `left || right`. Returns the
/// lowercase hex root.
pub fn recompute_merkle_root_v2(
    target_hash: &str,
    proof: &[ProofStep],
) -> Result<String, ChainpointError> {
    let mut current = decode_hex(target_hash)?;
    for step in proof {
        let mut buf = Vec::with_capacity(64);
        match step {
            ProofStep::Left(sibling) => {
                buf.extend_from_slice(&decode_hex(sibling)?);
                buf.extend_from_slice(&current);
            }
            ProofStep::Right(sibling) => {
                buf.extend_from_slice(&current);
                buf.extend_from_slice(&decode_hex(sibling)?);
            }
        }
        current = sha256(&buf).to_vec();
    }
    Ok(encode_hex(&current))
}

/// Walk a v3 op list on hex strings: `l` / `r` concatenate the sibling's hex
/// form, hash ops digest the decoded bytes. Anchor entries do not affect the
/// walk. Returns the lowercase hex root.
pub fn recompute_merkle_root_v3(start: &str, ops: &[BranchOp]) -> Result<String, ChainpointError> {
    let mut current = start.trim().to_ascii_lowercase();
    for op in ops {
        current = match op {
            BranchOp::Prepend(sibling) => format!("{}{current}", sibling_hex(sibling)),
            BranchOp::Append(sibling) => format!("{current}{}", sibling_hex(sibling)),
            BranchOp::Hash(HashOp::Sha256) => encode_hex(&sha256(&decode_hex(&current)?)),
            BranchOp::Hash(HashOp::Sha256x2) => {
                let once = sha256(&decode_hex(&current)?);
                encode_hex(&sha256(&once))
            }
            BranchOp::Anchors(_) => continue,
        };
    }
    Ok(current)
}

/// Compare a declared root with a computed one, ignoring hex case.
pub fn check_root(expected: &str, computed: &str) -> Result<(), ChainpointError> {
    if expected.trim().eq_ignore_ascii_case(computed) {
        Ok(())
    } else {
        Err(ChainpointError::InvalidMerkleRoot {
            expected: expected.trim().to_ascii_lowercase(),
            computed: computed.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "bdf8c9bdf076d6aff0292a1c9448691d2ae283f2ce41b045355e2c8cb8e85ef2";
    const SIBLING: &str = "cb0dbbedb5ec5363e39be9fc43f56f321e1572cfcf304d26fc67cb6ea2e49faf";

    #[test]
    fn v2_known_vector() {
        let proof = vec![
            ProofStep::Left(TARGET.into()),
            ProofStep::Left(SIBLING.into()),
            ProofStep::Right(SIBLING.into()),
        ];
        assert_eq!(
            recompute_merkle_root_v2(TARGET, &proof).unwrap(),
            "51296468ea48ddbcc546abb85b935c73058fd8acdb0b953da6aa1ae966581a7a"
        );
    }

    #[test]
    fn empty_path_returns_target() {
        assert_eq!(recompute_merkle_root_v2(TARGET, &[]).unwrap(), TARGET);
        assert_eq!(recompute_merkle_root_v3(TARGET, &[]).unwrap(), TARGET);
    }

    #[test]
    fn v3_walk_matches_byte_semantics() {
        let ops = vec![
            BranchOp::Prepend("node_id:abc".into()),
            BranchOp::Hash(HashOp::Sha256),
            BranchOp::Append(SIBLING.into()),
            BranchOp::Anchors(vec![]),
            BranchOp::Hash(HashOp::Sha256x2),
        ];
        let mut bytes = b"node_id:abc".to_vec();
        bytes.extend_from_slice(&decode_hex(TARGET).unwrap());
        let mut step = sha256(&bytes).to_vec();
        step.extend_from_slice(&decode_hex(SIBLING).unwrap());
        let expected = sha256(&sha256(&step));

        assert_eq!(
            recompute_merkle_root_v3(TARGET, &ops).unwrap(),
            encode_hex(&expected)
        );
    }

    #[test]
    fn check_root_is_case_insensitive() {
        check_root(&TARGET.to_ascii_uppercase(), TARGET).unwrap();
        let err = check_root(SIBLING, TARGET).unwrap_err();
        assert!(matches!(err, ChainpointError::InvalidMerkleRoot { .. }));
    }
}

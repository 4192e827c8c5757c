//! Timestamp operations: the byte transformations carried on graph edges.

use std::fmt;

use crate::digest::{encode_hex, sha256};

/// An edge operation.
///
/// Binary operations carry a literal argument and concatenate it with the
/// message; unary operations hash the message. Double SHA-256 is expressed as
/// two chained [`Op::Sha256`] edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Op {
    /// `message || arg`
    Append(Vec<u8>),
    /// `arg || message`
    Prepend(Vec<u8>),
    /// `SHA256(message)`
    Sha256,
}

impl Op {
    /// Apply the operation to a message, producing the child message.
    pub fn apply(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Append(arg) => {
                let mut out = Vec::with_capacity(message.len() + arg.len());
                out.extend_from_slice(message);
                out.extend_from_slice(arg);
                out
            }
            Self::Prepend(arg) => {
                let mut out = Vec::with_capacity(arg.len() + message.len());
                out.extend_from_slice(arg);
                out.extend_from_slice(message);
                out
            }
            Self::Sha256 => sha256(message).to_vec(),
        }
    }

    /// The operation name as written in rendered proofs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Append(_) => "append",
            Self::Prepend(_) => "prepend",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append(arg) | Self::Prepend(arg) => {
                write!(f, "{} {}", self.name(), encode_hex(arg))
            }
            Self::Sha256 => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_prepend_concatenate() {
        assert_eq!(Op::Append(vec![3, 4]).apply(&[1, 2]), vec![1, 2, 3, 4]);
        assert_eq!(Op::Prepend(vec![3, 4]).apply(&[1, 2]), vec![3, 4, 1, 2]);
    }

    #[test]
    fn sha256_hashes_message() {
        assert_eq!(Op::Sha256.apply(b"abc"), sha256(b"abc").to_vec());
    }

    #[test]
    fn equal_arguments_are_equal_ops() {
        assert_eq!(Op::Append(vec![1]), Op::Append(vec![1]));
        assert_ne!(Op::Append(vec![1]), Op::Prepend(vec![1]));
    }

    #[test]
    fn display_renders_hex_argument() {
        assert_eq!(Op::Append(vec![0xab, 0x01]).to_string(), "append ab01");
        assert_eq!(Op::Sha256.to_string(), "sha256");
    }
}

//! Dropcraft Merkle
//!
//! Authenticated tree over `(recipient, token, cumulative-amount)` claim
//! triples. Leaves are the double-keccak of the ABI-encoded tuple and node
//! pairs are sorted before hashing, so proofs carry sibling hashes only and
//! any conforming verifier (including the on-chain distributor) accepts
//! them without position bits.

mod tree;

pub use tree::{hash_pair, leaf_hash, verify_proof, ClaimTree};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MerkleError {
    #[error("no claims to process")]
    NoClaims,

    #[error("Leaf index {0} out of range ({1} leaves)")]
    IndexOutOfRange(usize, usize),

    #[error("Malformed distribution blob: {0}")]
    InvalidBlob(String),

    #[error("Dumped node array does not match rebuilt tree")]
    NodeMismatch,
}

pub type Result<T> = std::result::Result<T, MerkleError>;

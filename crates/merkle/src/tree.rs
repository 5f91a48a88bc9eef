//! Claim tree construction, dump/load, and proof generation.
//!
//! Layout: flat array of `2n - 1` nodes, root at index 0, children of node
//! `i` at `2i + 1` and `2i + 2`. Hashed leaves are sorted and placed from
//! the tail of the array backwards; `tree_index` records where each input
//! triple landed so dumped blobs can locate their leaves.

use alloy_primitives::{keccak256, B256};
use alloy_sol_types::SolValue;

use dropcraft_core::{b256_hex, parse_b256, Claim, DistributionBlob, BLOB_FORMAT, LEAF_ENCODING};

use crate::{MerkleError, Result};

/// Leaf formula: `keccak256(keccak256(abi.encode(recipient, token, amount)))`.
///
/// The inner hash prevents a leaf from being reinterpreted as an internal
/// node (second-preimage hardening used by the standard structured-values
/// tree libraries).
pub fn leaf_hash(claim: &Claim) -> B256 {
    let encoded = (claim.recipient, claim.token, claim.amount).abi_encode();
    keccak256(keccak256(&encoded))
}

/// Hash two nodes into their parent, smaller hash first.
pub fn hash_pair(a: &B256, b: &B256) -> B256 {
    let mut buf = [0u8; 64];
    if a <= b {
        buf[..32].copy_from_slice(a.as_slice());
        buf[32..].copy_from_slice(b.as_slice());
    } else {
        buf[..32].copy_from_slice(b.as_slice());
        buf[32..].copy_from_slice(a.as_slice());
    }
    keccak256(buf)
}

/// Verify a sibling-path proof against a root and leaf hash.
///
/// Pair sorting makes the fold position-independent, so the proof is just
/// the sibling hashes bottom-up.
pub fn verify_proof(root: &B256, leaf: &B256, proof: &[B256]) -> bool {
    let mut current = *leaf;
    for sibling in proof {
        current = hash_pair(&current, sibling);
    }
    current == *root
}

/// A Merkle tree over claim triples.
#[derive(Debug, Clone)]
pub struct ClaimTree {
    /// Flat node array, root first, leaves at the tail.
    nodes: Vec<B256>,
    /// Claims in the order they were passed to `build`.
    claims: Vec<Claim>,
    /// Input position -> slot in `nodes`.
    tree_index: Vec<usize>,
}

impl ClaimTree {
    /// Build a tree from claim triples.
    ///
    /// The input order is preserved for `dump()` and `proof()`; internally
    /// leaves are placed in leaf-hash order so the root is canonical for a
    /// given claim set.
    pub fn build(claims: &[Claim]) -> Result<Self> {
        let n = claims.len();
        if n == 0 {
            return Err(MerkleError::NoClaims);
        }

        let mut hashed: Vec<(B256, usize)> = claims
            .iter()
            .enumerate()
            .map(|(i, c)| (leaf_hash(c), i))
            .collect();
        hashed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut nodes = vec![B256::ZERO; 2 * n - 1];
        let mut tree_index = vec![0usize; n];
        for (k, (hash, original)) in hashed.iter().enumerate() {
            let slot = 2 * n - 2 - k;
            nodes[slot] = *hash;
            tree_index[*original] = slot;
        }

        // Internal nodes bottom-up; children are always already filled.
        for i in (0..n - 1).rev() {
            nodes[i] = hash_pair(&nodes[2 * i + 1], &nodes[2 * i + 2]);
        }

        Ok(Self {
            nodes,
            claims: claims.to_vec(),
            tree_index,
        })
    }

    /// The Merkle root.
    pub fn root(&self) -> B256 {
        self.nodes[0]
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claims in input order.
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Node slot of the leaf for input position `index`.
    pub fn slot_of(&self, index: usize) -> Option<usize> {
        self.tree_index.get(index).copied()
    }

    /// Sibling-path proof for the claim at input position `index`.
    pub fn proof(&self, index: usize) -> Result<Vec<B256>> {
        if index >= self.claims.len() {
            return Err(MerkleError::IndexOutOfRange(index, self.claims.len()));
        }

        let mut pos = self.tree_index[index];
        let mut siblings = Vec::new();
        while pos > 0 {
            let sibling = if pos % 2 == 1 { pos + 1 } else { pos - 1 };
            siblings.push(self.nodes[sibling]);
            pos = (pos - 1) / 2;
        }
        Ok(siblings)
    }

    /// Verify a claim + proof against this tree's root.
    pub fn verify(&self, claim: &Claim, proof: &[B256]) -> bool {
        verify_proof(&self.root(), &leaf_hash(claim), proof)
    }

    /// Dump the node array and leaf values for the distribution blob.
    pub fn dump(&self) -> (Vec<String>, Vec<dropcraft_core::LeafValue>) {
        let tree = self.nodes.iter().map(b256_hex).collect();
        let values = self
            .claims
            .iter()
            .zip(&self.tree_index)
            .map(|(claim, slot)| dropcraft_core::LeafValue {
                tree_index: *slot,
                value: claim.to_value(),
            })
            .collect();
        (tree, values)
    }

    /// Reconstruct a tree from a published blob, cross-checking the dumped
    /// node array and leaf positions against a fresh rebuild.
    ///
    /// A blob whose node array or indices disagree with its own values was
    /// tampered with (or produced by a non-conforming writer) and is
    /// rejected; the content-addressed store is not trusted to authenticate
    /// content.
    pub fn load(blob: &DistributionBlob) -> Result<Self> {
        if blob.format != BLOB_FORMAT {
            return Err(MerkleError::InvalidBlob(format!(
                "unsupported format {:?}",
                blob.format
            )));
        }
        if blob.leaf_encoding != LEAF_ENCODING {
            return Err(MerkleError::InvalidBlob(format!(
                "unsupported leaf encoding {:?}",
                blob.leaf_encoding
            )));
        }

        let claims = blob
            .claims()
            .map_err(|e| MerkleError::InvalidBlob(e.to_string()))?;
        let tree = Self::build(&claims)?;

        if blob.tree.len() != tree.nodes.len() {
            return Err(MerkleError::NodeMismatch);
        }
        for (dumped, rebuilt) in blob.tree.iter().zip(&tree.nodes) {
            let dumped = parse_b256(dumped)
                .map_err(|e| MerkleError::InvalidBlob(e.to_string()))?;
            if dumped != *rebuilt {
                return Err(MerkleError::NodeMismatch);
            }
        }
        for (value, slot) in blob.values.iter().zip(&tree.tree_index) {
            if value.tree_index != *slot {
                return Err(MerkleError::NodeMismatch);
            }
        }

        Ok(tree)
    }
}

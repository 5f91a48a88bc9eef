//! Distribution data model
//!
//! A `Claim` is one `(recipient, token, cumulative amount)` triple; the
//! `DistributionBlob` is the published, content-addressed artifact of one
//! round. Amounts travel as decimal strings and addresses as lowercase hex
//! so the JSON is stable and human-auditable.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CoreError, Result};

/// Blob format marker, bumped only on breaking layout changes.
pub const BLOB_FORMAT: &str = "standard-v1";

/// ABI schema of one leaf tuple, in order.
pub const LEAF_ENCODING: [&str; 3] = ["address", "address", "uint256"];

/// A recipient's cumulative lifetime entitlement for one token.
///
/// The on-chain distributor subtracts what was already paid, so amounts are
/// monotonically non-decreasing round over round and a re-published round is
/// a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    /// Reward recipient
    pub recipient: Address,
    /// Reward token
    pub token: Address,
    /// Cumulative entitlement (lifetime total, not a delta)
    pub amount: U256,
}

impl Claim {
    pub fn new(recipient: Address, token: Address, amount: U256) -> Self {
        Self { recipient, token, amount }
    }

    /// Map key for cumulative folding.
    pub fn key(&self) -> (Address, Address) {
        (self.recipient, self.token)
    }

    /// Render as the blob's `[recipient, token, amount]` string triple.
    pub fn to_value(&self) -> [String; 3] {
        [
            addr_hex(&self.recipient),
            addr_hex(&self.token),
            self.amount.to_string(),
        ]
    }

    /// Parse from a blob value triple.
    pub fn from_value(value: &[String; 3]) -> Result<Self> {
        let recipient = parse_address(&value[0])?;
        let token = parse_address(&value[1])?;
        let amount = U256::from_str_radix(&value[2], 10)
            .map_err(|_| CoreError::InvalidAmount(value[2].clone()))?;
        Ok(Self { recipient, token, amount })
    }
}

/// One leaf of the dumped tree: the value triple plus its slot in the
/// flat node array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafValue {
    pub tree_index: usize,
    pub value: [String; 3],
}

/// The published artifact of one round.
///
/// Created once by the publisher, never mutated, referenced by the next
/// round via `prev_tree_cid`. Top-level key order follows field order here
/// and must stay stable for reproducible uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBlob {
    /// Always [`BLOB_FORMAT`]
    pub format: String,
    /// Always [`LEAF_ENCODING`]
    pub leaf_encoding: Vec<String>,
    /// Flat node array of the Merkle tree, 32-byte hex strings
    pub tree: Vec<String>,
    /// Leaf triples in canonical `(recipient, token)` order
    pub values: Vec<LeafValue>,
    /// CID of the prior round's blob, empty for genesis
    pub prev_tree_cid: String,
    /// Snapshot block height of this round
    pub block_number: u64,
    /// token address -> cumulative sum distributed, decimal strings
    pub total_distributed: BTreeMap<String, String>,
}

impl DistributionBlob {
    /// Canonical JSON encoding: stable key order, two-space indentation.
    pub fn to_canonical_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("blob serialization is infallible")
    }

    /// Parse the value triples back into claims, preserving order.
    pub fn claims(&self) -> Result<Vec<Claim>> {
        self.values.iter().map(|v| Claim::from_value(&v.value)).collect()
    }
}

/// Lowercase `0x`-prefixed hex for an address (the blob's address format).
pub fn addr_hex(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr.as_slice()))
}

/// Lowercase `0x`-prefixed hex for a 32-byte hash.
pub fn b256_hex(hash: &B256) -> String {
    format!("0x{}", hex::encode(hash.as_slice()))
}

/// Parse a `0x`-prefixed address, mapping failures to a blob error.
pub fn parse_address(s: &str) -> Result<Address> {
    s.parse::<Address>()
        .map_err(|_| CoreError::InvalidAddress(s.to_string()))
}

/// Parse a `0x`-prefixed 32-byte hash, mapping failures to a blob error.
pub fn parse_b256(s: &str) -> Result<B256> {
    s.parse::<B256>().map_err(|_| CoreError::InvalidNode(s.to_string()))
}

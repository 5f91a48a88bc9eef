//! Proof generation and claim submission against a published round.
//!
//! Both flows re-download the blob referenced on chain, rebuild the tree
//! and verify the root before trusting anything in it. Neither mutates the
//! distribution.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use tracing::info;

use dropcraft_chain::TxOutcome;
use dropcraft_core::{addr_hex, b256_hex, parse_b256, Claim};
use dropcraft_merkle::{leaf_hash, verify_proof, ClaimTree};

use crate::{EngineError, Result, RoundEngine};

/// Leaf selector for proof generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofQuery {
    /// Row index in the published `values` order
    Index(usize),
    /// Recipient address (must map to exactly one row)
    Recipient(Address),
}

/// A portable proof artifact (`proof.json`).
///
/// Everything a holder needs to call `claim(...)` later, encoded the same
/// way the blob encodes it: lowercase hex addresses, decimal amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub recipient: String,
    pub token: String,
    pub amount: String,
    pub proof: Vec<String>,
    pub merkle_root: String,
    pub tree_index: usize,
}

impl ProofBundle {
    fn from_parts(claim: &Claim, proof: &[B256], root: B256, tree_index: usize) -> Self {
        Self {
            recipient: addr_hex(&claim.recipient),
            token: addr_hex(&claim.token),
            amount: claim.amount.to_string(),
            proof: proof.iter().map(b256_hex).collect(),
            merkle_root: b256_hex(&root),
            tree_index,
        }
    }

    /// Parse the claim triple back out of the bundle.
    pub fn claim(&self) -> Result<Claim> {
        Claim::from_value(&[
            self.recipient.clone(),
            self.token.clone(),
            self.amount.clone(),
        ])
        .map_err(|e| EngineError::Validation(e.to_string()))
    }

    /// Parse the sibling hashes.
    pub fn proof_hashes(&self) -> Result<Vec<B256>> {
        self.proof
            .iter()
            .map(|s| parse_b256(s).map_err(|e| EngineError::Validation(e.to_string())))
            .collect()
    }

    /// Parse the root the proof was generated against.
    pub fn root(&self) -> Result<B256> {
        parse_b256(&self.merkle_root).map_err(|e| EngineError::Validation(e.to_string()))
    }
}

impl RoundEngine {
    /// Load the currently published round, verified against the on-chain
    /// root.
    pub async fn load_published(&self) -> Result<ClaimTree> {
        let state = self.chain.distribution_state().await?;
        let prev = self.load_previous(&state).await?;
        let round = prev.ok_or_else(|| {
            EngineError::Validation("no distribution has been published yet".to_string())
        })?;
        Ok(ClaimTree::load(&round.blob)?)
    }

    /// All published rows, in `values` order (for `proof --list`).
    pub async fn leaves(&self) -> Result<Vec<(usize, Claim)>> {
        let tree = self.load_published().await?;
        Ok(tree.claims().iter().copied().enumerate().collect())
    }

    /// Generate a proof bundle for one published row.
    pub async fn proof(&self, query: &ProofQuery) -> Result<ProofBundle> {
        let tree = self.load_published().await?;
        let claims = tree.claims();

        let index = match query {
            ProofQuery::Index(i) => {
                if *i >= claims.len() {
                    return Err(EngineError::ProofNotFound(format!(
                        "index {} out of range ({} rows)",
                        i,
                        claims.len()
                    )));
                }
                *i
            }
            ProofQuery::Recipient(addr) => {
                let matches: Vec<usize> = claims
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.recipient == *addr)
                    .map(|(i, _)| i)
                    .collect();
                match matches.as_slice() {
                    [] => {
                        return Err(EngineError::ProofNotFound(format!(
                            "recipient {} has no rows in the published distribution",
                            addr_hex(addr)
                        )))
                    }
                    [single] => *single,
                    many => {
                        return Err(EngineError::AmbiguousProof(format!(
                            "recipient {} has rows at indices {:?}; re-run with --index",
                            addr_hex(addr),
                            many
                        )))
                    }
                }
            }
        };

        let claim = claims[index];
        let proof = tree.proof(index)?;
        let slot = tree
            .slot_of(index)
            .ok_or_else(|| EngineError::ProofNotFound(format!("index {} has no slot", index)))?;

        info!(
            "Proof generated for {} / {} (row {}, {} sibling(s))",
            addr_hex(&claim.recipient),
            addr_hex(&claim.token),
            index,
            proof.len()
        );
        Ok(ProofBundle::from_parts(&claim, &proof, tree.root(), slot))
    }

    /// Submit `claim(...)` from a previously generated proof bundle.
    ///
    /// The proof is checked locally against the bundle's own root first so
    /// a corrupted file fails before gas is spent; the contract enforces
    /// the live root.
    pub async fn submit_claim(&self, bundle: &ProofBundle) -> Result<TxOutcome> {
        let claim = bundle.claim()?;
        let proof = bundle.proof_hashes()?;
        let root = bundle.root()?;

        if !verify_proof(&root, &leaf_hash(&claim), &proof) {
            return Err(EngineError::Validation(
                "proof bundle does not verify against its own merkleRoot".to_string(),
            ));
        }

        self.chain
            .claim(claim.recipient, claim.token, claim.amount, proof)
            .await
            .map_err(EngineError::from)
    }
}

//! Dropcraft Engine
//!
//! The distribution-generation core: reconstructs the previous round from
//! the content-addressed store, discovers the recipient set, reconciles
//! per-token inflow against on-chain balances, apportions pro-rata by
//! wrapper share, folds into cumulative totals and publishes the new
//! `(root, cid)` pair.
//!
//! One invocation is one round. All balance reads and event scans are
//! pinned to a single snapshot block sampled at the start, so re-running a
//! round against the same chain state reproduces the same root. That, not
//! transactional delivery, is what makes publishing idempotent.

mod apportion;
mod fold;
mod proof;
mod recipients;
mod reconcile;
mod round;

pub use apportion::{apportion_token, fee_bps_from_percent, Allocation, SHARE_SCALE};
pub use fold::{fold_cumulative, FoldedRound};
pub use proof::{ProofBundle, ProofQuery};
pub use recipients::build_recipient_set;
pub use reconcile::new_distributable;
pub use round::{EngineConfig, RoundArtifact, RoundEngine};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain error: {0}")]
    Chain(#[from] dropcraft_chain::ChainError),

    #[error("Store error: {0}")]
    Store(#[from] dropcraft_store::StoreError),

    #[error("Merkle error: {0}")]
    Merkle(#[from] dropcraft_merkle::MerkleError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Proof not found: {0}")]
    ProofNotFound(String),

    #[error("Proof selection ambiguous: {0}")]
    AmbiguousProof(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

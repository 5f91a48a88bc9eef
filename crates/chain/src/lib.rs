//! Dropcraft Chain
//!
//! Typed EVM adapter for the distributor, wrapper and reward-token
//! contracts.
//!
//! Supports two modes:
//! - **Mock Mode**: For development/testing without an RPC node. Chain
//!   state (balance histories, events, the published root) lives in-memory
//!   and transactions mutate it the way the contracts would.
//! - **Live Mode**: JSON-RPC against an archive-class endpoint. Historical
//!   `balanceOf` reads are pinned to explicit block tags. There are no
//!   local retries; every RPC or decode failure surfaces to the caller.

mod client;
mod contracts;
mod types;

pub use client::{ChainClient, ChainConfig, ChainMode};
pub use contracts::{IDistributor, IWrapper, IERC20};
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Invalid chain configuration: {0}")]
    InvalidConfig(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Signer required for write operations")]
    SignerRequired,

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;

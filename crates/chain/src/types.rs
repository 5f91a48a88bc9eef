//! Chain adapter types.

use alloy_primitives::{Address, B256, U256};

/// The distributor's published round pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionState {
    /// Merkle root of the current round (zero hash before the first round)
    pub root: B256,
    /// CID of the current round's blob (empty before the first round)
    pub cid: String,
    /// Block at which the contract last accepted a root
    pub last_processed_block: u64,
}

impl DistributionState {
    /// Zero root + empty CID means no round has ever been published.
    pub fn is_genesis(&self) -> bool {
        self.root == B256::ZERO && self.cid.is_empty()
    }
}

/// Outcome of a confirmed write transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: B256,
    pub block_number: u64,
}

/// A `Deposit(sender, owner, assets, shares)` log from the wrapper.
///
/// Used only for recipient discovery; share weights come from `balanceOf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    pub block: u64,
    pub sender: Address,
    pub owner: Address,
    pub assets: U256,
    pub shares: U256,
}

/// A `Claimed(recipient, token, amount)` log from the distributor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedEvent {
    pub block: u64,
    pub recipient: Address,
    pub token: Address,
    pub amount: U256,
}

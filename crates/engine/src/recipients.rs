//! Candidate recipient discovery.
//!
//! The round's candidate list is the union of everyone who ever appeared in
//! the previous distribution and every `Deposit` owner since the last
//! processed block. Zero-balance candidates fall out later during
//! apportionment; here only the zero address is dropped.

use std::collections::BTreeSet;

use alloy_primitives::Address;
use tracing::debug;

use dropcraft_chain::ChainClient;
use dropcraft_core::DistributionBlob;

use crate::{EngineError, Result};

/// Build the address-ordered candidate list for one round.
///
/// Scans `Deposit` logs over `[from_block, to_block]` inclusive and merges
/// the owners with the previous blob's recipients.
pub async fn build_recipient_set(
    chain: &ChainClient,
    prev: Option<&DistributionBlob>,
    from_block: u64,
    to_block: u64,
) -> Result<Vec<Address>> {
    let mut set = BTreeSet::new();

    if let Some(blob) = prev {
        for claim in blob
            .claims()
            .map_err(|e| EngineError::Validation(e.to_string()))?
        {
            set.insert(claim.recipient);
        }
    }

    for owner in chain.deposit_owners(from_block, to_block).await? {
        set.insert(owner);
    }

    set.remove(&Address::ZERO);

    debug!(
        "Recipient set: {} candidate(s) (deposit scan [{}, {}])",
        set.len(),
        from_block,
        to_block
    );
    Ok(set.into_iter().collect())
}

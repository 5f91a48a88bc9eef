//! Cumulative folding of per-round allocations onto prior totals.
//!
//! Every published amount is a lifetime total: new deltas add onto the
//! previous round's entry for the same `(recipient, token)` pair and pairs
//! without a new allocation carry forward unchanged. Output order is byte
//! order on `(recipient, token)`, which equals lexicographic order on the
//! lowercase hex the blob prints.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use dropcraft_core::Claim;

use crate::Allocation;

/// The folded result of one round.
#[derive(Debug, Clone)]
pub struct FoldedRound {
    /// Cumulative claims, sorted by `(recipient, token)`
    pub claims: Vec<Claim>,
    /// Per-token sum of cumulative amounts across recipients
    pub totals: BTreeMap<Address, U256>,
}

/// Fold per-round allocations onto the previous round's cumulative claims.
pub fn fold_cumulative(prev: &[Claim], allocations: &[Allocation]) -> FoldedRound {
    let mut cumulative: BTreeMap<(Address, Address), U256> =
        prev.iter().map(|c| (c.key(), c.amount)).collect();

    for alloc in allocations {
        let entry = cumulative
            .entry((alloc.recipient, alloc.token))
            .or_insert(U256::ZERO);
        *entry += alloc.amount;
    }

    let mut totals: BTreeMap<Address, U256> = BTreeMap::new();
    let claims = cumulative
        .into_iter()
        .map(|((recipient, token), amount)| {
            *totals.entry(token).or_insert(U256::ZERO) += amount;
            Claim::new(recipient, token, amount)
        })
        .collect();

    FoldedRound { claims, totals }
}

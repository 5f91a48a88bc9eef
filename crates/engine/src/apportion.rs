//! Pro-rata apportionment of one token's distributable pool.
//!
//! The operator fee is skimmed first in basis points, then each candidate
//! receives `actual * share / 1e18` where `share = balance * 1e18 /
//! total_supply`. All arithmetic is truncating 256-bit integer math; the
//! percent input is converted to basis points once at config parse and
//! never touches the allocation path as a float. Rounding dust (at most
//! one unit per candidate) stays in the contract and is swept into the
//! next round's inflow.

use alloy_primitives::{Address, U256};
use tracing::debug;

use crate::{EngineError, Result};

/// Fixed-point scale for wrapper shares (1e18).
pub const SHARE_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

const BPS_DENOMINATOR: u64 = 10_000;

/// One recipient's per-round allocation of one token (a delta, not a
/// cumulative amount).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub recipient: Address,
    pub token: Address,
    pub amount: U256,
}

/// Convert an operator fee percent (e.g. `10.0`) to basis points.
///
/// `floor(percent * 100)`; the only place a float is allowed near fee
/// handling.
pub fn fee_bps_from_percent(percent: f64) -> Result<u64> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(EngineError::Config(format!(
            "operator_fee must be within [0, 100], got {}",
            percent
        )));
    }
    Ok((percent * 100.0).floor() as u64)
}

/// Split `new_distributable` across candidates by wrapper share.
///
/// Zero-balance candidates and zero allocations are dropped (they must not
/// produce rows in the published values).
pub fn apportion_token(
    token: Address,
    new_distributable: U256,
    fee_bps: u64,
    total_supply: U256,
    balances: &[(Address, U256)],
) -> Vec<Allocation> {
    if new_distributable.is_zero() || total_supply.is_zero() {
        return Vec::new();
    }

    let fee = new_distributable * U256::from(fee_bps) / U256::from(BPS_DENOMINATOR);
    let actual = new_distributable - fee;

    debug!(
        "Apportioning {} of {} ({} after {} bps fee) across {} candidate(s)",
        new_distributable,
        token,
        actual,
        fee_bps,
        balances.len()
    );

    let mut allocations = Vec::new();
    for (recipient, balance) in balances {
        if balance.is_zero() {
            continue;
        }
        let share = *balance * SHARE_SCALE / total_supply;
        let amount = actual * share / SHARE_SCALE;
        if amount.is_zero() {
            continue;
        }
        allocations.push(Allocation {
            recipient: *recipient,
            token,
            amount,
        });
    }

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn eth(n: u64) -> U256 {
        U256::from(n) * SHARE_SCALE
    }

    #[test]
    fn test_share_scale_is_1e18() {
        assert_eq!(SHARE_SCALE, U256::from(10u64).pow(U256::from(18u64)));
    }

    #[test]
    fn test_fee_bps_from_percent() {
        assert_eq!(fee_bps_from_percent(0.0).unwrap(), 0);
        assert_eq!(fee_bps_from_percent(10.0).unwrap(), 1000);
        assert_eq!(fee_bps_from_percent(2.5).unwrap(), 250);
        // Sub-bps precision floors away
        assert_eq!(fee_bps_from_percent(0.019).unwrap(), 1);
        assert_eq!(fee_bps_from_percent(100.0).unwrap(), 10_000);
    }

    #[test]
    fn test_fee_bps_rejects_out_of_range() {
        assert!(fee_bps_from_percent(-1.0).is_err());
        assert!(fee_bps_from_percent(100.1).is_err());
        assert!(fee_bps_from_percent(f64::NAN).is_err());
    }

    #[test]
    fn test_quarter_three_quarter_split_no_fee() {
        let token = addr(0xAA);
        let balances = vec![(addr(0x11), eth(1)), (addr(0x22), eth(3))];

        let allocations = apportion_token(token, eth(1), 0, eth(4), &balances);

        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].amount, U256::from(250_000_000_000_000_000u64));
        assert_eq!(allocations[1].amount, U256::from(750_000_000_000_000_000u64));
    }

    #[test]
    fn test_split_with_ten_percent_fee() {
        let token = addr(0xAA);
        let balances = vec![(addr(0x11), eth(1)), (addr(0x22), eth(3))];

        let allocations = apportion_token(token, eth(1), 1000, eth(4), &balances);

        // 1e17 fee leaves 9e17 to split 1:3
        assert_eq!(allocations[0].amount, U256::from(225_000_000_000_000_000u64));
        assert_eq!(allocations[1].amount, U256::from(675_000_000_000_000_000u64));

        let total: U256 = allocations.iter().map(|a| a.amount).sum();
        assert_eq!(total, U256::from(900_000_000_000_000_000u64));
    }

    #[test]
    fn test_zero_balance_candidates_skipped() {
        let token = addr(0xAA);
        let balances = vec![
            (addr(0x11), eth(4)),
            (addr(0x22), U256::ZERO),
        ];

        let allocations = apportion_token(token, eth(1), 0, eth(4), &balances);
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].recipient, addr(0x11));
    }

    #[test]
    fn test_zero_distributable_yields_nothing() {
        let balances = vec![(addr(0x11), eth(1))];
        assert!(apportion_token(addr(0xAA), U256::ZERO, 0, eth(1), &balances).is_empty());
    }

    #[test]
    fn test_zero_supply_yields_nothing() {
        let balances = vec![(addr(0x11), eth(1))];
        assert!(apportion_token(addr(0xAA), eth(1), 0, U256::ZERO, &balances).is_empty());
    }

    #[test]
    fn test_allocations_never_exceed_distributable() {
        // Awkward numbers: dust must stay in the contract, never be minted.
        let token = addr(0xAA);
        let supply = U256::from(7u64);
        let balances: Vec<(Address, U256)> = (1..=7u8)
            .map(|i| (addr(i), U256::from(1u64)))
            .collect();
        let pool = U256::from(100u64);

        let allocations = apportion_token(token, pool, 0, supply, &balances);
        let total: U256 = allocations.iter().map(|a| a.amount).sum();
        assert!(total <= pool);
        // Dust is bounded by one unit per candidate
        assert!(pool - total <= U256::from(balances.len() as u64));
    }

    #[test]
    fn test_full_fee_allocates_nothing() {
        let balances = vec![(addr(0x11), eth(1))];
        let allocations = apportion_token(addr(0xAA), eth(1), 10_000, eth(1), &balances);
        assert!(allocations.is_empty());
    }
}

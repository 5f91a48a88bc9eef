//! Round pipeline integration tests
//!
//! Covers the full distribution flow against mock chain and store:
//! 1. Genesis apportionment by wrapper share
//! 2. Operator fee skim
//! 3. Idle round after on-chain claims (cumulative idempotency)
//! 4. Proof generation and verification
//! 5. Previous-round validation against the on-chain root
//! 6. Claim submission from a proof bundle

use alloy_primitives::{Address, B256, U256};

use dropcraft_chain::{ChainClient, ChainConfig, DepositEvent};
use dropcraft_core::addr_hex;
use dropcraft_engine::{
    EngineConfig, EngineError, ProofQuery, RoundEngine, SHARE_SCALE,
};
use dropcraft_merkle::{leaf_hash, verify_proof};
use dropcraft_store::{StoreClient, StoreConfig};

const RECIPIENT_A: Address = Address::repeat_byte(0x11);
const RECIPIENT_B: Address = Address::repeat_byte(0x22);
const TOKEN: Address = Address::repeat_byte(0xAA);
const OPERATOR: Address = Address::repeat_byte(0xEE);

fn eth(n: u64) -> U256 {
    U256::from(n) * SHARE_SCALE
}

fn wei(n: u64) -> U256 {
    U256::from(n)
}

/// Mock chain seeded with the standard two-recipient fixture:
/// wrapper balances 1e18 / 3e18, total supply 4e18, one reward token with
/// a 1e18 distributor balance, deposits discovered by event scan.
fn seeded_chain() -> ChainClient {
    let chain = ChainClient::new(ChainConfig::mock())
        .unwrap()
        .mock_with_signer(OPERATOR);

    chain.mock_add_token(TOKEN);
    chain.mock_set_total_supply(0, eth(4));
    chain.mock_set_wrapper_balance(RECIPIENT_A, 0, eth(1));
    chain.mock_set_wrapper_balance(RECIPIENT_B, 0, eth(3));
    chain.mock_set_distributor_balance(TOKEN, 0, eth(1));
    chain.mock_push_deposit(DepositEvent {
        block: 1,
        sender: RECIPIENT_A,
        owner: RECIPIENT_A,
        assets: eth(1),
        shares: eth(1),
    });
    chain.mock_push_deposit(DepositEvent {
        block: 2,
        sender: RECIPIENT_B,
        owner: RECIPIENT_B,
        assets: eth(3),
        shares: eth(3),
    });
    chain.mock_set_block(5);
    chain
}

fn engine_with(chain: ChainClient, fee_bps: u64) -> RoundEngine {
    let config = EngineConfig {
        fee_bps,
        ..EngineConfig::default()
    };
    RoundEngine::new(chain, StoreClient::new(StoreConfig::mock()), config)
}

// ============================================================================
// 1. Genesis apportionment
// ============================================================================

#[tokio::test]
async fn test_genesis_round_splits_by_wrapper_share() {
    let engine = engine_with(seeded_chain(), 0);

    let artifact = engine.generate().await.unwrap();
    assert_eq!(artifact.claim_count, 2);
    assert_eq!(artifact.block_number, 5);
    assert!(artifact.tx.is_some());

    let rows = engine.leaves().await.unwrap();
    assert_eq!(rows[0].1.recipient, RECIPIENT_A);
    assert_eq!(rows[0].1.amount, wei(250_000_000_000_000_000));
    assert_eq!(rows[1].1.recipient, RECIPIENT_B);
    assert_eq!(rows[1].1.amount, wei(750_000_000_000_000_000));

    assert_eq!(
        artifact.total_distributed[&addr_hex(&TOKEN)],
        "1000000000000000000"
    );
}

#[tokio::test]
async fn test_zero_balance_depositor_gets_no_row() {
    let chain = seeded_chain();
    let idle = Address::repeat_byte(0x33);
    chain.mock_push_deposit(DepositEvent {
        block: 3,
        sender: idle,
        owner: idle,
        assets: U256::ZERO,
        shares: U256::ZERO,
    });

    let engine = engine_with(chain, 0);
    let artifact = engine.generate().await.unwrap();

    assert_eq!(artifact.claim_count, 2);
    let rows = engine.leaves().await.unwrap();
    assert!(rows.iter().all(|(_, c)| c.recipient != idle));
}

#[tokio::test]
async fn test_sole_depositor_takes_whole_pool_minus_fee() {
    let chain = ChainClient::new(ChainConfig::mock())
        .unwrap()
        .mock_with_signer(OPERATOR);
    let whale = Address::repeat_byte(0x77);
    chain.mock_add_token(TOKEN);
    chain.mock_set_total_supply(0, eth(10));
    chain.mock_set_wrapper_balance(whale, 0, eth(10));
    chain.mock_set_distributor_balance(TOKEN, 0, eth(1));
    chain.mock_push_deposit(DepositEvent {
        block: 1,
        sender: whale,
        owner: whale,
        assets: eth(10),
        shares: eth(10),
    });
    chain.mock_set_block(4);

    let engine = engine_with(chain, 1000);
    engine.generate().await.unwrap();

    let rows = engine.leaves().await.unwrap();
    assert_eq!(rows.len(), 1);
    // Full supply share: cumulative = distributable * (1 - 10%)
    assert_eq!(rows[0].1.amount, wei(900_000_000_000_000_000));
}

// ============================================================================
// 2. Operator fee
// ============================================================================

#[tokio::test]
async fn test_ten_percent_fee_skim() {
    let engine = engine_with(seeded_chain(), 1000);

    let artifact = engine.generate().await.unwrap();
    let rows = engine.leaves().await.unwrap();

    assert_eq!(rows[0].1.amount, wei(225_000_000_000_000_000));
    assert_eq!(rows[1].1.amount, wei(675_000_000_000_000_000));
    assert_eq!(
        artifact.total_distributed[&addr_hex(&TOKEN)],
        "900000000000000000"
    );

    // Fee remainder stays in the contract: allocations never exceed the pool
    let allocated = rows[0].1.amount + rows[1].1.amount;
    assert!(allocated <= eth(1));
}

// ============================================================================
// 3. Cumulative idempotency across rounds
// ============================================================================

#[tokio::test]
async fn test_rerun_without_publication_is_byte_identical() {
    // No signer: the chain pointer never moves, so generate() at the same
    // height must reproduce the identical blob and root.
    let chain = ChainClient::new(ChainConfig::mock()).unwrap();
    chain.mock_add_token(TOKEN);
    chain.mock_set_total_supply(0, eth(4));
    chain.mock_set_wrapper_balance(RECIPIENT_A, 0, eth(1));
    chain.mock_set_wrapper_balance(RECIPIENT_B, 0, eth(3));
    chain.mock_set_distributor_balance(TOKEN, 0, eth(1));
    chain.mock_push_deposit(DepositEvent {
        block: 1,
        sender: RECIPIENT_A,
        owner: RECIPIENT_A,
        assets: eth(1),
        shares: eth(1),
    });
    chain.mock_push_deposit(DepositEvent {
        block: 2,
        sender: RECIPIENT_B,
        owner: RECIPIENT_B,
        assets: eth(3),
        shares: eth(3),
    });
    chain.mock_set_block(5);

    let engine = engine_with(chain, 0);
    let first = engine.generate().await.unwrap();
    let second = engine.generate().await.unwrap();

    assert_eq!(first.root, second.root);
    assert_eq!(first.cid, second.cid);
    assert!(first.tx.is_none());
}

#[tokio::test]
async fn test_idle_round_after_claim_reproduces_root() {
    let engine = engine_with(seeded_chain(), 0);
    let round1 = engine.generate().await.unwrap();

    // Recipient B claims on chain between rounds
    let bundle = engine
        .proof(&ProofQuery::Recipient(RECIPIENT_B))
        .await
        .unwrap();
    engine.submit_claim(&bundle).await.unwrap();

    engine.chain().mock_advance_blocks(5);

    // Round 2: no new inflow, so the distributable reconciles to zero and
    // the cumulative amounts (and therefore the root) are unchanged.
    let round2 = engine.generate().await.unwrap();
    assert_eq!(round2.root, round1.root);
    assert_eq!(
        round2.total_distributed[&addr_hex(&TOKEN)],
        "1000000000000000000"
    );

    let rows = engine.leaves().await.unwrap();
    assert_eq!(rows[0].1.amount, wei(250_000_000_000_000_000));
    assert_eq!(rows[1].1.amount, wei(750_000_000_000_000_000));

    // But the blob chain advanced: round 2 references round 1's CID
    assert_ne!(round2.cid, round1.cid);
}

#[tokio::test]
async fn test_new_inflow_folds_onto_cumulative() {
    let engine = engine_with(seeded_chain(), 0);
    let round1 = engine.generate().await.unwrap();

    // 4e17 of fresh rewards arrive after round 1 (published at block 6)
    engine
        .chain()
        .mock_set_distributor_balance(TOKEN, 8, eth(1) + wei(400_000_000_000_000_000));
    engine.chain().mock_set_block(10);

    let round2 = engine.generate().await.unwrap();
    assert_ne!(round2.root, round1.root);

    let rows = engine.leaves().await.unwrap();
    // Cumulative = round 1 share + 25% / 75% of the 4e17 inflow
    assert_eq!(rows[0].1.amount, wei(350_000_000_000_000_000));
    assert_eq!(rows[1].1.amount, wei(1_050_000_000_000_000_000));
    assert_eq!(
        round2.total_distributed[&addr_hex(&TOKEN)],
        "1400000000000000000"
    );
}

// ============================================================================
// 4. Proof generation and verification
// ============================================================================

#[tokio::test]
async fn test_proof_verifies_and_forgery_fails() {
    let engine = engine_with(seeded_chain(), 0);
    engine.generate().await.unwrap();

    let bundle = engine
        .proof(&ProofQuery::Recipient(RECIPIENT_B))
        .await
        .unwrap();
    assert_eq!(bundle.amount, "750000000000000000");

    let claim = bundle.claim().unwrap();
    let proof = bundle.proof_hashes().unwrap();
    let root = bundle.root().unwrap();
    assert!(verify_proof(&root, &leaf_hash(&claim), &proof));

    // Substituting amount 1 must fail verification
    let mut forged = claim;
    forged.amount = U256::from(1u64);
    assert!(!verify_proof(&root, &leaf_hash(&forged), &proof));
}

#[tokio::test]
async fn test_proof_by_index_and_unknown_recipient() {
    let engine = engine_with(seeded_chain(), 0);
    engine.generate().await.unwrap();

    let by_index = engine.proof(&ProofQuery::Index(0)).await.unwrap();
    assert_eq!(by_index.recipient, addr_hex(&RECIPIENT_A));

    let out_of_range = engine.proof(&ProofQuery::Index(9)).await;
    assert!(matches!(out_of_range, Err(EngineError::ProofNotFound(_))));

    let stranger = engine
        .proof(&ProofQuery::Recipient(Address::repeat_byte(0x99)))
        .await;
    assert!(matches!(stranger, Err(EngineError::ProofNotFound(_))));
}

#[tokio::test]
async fn test_multi_token_rows_and_ambiguous_address() {
    let chain = seeded_chain();
    let token_b = Address::repeat_byte(0xBB);
    chain.mock_add_token(token_b);
    chain.mock_set_distributor_balance(token_b, 0, eth(2));

    let engine = engine_with(chain, 0);
    let artifact = engine.generate().await.unwrap();

    // Two recipients x two tokens
    assert_eq!(artifact.claim_count, 4);
    assert_eq!(
        artifact.total_distributed[&addr_hex(&TOKEN)],
        "1000000000000000000"
    );
    assert_eq!(
        artifact.total_distributed[&addr_hex(&token_b)],
        "2000000000000000000"
    );

    // An address with two rows cannot be selected by address alone
    let ambiguous = engine.proof(&ProofQuery::Recipient(RECIPIENT_A)).await;
    assert!(matches!(ambiguous, Err(EngineError::AmbiguousProof(_))));
}

// ============================================================================
// 5. Previous-round validation
// ============================================================================

#[tokio::test]
async fn test_chain_root_mismatch_aborts_round() {
    let engine = engine_with(seeded_chain(), 0);
    engine.generate().await.unwrap();

    // The pointer is overwritten with a root the stored blob cannot
    // rebuild: the next round must abort instead of extending bad data.
    engine
        .chain()
        .mock_set_root_only(B256::repeat_byte(0xDD));

    let result = engine.generate().await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
}

// ============================================================================
// 6. Claim submission
// ============================================================================

#[tokio::test]
async fn test_claim_submission_emits_claimed_event() {
    let engine = engine_with(seeded_chain(), 0);
    engine.generate().await.unwrap();

    let bundle = engine
        .proof(&ProofQuery::Recipient(RECIPIENT_B))
        .await
        .unwrap();
    let outcome = engine.submit_claim(&bundle).await.unwrap();
    assert!(outcome.block_number > 0);

    let events = engine.chain().mock_claimed_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipient, RECIPIENT_B);
    assert_eq!(events[0].token, TOKEN);
    assert_eq!(events[0].amount, wei(750_000_000_000_000_000));
}

#[tokio::test]
async fn test_corrupted_bundle_rejected_before_submission() {
    let engine = engine_with(seeded_chain(), 0);
    engine.generate().await.unwrap();

    let mut bundle = engine
        .proof(&ProofQuery::Recipient(RECIPIENT_B))
        .await
        .unwrap();
    bundle.amount = "1".to_string();

    let result = engine.submit_claim(&bundle).await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
    assert!(engine.chain().mock_claimed_events().is_empty());
}

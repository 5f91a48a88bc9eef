//! Round generation: validate the previous round, gather pinned inputs,
//! apportion, fold, build the tree and publish `(root, cid)`.
//!
//! The snapshot block is sampled once at the start and every balance read
//! and event scan is pinned to it. A crash before `setMerkleRoot` has no
//! on-chain effect; an uploaded blob without a root pointing at it is
//! harmless garbage in the store.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{info, warn};

use dropcraft_chain::{ChainClient, DistributionState, TxOutcome};
use dropcraft_core::{addr_hex, DistributionBlob, BLOB_FORMAT, LEAF_ENCODING};
use dropcraft_merkle::ClaimTree;
use dropcraft_store::StoreClient;

use crate::{
    apportion_token, build_recipient_set, fold_cumulative, new_distributable, EngineError, Result,
};

/// Round engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Operator fee in basis points (`floor(percent * 100)`)
    pub fee_bps: u64,
    /// Cap on concurrent per-recipient balance queries
    pub balance_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_bps: 0,
            balance_concurrency: 8,
        }
    }
}

/// The published (or to-be-published) result of one round.
#[derive(Debug, Clone)]
pub struct RoundArtifact {
    pub root: B256,
    pub cid: String,
    /// Snapshot block of the round
    pub block_number: u64,
    pub claim_count: usize,
    /// token address -> cumulative total, decimal strings
    pub total_distributed: BTreeMap<String, String>,
    /// Confirmed root-setting transaction, `None` when no signer is
    /// configured (manual submission)
    pub tx: Option<TxOutcome>,
}

/// The previous round, downloaded and verified against the on-chain root.
pub(crate) struct PrevRound {
    pub blob: DistributionBlob,
    pub cid: String,
}

/// The distribution-generation engine.
///
/// Owns one chain client and one store client; a single operator per
/// distributor is assumed (enforced off-band), so no cross-round locking
/// exists.
pub struct RoundEngine {
    pub(crate) chain: ChainClient,
    pub(crate) store: StoreClient,
    config: EngineConfig,
}

impl RoundEngine {
    pub fn new(chain: ChainClient, store: StoreClient, config: EngineConfig) -> Self {
        Self {
            chain,
            store,
            config,
        }
    }

    pub fn chain(&self) -> &ChainClient {
        &self.chain
    }

    /// Run one round: compute the new cumulative distribution and publish
    /// it.
    pub async fn generate(&self) -> Result<RoundArtifact> {
        // 1. Previous round, verified against the on-chain root before
        //    anything else is read.
        let state = self.chain.distribution_state().await?;
        let prev = self.load_previous(&state).await?;

        // 2. Pinned inputs.
        let snapshot = self.chain.block_number().await?;
        let tokens = self.chain.tokens().await?;
        let total_supply = self.chain.wrapper_total_supply(snapshot).await?;

        info!(
            "Generating round at block {}: {} token(s), wrapper supply {}",
            snapshot,
            tokens.len(),
            total_supply
        );

        let recipients = build_recipient_set(
            &self.chain,
            prev.as_ref().map(|p| &p.blob),
            state.last_processed_block,
            snapshot,
        )
        .await?;
        let balances = self.wrapper_balances(&recipients, snapshot).await?;

        // 3. Reconcile and apportion per token.
        let prev_snapshot = prev.as_ref().map(|p| p.blob.block_number);
        let mut allocations = Vec::new();
        for token in &tokens {
            let distributable =
                new_distributable(&self.chain, *token, snapshot, prev_snapshot).await?;
            allocations.extend(apportion_token(
                *token,
                distributable,
                self.config.fee_bps,
                total_supply,
                &balances,
            ));
        }

        // 4. Fold onto the previous cumulatives and build the tree.
        let prev_claims = match &prev {
            Some(p) => p
                .blob
                .claims()
                .map_err(|e| EngineError::Validation(e.to_string()))?,
            None => Vec::new(),
        };
        let folded = fold_cumulative(&prev_claims, &allocations);
        let tree = ClaimTree::build(&folded.claims)?;
        let root = tree.root();

        let (nodes, values) = tree.dump();
        let blob = DistributionBlob {
            format: BLOB_FORMAT.to_string(),
            leaf_encoding: LEAF_ENCODING.iter().map(|s| s.to_string()).collect(),
            tree: nodes,
            values,
            prev_tree_cid: prev.map(|p| p.cid).unwrap_or_default(),
            block_number: snapshot,
            total_distributed: folded
                .totals
                .iter()
                .map(|(token, total)| (addr_hex(token), total.to_string()))
                .collect(),
        };

        // 5. Publish.
        let cid = self.store.upload(&blob).await?;
        info!(
            "Round blob uploaded: {} ({} claim(s), root {})",
            cid,
            blob.values.len(),
            root
        );

        let tx = if self.chain.has_signer() {
            Some(self.chain.set_merkle_root(root, &cid).await?)
        } else {
            warn!("No signer configured; submit setMerkleRoot({}, {}) manually", root, cid);
            None
        };

        Ok(RoundArtifact {
            root,
            cid,
            block_number: snapshot,
            claim_count: blob.values.len(),
            total_distributed: blob.total_distributed,
            tx,
        })
    }

    /// Download and authenticate the previous round's blob.
    pub(crate) async fn load_previous(
        &self,
        state: &DistributionState,
    ) -> Result<Option<PrevRound>> {
        if state.is_genesis() {
            info!("No round has been published on chain yet");
            return Ok(None);
        }
        if state.cid.is_empty() {
            return Err(EngineError::Validation(
                "on-chain root is set but the CID is empty".to_string(),
            ));
        }

        let blob = self.store.download(&state.cid).await?;
        let tree = ClaimTree::load(&blob)?;
        if tree.root() != state.root {
            return Err(EngineError::Validation(format!(
                "previous blob {} rebuilds to root {} but the chain holds {}",
                state.cid,
                tree.root(),
                state.root
            )));
        }

        Ok(Some(PrevRound {
            blob,
            cid: state.cid.clone(),
        }))
    }

    /// Fan out wrapper balance reads at the snapshot block, bounded by the
    /// configured concurrency cap. Order is preserved; all reads are
    /// pinned, so ordering cannot change the result anyway.
    async fn wrapper_balances(
        &self,
        recipients: &[Address],
        block: u64,
    ) -> Result<Vec<(Address, U256)>> {
        let chain = &self.chain;
        stream::iter(recipients.iter().map(|&recipient| async move {
            let balance = chain.wrapper_balance(recipient, block).await?;
            Ok::<(Address, U256), EngineError>((recipient, balance))
        }))
        .buffered(self.config.balance_concurrency.max(1))
        .try_collect()
        .await
    }
}

//! Chain client for distributor, wrapper and token reads plus the two
//! write paths (`setMerkleRoot`, `claim`).
//!
//! Mock mode keeps per-block balance histories and event lists in memory;
//! mock transactions advance the block counter and mutate state the way
//! the contracts would, including Merkle-proof checks on `claim`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{BlockId, Filter};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolEvent;
use tracing::{debug, info};

use dropcraft_core::Claim;
use dropcraft_merkle::{leaf_hash, verify_proof};

use crate::contracts::{IDistributor, IWrapper, IERC20};
use crate::{ChainError, ClaimedEvent, DepositEvent, DistributionState, Result, TxOutcome};

/// Chain mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMode {
    /// In-memory chain state for development and tests
    Mock,
    /// JSON-RPC against a real endpoint
    Live,
}

/// Chain client configuration
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Chain mode (Mock or Live)
    pub mode: ChainMode,
    /// RPC endpoint (only used in Live mode; must be archive-class for
    /// historical balance reads)
    pub rpc_url: String,
    /// Distributor contract address
    pub distributor: Address,
    /// Wrapper (vault) contract address
    pub wrapper: Address,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            mode: ChainMode::Mock,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            distributor: Address::ZERO,
            wrapper: Address::ZERO,
        }
    }
}

impl ChainConfig {
    /// Mock configuration for development and tests.
    pub fn mock() -> Self {
        Self::default()
    }

    /// Live configuration for a deployed distributor/wrapper pair.
    pub fn live(rpc_url: impl Into<String>, distributor: Address, wrapper: Address) -> Self {
        Self {
            mode: ChainMode::Live,
            rpc_url: rpc_url.into(),
            distributor,
            wrapper,
        }
    }
}

/// In-memory state for mock mode.
///
/// Balance maps are block-height histories: a read at block `b` sees the
/// most recent entry at or before `b`, like an archive node would.
#[derive(Debug, Default)]
struct MockChain {
    block: u64,
    root: B256,
    cid: String,
    last_processed_block: u64,
    tokens: Vec<Address>,
    /// block -> wrapper total supply
    total_supply: BTreeMap<u64, U256>,
    /// holder -> block -> wrapper share balance
    wrapper_balances: HashMap<Address, BTreeMap<u64, U256>>,
    /// token -> block -> distributor's token balance
    distributor_balances: HashMap<Address, BTreeMap<u64, U256>>,
    deposits: Vec<DepositEvent>,
    claims: Vec<ClaimedEvent>,
    /// (recipient, token) -> lifetime amount already paid out
    claimed_total: HashMap<(Address, Address), U256>,
    tx_counter: u64,
}

impl MockChain {
    fn history_at(history: &BTreeMap<u64, U256>, block: u64) -> U256 {
        history
            .range(..=block)
            .next_back()
            .map(|(_, v)| *v)
            .unwrap_or(U256::ZERO)
    }

    fn next_tx_hash(&mut self) -> B256 {
        self.tx_counter += 1;
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&self.tx_counter.to_le_bytes());
        hash[8..16].copy_from_slice(b"mocktxn!");
        B256::from(hash)
    }
}

/// Client for all on-chain reads and writes the round engine consumes.
pub struct ChainClient {
    config: ChainConfig,
    /// RPC provider (only used in Live mode); carries the wallet when a
    /// signer is configured
    provider: Option<DynProvider>,
    /// Operator address when a signer is configured
    signer_address: Option<Address>,
    /// Mock state (only used in Mock mode)
    mock_state: Arc<RwLock<MockChain>>,
}

impl ChainClient {
    /// Create a read-only client (no signer; writes fail with
    /// [`ChainError::SignerRequired`]).
    pub fn new(config: ChainConfig) -> Result<Self> {
        let provider = match config.mode {
            ChainMode::Mock => None,
            ChainMode::Live => Some(
                ProviderBuilder::new()
                    .connect_http(parse_rpc_url(&config.rpc_url)?)
                    .erased(),
            ),
        };

        Ok(Self {
            config,
            provider,
            signer_address: None,
            mock_state: Arc::new(RwLock::new(MockChain::default())),
        })
    }

    /// Create a client with a signing key for write operations.
    pub fn with_signer(config: ChainConfig, signer: PrivateKeySigner) -> Result<Self> {
        let signer_address = signer.address();
        let provider = match config.mode {
            ChainMode::Mock => None,
            ChainMode::Live => Some(
                ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(parse_rpc_url(&config.rpc_url)?)
                    .erased(),
            ),
        };

        Ok(Self {
            config,
            provider,
            signer_address: Some(signer_address),
            mock_state: Arc::new(RwLock::new(MockChain::default())),
        })
    }

    pub fn is_mock(&self) -> bool {
        self.config.mode == ChainMode::Mock
    }

    pub fn has_signer(&self) -> bool {
        self.signer_address.is_some()
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }

    pub fn distributor_address(&self) -> Address {
        self.config.distributor
    }

    fn provider(&self) -> Result<&DynProvider> {
        self.provider
            .as_ref()
            .ok_or_else(|| ChainError::Rpc("RPC provider not initialized".to_string()))
    }

    // ==================== Reads ====================

    /// Current chain height.
    pub async fn block_number(&self) -> Result<u64> {
        if self.is_mock() {
            return Ok(self.mock_state.read().expect("chain lock poisoned").block);
        }

        self.provider()?
            .get_block_number()
            .await
            .map_err(|e| ChainError::Rpc(format!("getBlockNumber: {}", e)))
    }

    /// The distributor's `(root, cid, lastProcessedBlock)` triple.
    pub async fn distribution_state(&self) -> Result<DistributionState> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(DistributionState {
                root: state.root,
                cid: state.cid.clone(),
                last_processed_block: state.last_processed_block,
            });
        }

        let distributor = IDistributor::new(self.config.distributor, self.provider()?.clone());
        let root = distributor
            .root()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("root(): {}", e)))?;
        let cid = distributor
            .cid()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("cid(): {}", e)))?;
        let last = distributor
            .lastProcessedBlock()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("lastProcessedBlock(): {}", e)))?;
        let last_processed_block = u64::try_from(last)
            .map_err(|_| ChainError::Decode("lastProcessedBlock exceeds u64".to_string()))?;

        Ok(DistributionState {
            root,
            cid,
            last_processed_block,
        })
    }

    /// Ordered reward-token list from the distributor.
    pub async fn tokens(&self) -> Result<Vec<Address>> {
        if self.is_mock() {
            return Ok(self
                .mock_state
                .read()
                .expect("chain lock poisoned")
                .tokens
                .clone());
        }

        let distributor = IDistributor::new(self.config.distributor, self.provider()?.clone());
        distributor
            .getTokens()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("getTokens(): {}", e)))
    }

    /// Wrapper total supply at a block.
    pub async fn wrapper_total_supply(&self, block: u64) -> Result<U256> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(MockChain::history_at(&state.total_supply, block));
        }

        let wrapper = IWrapper::new(self.config.wrapper, self.provider()?.clone());
        wrapper
            .totalSupply()
            .block(BlockId::number(block))
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("totalSupply(): {}", e)))
    }

    /// Wrapper share balance of `holder` at a block.
    pub async fn wrapper_balance(&self, holder: Address, block: u64) -> Result<U256> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(state
                .wrapper_balances
                .get(&holder)
                .map(|h| MockChain::history_at(h, block))
                .unwrap_or(U256::ZERO));
        }

        let wrapper = IWrapper::new(self.config.wrapper, self.provider()?.clone());
        wrapper
            .balanceOf(holder)
            .block(BlockId::number(block))
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("wrapper balanceOf({}): {}", holder, e)))
    }

    /// The distributor's balance of a reward token at a block.
    ///
    /// Past-block reads need an archive endpoint; there is no fallback.
    pub async fn distributor_token_balance(&self, token: Address, block: u64) -> Result<U256> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(state
                .distributor_balances
                .get(&token)
                .map(|h| MockChain::history_at(h, block))
                .unwrap_or(U256::ZERO));
        }

        let erc20 = IERC20::new(token, self.provider()?.clone());
        erc20
            .balanceOf(self.config.distributor)
            .block(BlockId::number(block))
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("balanceOf({}): {}", token, e)))
    }

    /// Owners of wrapper `Deposit` events in `[from_block, to_block]`,
    /// in log order.
    pub async fn deposit_owners(&self, from_block: u64, to_block: u64) -> Result<Vec<Address>> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(state
                .deposits
                .iter()
                .filter(|d| d.block >= from_block && d.block <= to_block)
                .map(|d| d.owner)
                .collect());
        }

        let filter = Filter::new()
            .address(self.config.wrapper)
            .event_signature(IWrapper::Deposit::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .provider()?
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::Rpc(format!("getLogs(Deposit): {}", e)))?;

        let mut owners = Vec::with_capacity(logs.len());
        for log in logs {
            let decoded = log
                .log_decode::<IWrapper::Deposit>()
                .map_err(|e| ChainError::Decode(format!("Deposit log: {}", e)))?;
            owners.push(decoded.inner.data.owner);
        }

        debug!(
            "Deposit scan [{}, {}]: {} event(s)",
            from_block,
            to_block,
            owners.len()
        );
        Ok(owners)
    }

    /// Sum of `Claimed` amounts for `token` in `[from_block, to_block]`.
    pub async fn claimed_since(
        &self,
        token: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<U256> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            let mut total = U256::ZERO;
            for claim in state
                .claims
                .iter()
                .filter(|c| c.token == token && c.block >= from_block && c.block <= to_block)
            {
                total += claim.amount;
            }
            return Ok(total);
        }

        let filter = Filter::new()
            .address(self.config.distributor)
            .event_signature(IDistributor::Claimed::SIGNATURE_HASH)
            .topic2(B256::from(token.into_word()))
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .provider()?
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::Rpc(format!("getLogs(Claimed): {}", e)))?;

        let mut total = U256::ZERO;
        for log in logs {
            let decoded = log
                .log_decode::<IDistributor::Claimed>()
                .map_err(|e| ChainError::Decode(format!("Claimed log: {}", e)))?;
            total += decoded.inner.data.amount;
        }
        Ok(total)
    }

    // ==================== Writes ====================

    /// Submit `setMerkleRoot(root, cid)` and await the receipt.
    pub async fn set_merkle_root(&self, root: B256, cid: &str) -> Result<TxOutcome> {
        if !self.has_signer() {
            return Err(ChainError::SignerRequired);
        }

        info!("Submitting setMerkleRoot(root: {}, cid: {})", root, cid);

        if self.is_mock() {
            let mut state = self.mock_state.write().expect("chain lock poisoned");
            state.block += 1;
            state.root = root;
            state.cid = cid.to_string();
            state.last_processed_block = state.block;
            let tx_hash = state.next_tx_hash();
            let block_number = state.block;
            info!("[MOCK] Root set at block {}", block_number);
            return Ok(TxOutcome {
                tx_hash,
                block_number,
            });
        }

        let distributor = IDistributor::new(self.config.distributor, self.provider()?.clone());
        let receipt = distributor
            .setMerkleRoot(root, cid.to_string())
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("setMerkleRoot send: {}", e)))?
            .get_receipt()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("setMerkleRoot receipt: {}", e)))?;

        if !receipt.status() {
            return Err(ChainError::TransactionFailed(format!(
                "setMerkleRoot reverted in tx {}",
                receipt.transaction_hash
            )));
        }

        info!("Root set in tx {}", receipt.transaction_hash);
        Ok(TxOutcome {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
        })
    }

    /// Submit `claim(recipient, token, amount, proof)` and await the
    /// receipt.
    ///
    /// The mock path mirrors the contract: it checks the proof against the
    /// stored root, pays only the cumulative delta, emits `Claimed` and
    /// reduces the distributor's token balance at the new block.
    pub async fn claim(
        &self,
        recipient: Address,
        token: Address,
        amount: U256,
        proof: Vec<B256>,
    ) -> Result<TxOutcome> {
        if !self.has_signer() {
            return Err(ChainError::SignerRequired);
        }

        if self.is_mock() {
            let mut state = self.mock_state.write().expect("chain lock poisoned");

            let leaf = leaf_hash(&Claim::new(recipient, token, amount));
            if !verify_proof(&state.root, &leaf, &proof) {
                return Err(ChainError::TransactionFailed(
                    "invalid merkle proof".to_string(),
                ));
            }

            let paid = state
                .claimed_total
                .get(&(recipient, token))
                .copied()
                .unwrap_or(U256::ZERO);
            let delta = amount
                .checked_sub(paid)
                .filter(|d| *d > U256::ZERO)
                .ok_or_else(|| ChainError::TransactionFailed("nothing to claim".to_string()))?;

            state.block += 1;
            let block = state.block;
            state.claimed_total.insert((recipient, token), amount);
            state.claims.push(ClaimedEvent {
                block,
                recipient,
                token,
                amount: delta,
            });

            let history = state.distributor_balances.entry(token).or_default();
            let balance = MockChain::history_at(history, block);
            history.insert(block, balance.saturating_sub(delta));

            let tx_hash = state.next_tx_hash();
            info!(
                "[MOCK] Claimed {} of {} for {} at block {}",
                delta, token, recipient, block
            );
            return Ok(TxOutcome {
                tx_hash,
                block_number: block,
            });
        }

        let distributor = IDistributor::new(self.config.distributor, self.provider()?.clone());
        let receipt = distributor
            .claim(recipient, token, amount, proof)
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("claim send: {}", e)))?
            .get_receipt()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("claim receipt: {}", e)))?;

        if !receipt.status() {
            return Err(ChainError::TransactionFailed(format!(
                "claim reverted in tx {}",
                receipt.transaction_hash
            )));
        }

        info!("Claim confirmed in tx {}", receipt.transaction_hash);
        Ok(TxOutcome {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
        })
    }

    // ==================== Mock state setup ====================
    //
    // Test scaffolding: all panic outside mock mode.

    /// Grant this mock client a signer identity.
    pub fn mock_with_signer(mut self, operator: Address) -> Self {
        assert!(self.is_mock(), "mock_with_signer is mock-only");
        self.signer_address = Some(operator);
        self
    }

    pub fn mock_set_block(&self, block: u64) {
        assert!(self.is_mock(), "mock_set_block is mock-only");
        self.mock_state.write().expect("chain lock poisoned").block = block;
    }

    pub fn mock_advance_blocks(&self, count: u64) {
        assert!(self.is_mock(), "mock_advance_blocks is mock-only");
        self.mock_state.write().expect("chain lock poisoned").block += count;
    }

    pub fn mock_add_token(&self, token: Address) {
        assert!(self.is_mock(), "mock_add_token is mock-only");
        self.mock_state
            .write()
            .expect("chain lock poisoned")
            .tokens
            .push(token);
    }

    pub fn mock_set_total_supply(&self, block: u64, supply: U256) {
        assert!(self.is_mock(), "mock_set_total_supply is mock-only");
        self.mock_state
            .write()
            .expect("chain lock poisoned")
            .total_supply
            .insert(block, supply);
    }

    pub fn mock_set_wrapper_balance(&self, holder: Address, block: u64, balance: U256) {
        assert!(self.is_mock(), "mock_set_wrapper_balance is mock-only");
        self.mock_state
            .write()
            .expect("chain lock poisoned")
            .wrapper_balances
            .entry(holder)
            .or_default()
            .insert(block, balance);
    }

    pub fn mock_set_distributor_balance(&self, token: Address, block: u64, balance: U256) {
        assert!(self.is_mock(), "mock_set_distributor_balance is mock-only");
        self.mock_state
            .write()
            .expect("chain lock poisoned")
            .distributor_balances
            .entry(token)
            .or_default()
            .insert(block, balance);
    }

    pub fn mock_push_deposit(&self, deposit: DepositEvent) {
        assert!(self.is_mock(), "mock_push_deposit is mock-only");
        self.mock_state
            .write()
            .expect("chain lock poisoned")
            .deposits
            .push(deposit);
    }

    /// Overwrite only the published root, leaving the CID in place
    /// (blob/chain mismatch tests).
    pub fn mock_set_root_only(&self, root: B256) {
        assert!(self.is_mock(), "mock_set_root_only is mock-only");
        self.mock_state.write().expect("chain lock poisoned").root = root;
    }

    /// Inject a `Claimed` event without going through the claim path
    /// (reconciliation tests).
    pub fn mock_push_claimed_event(&self, event: ClaimedEvent) {
        assert!(self.is_mock(), "mock_push_claimed_event is mock-only");
        self.mock_state
            .write()
            .expect("chain lock poisoned")
            .claims
            .push(event);
    }

    /// Snapshot of emitted `Claimed` events (assertion helper).
    pub fn mock_claimed_events(&self) -> Vec<ClaimedEvent> {
        assert!(self.is_mock(), "mock_claimed_events is mock-only");
        self.mock_state
            .read()
            .expect("chain lock poisoned")
            .claims
            .clone()
    }
}

fn parse_rpc_url(raw: &str) -> Result<url::Url> {
    raw.parse::<url::Url>()
        .map_err(|e| ChainError::InvalidConfig(format!("rpc_url {:?}: {}", raw, e)))
}

//! In-memory mock for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use zylith_core::schema::pool::PoolKey;
use zylith_core::{CircuitKind, FieldElement};

use crate::client::{ChainClient, OperationAux, PoolState, PositionState};
use crate::error::ChainError;

/// A recorded submission.
#[derive(Debug, Clone)]
pub struct SubmittedOperation {
    /// Circuit named in the submission.
    pub circuit: CircuitKind,
    /// Calldata as submitted.
    pub calldata: Vec<String>,
    /// Execution parameters as submitted.
    pub aux: OperationAux,
    /// Assigned mock transaction hash.
    pub tx_hash: String,
}

#[derive(Debug, Default)]
struct MockState {
    submissions: Vec<SubmittedOperation>,
    roots: Vec<FieldElement>,
    nullifiers: HashSet<FieldElement>,
    accepted: Vec<FieldElement>,
    positions: HashMap<(i32, i32), PositionState>,
    pool_state: Option<PoolState>,
    paused: bool,
    next_tx: u64,
    block: u64,
}

/// A chain that confirms everything instantly and remembers what it saw.
#[derive(Debug, Default)]
pub struct MockChainClient {
    state: Mutex<MockState>,
}

impl MockChainClient {
    /// Fresh mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        #[allow(clippy::unwrap_used, reason = "test double; poisoning is a test bug")]
        self.state.lock().unwrap()
    }

    /// Pause or unpause the mock coordinator.
    pub fn set_paused(&self, paused: bool) {
        self.lock().paused = paused;
    }

    /// Queue a commitment as accepted on chain (a finalized deposit).
    pub fn accept_commitment(&self, commitment: FieldElement) {
        let mut state = self.lock();
        state.accepted.push(commitment);
        state.block = state.block.saturating_add(1);
    }

    /// Record a nullifier as spent out-of-band.
    pub fn assume_spent(&self, nullifier_hash: FieldElement) {
        self.lock().nullifiers.insert(nullifier_hash);
    }

    /// Install a position read-model for `(tick_lower, tick_upper)`.
    pub fn set_position_state(&self, tick_lower: i32, tick_upper: i32, state: PositionState) {
        self.lock().positions.insert((tick_lower, tick_upper), state);
    }

    /// Install the pool read-model.
    pub fn set_pool_state(&self, state: PoolState) {
        self.lock().pool_state = Some(state);
    }

    /// Everything submitted so far.
    #[must_use]
    pub fn submissions(&self) -> Vec<SubmittedOperation> {
        self.lock().submissions.clone()
    }

    /// Roots published so far.
    #[must_use]
    pub fn published_roots(&self) -> Vec<FieldElement> {
        self.lock().roots.clone()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn submit_operation(
        &self,
        circuit: CircuitKind,
        calldata: &[String],
        aux: &OperationAux,
    ) -> Result<String, ChainError> {
        let mut state = self.lock();
        if state.paused {
            return Err(ChainError::Reverted("coordinator is paused".into()));
        }
        state.next_tx = state.next_tx.saturating_add(1);
        let tx_hash = format!("0xmock{:08x}", state.next_tx);
        state.submissions.push(SubmittedOperation {
            circuit,
            calldata: calldata.to_vec(),
            aux: aux.clone(),
            tx_hash: tx_hash.clone(),
        });
        state.block = state.block.saturating_add(1);
        Ok(tx_hash)
    }

    async fn submit_root(&self, root: &FieldElement) -> Result<String, ChainError> {
        let mut state = self.lock();
        state.roots.push(*root);
        state.next_tx = state.next_tx.saturating_add(1);
        Ok(format!("0xmock{:08x}", state.next_tx))
    }

    async fn wait_for_confirmation(&self, _tx_hash: &str) -> Result<(), ChainError> {
        Ok(())
    }

    async fn deposit_calldata(
        &self,
        commitment: &FieldElement,
    ) -> Result<Vec<String>, ChainError> {
        Ok(vec!["1".into(), commitment.to_decimal()])
    }

    async fn pool_state(&self, _pool: &PoolKey) -> Result<PoolState, ChainError> {
        self.lock()
            .pool_state
            .clone()
            .ok_or_else(|| ChainError::Rpc("no pool state configured".into()))
    }

    async fn position_state(
        &self,
        _pool: &PoolKey,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<PositionState, ChainError> {
        self.lock()
            .positions
            .get(&(tick_lower, tick_upper))
            .cloned()
            .ok_or_else(|| ChainError::Rpc("unknown position".into()))
    }

    async fn is_nullifier_spent(
        &self,
        nullifier_hash: &FieldElement,
    ) -> Result<bool, ChainError> {
        Ok(self.lock().nullifiers.contains(nullifier_hash))
    }

    async fn merkle_root(&self) -> Result<FieldElement, ChainError> {
        Ok(self.lock().roots.last().copied().unwrap_or(FieldElement::ZERO))
    }

    async fn is_known_root(&self, root: &FieldElement) -> Result<bool, ChainError> {
        Ok(self.lock().roots.contains(root))
    }

    async fn next_leaf_index(&self) -> Result<u64, ChainError> {
        Ok(u64::try_from(self.lock().accepted.len()).unwrap_or(u64::MAX))
    }

    async fn is_paused(&self) -> Result<bool, ChainError> {
        Ok(self.lock().paused)
    }

    async fn accepted_commitments(
        &self,
        from_index: u64,
    ) -> Result<Vec<FieldElement>, ChainError> {
        let state = self.lock();
        let start = usize::try_from(from_index).unwrap_or(usize::MAX);
        Ok(state.accepted.iter().skip(start).copied().collect())
    }

    async fn latest_block(&self) -> Result<u64, ChainError> {
        Ok(self.lock().block)
    }
}

//! Shared application state and the single-writer tree discipline.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use zylith_chain::{ChainClient, ChainError, OperationAux};
use zylith_circuits::CircuitInputs;
use zylith_core::{CircuitKind, FieldElement, PoseidonHasher};
use zylith_prover::{ProofArtifact, ProofBackend};
use zylith_tree::{LeanImt, MerkleProof, RootHistory};

use crate::config::AspConfig;
use crate::db::AspDb;
use crate::error::AspError;

/// A tentative deposit reservation awaiting on-chain acceptance.
#[derive(Debug, Clone)]
pub struct PendingDeposit {
    /// The reserved commitment.
    pub commitment: FieldElement,
    /// Index it will receive if accepted in order.
    pub tentative_index: u64,
    /// Reservation time, for TTL-based rollback.
    pub reserved_at: Instant,
}

/// Everything the single writer guards: one consistent snapshot of
/// (tree, ledger, nullifier set, root history, pending deposits).
#[derive(Debug)]
pub struct TreeState {
    /// The canonical LeanIMT over confirmed commitments.
    pub tree: LeanImt,
    /// Commitment → leaf index for every confirmed commitment.
    pub ledger: HashMap<FieldElement, u64>,
    /// Nullifier hashes consumed on chain.
    pub spent: HashSet<FieldElement>,
    /// Nullifier hashes reserved by in-flight operations.
    pub in_flight: HashSet<FieldElement>,
    /// Recently confirmed roots.
    pub history: RootHistory,
    /// Ordered tentative deposit reservations.
    pub pending: VecDeque<PendingDeposit>,
}

/// Shared state handed to every handler.
pub struct AppState {
    /// Service configuration.
    pub config: AspConfig,
    /// The Poseidon handle.
    pub hasher: Arc<PoseidonHasher>,
    /// Persistent ledger.
    pub db: AspDb,
    /// Guarded tree state; take the write lock only to mutate.
    pub tree: RwLock<TreeState>,
    /// Proof generation backend (worker pool in production).
    pub prover: Arc<dyn ProofBackend>,
    /// Chain read/write client.
    pub chain: Arc<dyn ChainClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state by replaying the persisted ledger into a fresh tree.
    ///
    /// # Errors
    /// Fails on ledger corruption or hash-layer failure.
    pub fn recover(
        config: AspConfig,
        hasher: Arc<PoseidonHasher>,
        db: AspDb,
        prover: Arc<dyn ProofBackend>,
        chain: Arc<dyn ChainClient>,
    ) -> Result<Arc<Self>, AspError> {
        let mut tree = LeanImt::with_default_height(Arc::clone(&hasher));
        let mut ledger = HashMap::new();
        for commitment in db.commitments_in_order()? {
            let index = tree.insert(commitment)?;
            ledger.insert(commitment, index);
        }

        let spent: HashSet<FieldElement> = db.nullifier_hashes()?.into_iter().collect();

        let mut history = RootHistory::new(config.root_history_size);
        for record in db.roots_in_order()? {
            let root = FieldElement::from_hex(&record.root)
                .map_err(|e| AspError::Internal(format!("stored root: {e}")))?;
            history.push(root);
        }
        // The replayed tree is authoritative; make sure its root is accepted
        // even if the root log lags behind.
        if tree.leaf_count() > 0 {
            history.push(tree.root());
        }

        tracing::info!(
            leaves = tree.leaf_count(),
            nullifiers = spent.len(),
            "ledger replayed"
        );

        Ok(Arc::new(Self {
            config,
            hasher,
            db,
            tree: RwLock::new(TreeState {
                tree,
                ledger,
                spent,
                in_flight: HashSet::new(),
                history,
                pending: VecDeque::new(),
            }),
            prover,
            chain,
        }))
    }

    /// Fail with [`AspError::Paused`] when the coordinator is paused.
    ///
    /// # Errors
    /// Propagates chain read failures.
    pub async fn ensure_not_paused(&self) -> Result<(), AspError> {
        if self.chain.is_paused().await? {
            return Err(AspError::Paused);
        }
        Ok(())
    }

    /// Verify that `expected` is the confirmed commitment at `leaf_index`
    /// and return its authentication path, all under one snapshot.
    ///
    /// # Errors
    /// [`AspError::NotFound`] for an unknown leaf,
    /// [`AspError::InvalidInput`] for a commitment mismatch.
    pub async fn proof_for(
        &self,
        leaf_index: u64,
        expected: FieldElement,
    ) -> Result<MerkleProof, AspError> {
        let state = self.tree.read().await;
        Self::proof_in(&state, leaf_index, expected)
    }

    /// Two authentication paths from the same snapshot (mint).
    ///
    /// # Errors
    /// As [`AppState::proof_for`], for either leaf.
    pub async fn proofs_for(
        &self,
        leaf_a: u64,
        expected_a: FieldElement,
        leaf_b: u64,
        expected_b: FieldElement,
    ) -> Result<(MerkleProof, MerkleProof), AspError> {
        let state = self.tree.read().await;
        let a = Self::proof_in(&state, leaf_a, expected_a)?;
        let b = Self::proof_in(&state, leaf_b, expected_b)?;
        Ok((a, b))
    }

    fn proof_in(
        state: &TreeState,
        leaf_index: u64,
        expected: FieldElement,
    ) -> Result<MerkleProof, AspError> {
        let stored = state
            .tree
            .leaf(leaf_index)
            .map_err(|_| AspError::NotFound(format!("no commitment at leaf {leaf_index}")))?;
        if stored != expected {
            return Err(AspError::InvalidInput(format!(
                "commitment mismatch at leaf {leaf_index}"
            )));
        }
        if !state.history.contains(&state.tree.root()) {
            return Err(AspError::UnknownRoot);
        }
        Ok(state.tree.proof(leaf_index)?)
    }

    /// Atomically check-and-reserve the operation's nullifier hashes.
    ///
    /// # Errors
    /// [`AspError::AlreadySpent`] when any hash is consumed or reserved by
    /// another in-flight operation.
    pub async fn reserve_nullifiers(
        &self,
        hashes: &[FieldElement],
    ) -> Result<(), AspError> {
        let mut state = self.tree.write().await;
        if hashes
            .iter()
            .any(|nh| state.spent.contains(nh) || state.in_flight.contains(nh))
        {
            return Err(AspError::AlreadySpent);
        }
        for nh in hashes {
            state.in_flight.insert(*nh);
        }
        Ok(())
    }

    /// Release reservations after a failed operation.
    pub async fn release_nullifiers(&self, hashes: &[FieldElement]) {
        let mut state = self.tree.write().await;
        for nh in hashes {
            state.in_flight.remove(nh);
        }
    }

    /// Move reservations to the permanent spent set and persist them.
    ///
    /// # Errors
    /// Propagates ledger persistence failures.
    pub async fn finalize_spent(
        &self,
        hashes: &[FieldElement],
        circuit: CircuitKind,
        tx_hash: &str,
    ) -> Result<(), AspError> {
        let mut state = self.tree.write().await;
        for nh in hashes {
            state.in_flight.remove(nh);
            state.spent.insert(*nh);
            self.db.insert_nullifier(nh, circuit, Some(tx_hash))?;
        }
        Ok(())
    }

    /// Append confirmed commitments produced by an operation, record the new
    /// root in the history and the ledger, and return it. Zero commitments
    /// (absent change notes) are skipped.
    ///
    /// # Errors
    /// [`AspError::TreeFull`] at capacity; ledger persistence failures.
    pub async fn publish_commitments(
        &self,
        commitments: &[FieldElement],
        tx_hash: &str,
    ) -> Result<FieldElement, AspError> {
        let mut state = self.tree.write().await;
        for commitment in commitments.iter().filter(|c| !c.is_zero()) {
            let index = state.tree.insert(*commitment)?;
            state.ledger.insert(*commitment, index);
            self.db.insert_commitment(index, commitment, Some(tx_hash))?;
            tracing::debug!(leaf_index = index, "commitment published");
        }
        let root = state.tree.root();
        let leaf_count = state.tree.leaf_count();
        state.history.push(root);
        self.db.insert_root(&root, leaf_count, Some(tx_hash))?;
        Ok(root)
    }

    /// The shared prove → submit → confirm → publish pipeline.
    ///
    /// Proving runs under the operation deadline. Submission is the one
    /// non-cancellable step: after broadcast the operation is driven to
    /// confirmation or observable rejection, and on an unknown outcome the
    /// input notes stay reserved so no dependent operation is accepted.
    ///
    /// # Errors
    /// Stage failures with their taxonomy kinds.
    pub async fn prove_and_submit(
        &self,
        inputs: &CircuitInputs,
        aux: &OperationAux,
        nullifier_hashes: &[FieldElement],
        new_commitments: &[FieldElement],
    ) -> Result<(String, ProofArtifact), AspError> {
        self.ensure_not_paused().await?;
        self.reserve_nullifiers(nullifier_hashes).await?;

        let artifact = match tokio::time::timeout(
            self.config.operation_timeout,
            self.prover.prove(inputs),
        )
        .await
        {
            Ok(Ok(artifact)) => artifact,
            Ok(Err(e)) => {
                self.release_nullifiers(nullifier_hashes).await;
                return Err(e.into());
            }
            Err(_) => {
                self.release_nullifiers(nullifier_hashes).await;
                return Err(AspError::Timeout);
            }
        };

        let tx_hash = match self
            .chain
            .submit_operation(inputs.circuit, &artifact.calldata, aux)
            .await
        {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                self.release_nullifiers(nullifier_hashes).await;
                return Err(e.into());
            }
        };

        match self.chain.wait_for_confirmation(&tx_hash).await {
            Ok(()) => {}
            Err(ChainError::ConfirmationTimeout(tx)) => {
                // Outcome unknown: keep the notes reserved until resolved.
                return Err(AspError::Chain(ChainError::ConfirmationTimeout(tx)));
            }
            Err(e) => {
                self.release_nullifiers(nullifier_hashes).await;
                return Err(e.into());
            }
        }

        self.finalize_spent(nullifier_hashes, inputs.circuit, &tx_hash)
            .await?;

        if new_commitments.iter().any(|c| !c.is_zero()) {
            let root = self.publish_commitments(new_commitments, &tx_hash).await?;
            if let Err(e) = self.chain.submit_root(&root).await {
                tracing::warn!("root submission failed, will retry on next publish: {e}");
            }
        }

        tracing::info!(tx_hash = %tx_hash, circuit = %inputs.circuit, "operation confirmed");
        Ok((tx_hash, artifact))
    }

    /// Reserve the next tentative leaf index for a deposit commitment.
    ///
    /// Idempotent: a commitment already confirmed returns its final index;
    /// one already pending returns the existing reservation.
    ///
    /// # Errors
    /// [`AspError::TreeFull`] when tree capacity (including pending
    /// reservations) is exhausted.
    pub async fn reserve_deposit(
        &self,
        commitment: FieldElement,
    ) -> Result<(u64, FieldElement, bool), AspError> {
        let mut state = self.tree.write().await;
        let root = state.tree.root();

        if let Some(index) = state.ledger.get(&commitment) {
            return Ok((*index, root, true));
        }
        if let Some(pending) = state.pending.iter().find(|p| p.commitment == commitment) {
            return Ok((pending.tentative_index, root, false));
        }

        let tentative_index = state
            .tree
            .leaf_count()
            .checked_add(u64::try_from(state.pending.len()).unwrap_or(u64::MAX))
            .ok_or(AspError::TreeFull)?;
        let capacity = 1u64
            .checked_shl(u32::try_from(zylith_tree::TREE_HEIGHT).unwrap_or(u32::MAX))
            .unwrap_or(u64::MAX);
        if tentative_index >= capacity {
            return Err(AspError::TreeFull);
        }
        state.pending.push_back(PendingDeposit {
            commitment,
            tentative_index,
            reserved_at: Instant::now(),
        });
        Ok((tentative_index, root, false))
    }
}

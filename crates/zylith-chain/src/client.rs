//! The client trait and read-model types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zylith_core::schema::pool::PoolKey;
use zylith_core::{CircuitKind, FieldElement};

use crate::error::ChainError;

/// Pool-level state read from the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Current sqrt price, X96 fixed point (decimal).
    pub sqrt_price: String,
    /// Current tick.
    pub tick: i32,
    /// Active liquidity.
    pub liquidity: u128,
    /// Global fee growth for token0 (decimal).
    pub fee_growth_global_0: String,
    /// Global fee growth for token1 (decimal).
    pub fee_growth_global_1: String,
    /// Accrued protocol fees for token0 (decimal).
    pub protocol_fees_0: String,
    /// Accrued protocol fees for token1 (decimal).
    pub protocol_fees_1: String,
}

/// Per-position state read from the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionState {
    /// Position liquidity.
    pub liquidity: u128,
    /// Fee growth inside the range at last touch, token0 (decimal).
    pub fee_growth_inside_last_0: String,
    /// Fee growth inside the range at last touch, token1 (decimal).
    pub fee_growth_inside_last_1: String,
    /// Amount of token0 owed (decimal).
    pub tokens_owed_0: String,
    /// Amount of token1 owed (decimal).
    pub tokens_owed_1: String,
}

/// Execution parameters that ride along with verifier calldata.
///
/// These are the pool-entry-point arguments that are not circuit publics,
/// exactly as the coordinator expects them per circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationAux {
    /// Withdraw: pay out to `recipient`.
    Withdraw {
        /// Recipient address (`0x`-hex).
        recipient: String,
    },
    /// Swap execution parameters.
    Swap {
        /// Target pool.
        pool_key: PoolKey,
        /// Price limit (decimal sqrt price X96).
        sqrt_price_limit: String,
    },
    /// Mint execution parameters.
    Mint {
        /// Target pool.
        pool_key: PoolKey,
        /// Liquidity to mint.
        liquidity: u128,
    },
    /// Burn execution parameters.
    Burn {
        /// Target pool.
        pool_key: PoolKey,
        /// Liquidity to burn.
        liquidity: u128,
    },
}

/// The enumerated on-chain capabilities the core consumes.
///
/// Implementations must make [`ChainClient::wait_for_confirmation`] drive a
/// broadcast transaction to either confirmation or observable rejection;
/// submission is the one non-cancellable step in an operation.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submit verifier calldata to the coordinator entry point for
    /// `circuit`. Returns the transaction hash.
    ///
    /// # Errors
    /// Transport failures and reverts.
    async fn submit_operation(
        &self,
        circuit: CircuitKind,
        calldata: &[String],
        aux: &OperationAux,
    ) -> Result<String, ChainError>;

    /// Publish a new Merkle root to the coordinator.
    ///
    /// # Errors
    /// Transport failures and reverts.
    async fn submit_root(&self, root: &FieldElement) -> Result<String, ChainError>;

    /// Block until `tx_hash` is confirmed or observably rejected.
    ///
    /// # Errors
    /// [`ChainError::Reverted`] on rejection,
    /// [`ChainError::ConfirmationTimeout`] when neither outcome is observed.
    async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<(), ChainError>;

    /// Build the escrow calldata a depositor must submit for `commitment`.
    ///
    /// # Errors
    /// Transport failures.
    async fn deposit_calldata(&self, commitment: &FieldElement)
        -> Result<Vec<String>, ChainError>;

    /// Read pool state.
    ///
    /// # Errors
    /// Transport failures and unknown pools.
    async fn pool_state(&self, pool: &PoolKey) -> Result<PoolState, ChainError>;

    /// Read per-owner position state.
    ///
    /// # Errors
    /// Transport failures and unknown positions.
    async fn position_state(
        &self,
        pool: &PoolKey,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<PositionState, ChainError>;

    /// Whether `nullifier_hash` is in the on-chain nullifier set.
    ///
    /// # Errors
    /// Transport failures.
    async fn is_nullifier_spent(&self, nullifier_hash: &FieldElement)
        -> Result<bool, ChainError>;

    /// Coordinator's current root.
    ///
    /// # Errors
    /// Transport failures.
    async fn merkle_root(&self) -> Result<FieldElement, ChainError>;

    /// Whether the coordinator recognizes `root`.
    ///
    /// # Errors
    /// Transport failures.
    async fn is_known_root(&self, root: &FieldElement) -> Result<bool, ChainError>;

    /// Next leaf index the coordinator will assign.
    ///
    /// # Errors
    /// Transport failures.
    async fn next_leaf_index(&self) -> Result<u64, ChainError>;

    /// Whether the coordinator is paused.
    ///
    /// # Errors
    /// Transport failures.
    async fn is_paused(&self) -> Result<bool, ChainError>;

    /// Commitments the coordinator accepted at or after `from_index`, in
    /// acceptance order. Feeds deposit finalization.
    ///
    /// # Errors
    /// Transport failures.
    async fn accepted_commitments(
        &self,
        from_index: u64,
    ) -> Result<Vec<FieldElement>, ChainError>;

    /// Latest observed block number.
    ///
    /// # Errors
    /// Transport failures.
    async fn latest_block(&self) -> Result<u64, ChainError>;
}

//! Request/response bodies for the ASP REST surface.

use serde::{Deserialize, Serialize};

use super::pool::PoolKey;

/// An input note being spent: the opener of a recorded commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteInput {
    /// Note secret (decimal field element).
    pub secret: String,
    /// Note nullifier (decimal field element).
    pub nullifier: String,
    /// Low u128 half of the balance (decimal).
    pub balance_low: String,
    /// High u128 half of the balance (decimal).
    pub balance_high: String,
    /// Token address (`0x`-hex).
    pub token: String,
    /// Position of the note's commitment in the tree.
    pub leaf_index: u64,
}

/// Fresh secrets for a note the operation will create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshNote {
    /// New note secret (decimal field element).
    pub secret: String,
    /// New note nullifier (decimal field element).
    pub nullifier: String,
}

/// A new LP position to be minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInput {
    /// Position secret (decimal field element).
    pub secret: String,
    /// Position nullifier (decimal field element).
    pub nullifier: String,
    /// Signed lower tick.
    pub tick_lower: i32,
    /// Signed upper tick.
    pub tick_upper: i32,
    /// Position liquidity (decimal u128).
    pub liquidity: String,
}

/// A recorded LP position being spent by a burn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSpend {
    /// Position secret (decimal field element).
    pub secret: String,
    /// Position nullifier (decimal field element).
    pub nullifier: String,
    /// Signed lower tick.
    pub tick_lower: i32,
    /// Signed upper tick.
    pub tick_upper: i32,
    /// Position liquidity (decimal u128).
    pub liquidity: String,
    /// Position of the commitment in the tree.
    pub leaf_index: u64,
}

/// Economic parameters of a swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    /// Token being sold (`0x`-hex).
    pub token_in: String,
    /// Token being bought (`0x`-hex).
    pub token_out: String,
    /// Low half of the input amount (decimal).
    pub amount_in_low: String,
    /// High half of the input amount (decimal).
    pub amount_in_high: String,
    /// Low half of the expected output amount (decimal).
    pub expected_out_low: String,
    /// High half of the expected output amount (decimal).
    pub expected_out_high: String,
}

/// Token amounts supplied to a mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintAmounts {
    /// Low half of the token0 amount (decimal).
    pub amount0_low: String,
    /// High half of the token0 amount (decimal).
    pub amount0_high: String,
    /// Low half of the token1 amount (decimal).
    pub amount1_low: String,
    /// High half of the token1 amount (decimal).
    pub amount1_high: String,
}

/// `POST /deposit` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Note commitment to register (decimal field element).
    pub commitment: String,
}

/// `POST /deposit` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositResponse {
    /// Operation status.
    pub status: String,
    /// Tentative leaf index reserved for the commitment.
    pub leaf_index: u64,
    /// Escrow calldata the caller must submit on chain.
    pub calldata: Vec<String>,
    /// Current confirmed tree root (`0x`-hex).
    pub root: String,
}

/// `POST /withdraw` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Note secret (decimal field element).
    pub secret: String,
    /// Note nullifier (decimal field element).
    pub nullifier: String,
    /// Low half of the note amount (decimal).
    pub amount_low: String,
    /// High half of the note amount (decimal).
    pub amount_high: String,
    /// Token address (`0x`-hex).
    pub token: String,
    /// Recipient address (`0x`-hex).
    pub recipient: String,
    /// Position of the note's commitment in the tree.
    pub leaf_index: u64,
}

/// `POST /withdraw` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawResponse {
    /// Operation status.
    pub status: String,
    /// Hash of the submitted transaction.
    pub tx_hash: String,
    /// Nullifier hash now recorded as spent (decimal).
    pub nullifier_hash: String,
}

/// `POST /swap` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Target pool.
    pub pool_key: PoolKey,
    /// Note being spent.
    pub input_note: NoteInput,
    /// Swap parameters.
    pub swap_params: SwapParams,
    /// Fresh secrets for the output note.
    pub output_note: FreshNote,
    /// Fresh secrets for the change note.
    pub change_note: FreshNote,
    /// Price limit for the swap (decimal sqrt price X96).
    pub sqrt_price_limit: String,
}

/// `POST /swap` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResponse {
    /// Operation status.
    pub status: String,
    /// Hash of the submitted transaction.
    pub tx_hash: String,
    /// Commitment of the output note (decimal).
    pub new_commitment: String,
    /// Commitment of the change note (decimal, "0" when exact-input).
    pub change_commitment: String,
}

/// `POST /mint` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    /// Target pool.
    pub pool_key: PoolKey,
    /// First input note (token0).
    pub input_note_0: NoteInput,
    /// Second input note (token1).
    pub input_note_1: NoteInput,
    /// Position to create.
    pub position: PositionInput,
    /// Amounts supplied to the position.
    pub amounts: MintAmounts,
    /// Fresh secrets for the token0 change note.
    pub change_note_0: FreshNote,
    /// Fresh secrets for the token1 change note.
    pub change_note_1: FreshNote,
    /// Liquidity to mint, passed to the pool entry point.
    pub liquidity: u128,
}

/// `POST /mint` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintResponse {
    /// Operation status.
    pub status: String,
    /// Hash of the submitted transaction.
    pub tx_hash: String,
    /// Commitment of the new position (decimal).
    pub position_commitment: String,
    /// Commitment of the token0 change note (decimal, "0" when none).
    pub change_commitment_0: String,
    /// Commitment of the token1 change note (decimal, "0" when none).
    pub change_commitment_1: String,
}

/// `POST /burn` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRequest {
    /// Target pool.
    pub pool_key: PoolKey,
    /// Position being burned.
    pub position_note: PositionSpend,
    /// Fresh secrets for the token0 output note.
    pub output_note_0: FreshNote,
    /// Fresh secrets for the token1 output note.
    pub output_note_1: FreshNote,
    /// Liquidity to burn, passed to the pool entry point.
    pub liquidity: u128,
}

/// `POST /burn` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnResponse {
    /// Operation status.
    pub status: String,
    /// Hash of the submitted transaction.
    pub tx_hash: String,
    /// Commitment of the token0 output note (decimal).
    pub new_commitment_0: String,
    /// Commitment of the token1 output note (decimal).
    pub new_commitment_1: String,
}

/// `GET /tree/root` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRootResponse {
    /// Current confirmed root (`0x`-hex).
    pub root: String,
    /// Number of confirmed leaves.
    pub leaf_count: u64,
}

/// `GET /tree/path/{leaf_index}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePathResponse {
    /// Queried leaf index.
    pub leaf_index: u64,
    /// Commitment stored at the leaf (decimal).
    pub commitment: String,
    /// Sibling values, leaf to root (decimal).
    pub path_elements: Vec<String>,
    /// Position bits of the leaf index, leaf to root.
    pub path_indices: Vec<u8>,
    /// Root the path verifies against (`0x`-hex).
    pub root: String,
}

/// `GET /nullifier/{hash}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierStatusResponse {
    /// Queried nullifier hash (decimal).
    pub nullifier_hash: String,
    /// Whether the hash has been consumed.
    pub spent: bool,
    /// Circuit that consumed it, when spent.
    pub circuit_type: Option<String>,
    /// Transaction that consumed it, when spent.
    pub tx_hash: Option<String>,
}

/// Tree section of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStatus {
    /// Number of confirmed leaves.
    pub leaf_count: u64,
    /// Current confirmed root (`0x`-hex).
    pub root: String,
}

/// Sync section of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Last chain block observed by the deposit sync task.
    pub last_synced_block: u64,
}

/// Contracts section of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsStatus {
    /// Verifier coordinator address (`0x`-hex).
    pub coordinator: String,
    /// Pool address (`0x`-hex).
    pub pool: String,
}

/// `GET /status` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Service liveness.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Tree state summary.
    pub tree: TreeStatus,
    /// Sync state summary.
    pub sync: SyncStatus,
    /// Configured contract addresses.
    pub contracts: ContractsStatus,
}

/// `POST /sync-commitments` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommitmentsRequest {
    /// Commitments to look up (decimal).
    pub commitments: Vec<String>,
}

/// One entry of the sync-commitments response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentIndex {
    /// Queried commitment (decimal).
    pub commitment: String,
    /// Assigned leaf index, when the commitment is confirmed.
    pub leaf_index: Option<u64>,
}

/// `POST /sync-commitments` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommitmentsResponse {
    /// Lookup results, in request order.
    pub commitments: Vec<CommitmentIndex>,
}

/// Wire error shape for every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable message; never contains secrets.
    pub message: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    #[test]
    fn wire_fields_are_snake_case() {
        let req = DepositRequest {
            commitment: "12345".into(),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"commitment":"12345"}"#
        );

        let resp = SwapResponse {
            status: "confirmed".into(),
            tx_hash: "0xabc".into(),
            new_commitment: "1".into(),
            change_commitment: "0".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("new_commitment").is_some());
        assert!(json.get("change_commitment").is_some());
    }

    #[test]
    fn ticks_stay_signed_on_the_wire() {
        let pos = PositionInput {
            secret: "1".into(),
            nullifier: "2".into(),
            tick_lower: -1000,
            tick_upper: 1000,
            liquidity: "500000".into(),
        };
        let json = serde_json::to_value(&pos).unwrap();
        assert_eq!(json.get("tick_lower").unwrap().as_i64(), Some(-1000));
    }
}

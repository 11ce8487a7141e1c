//! Wire messages for the worker channel.
//!
//! Newline-delimited JSON over stdio. The worker emits `{"ready":true}`
//! once Poseidon is initialized, then answers requests strictly in order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request line: `{"id": ..., "command": ..., "params": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    /// Caller-chosen correlation id, echoed in the response.
    pub id: String,
    /// Command name (camelCase).
    pub command: String,
    /// Command parameters.
    #[serde(default)]
    pub params: Value,
}

/// A response line: `{"id": ..., "ok": true, "data": {...}}` or
/// `{"id": ..., "ok": false, "error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResponse {
    /// Correlation id of the request being answered.
    pub id: String,
    /// Whether the command succeeded.
    pub ok: bool,
    /// Result payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error kind and message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The handshake line the worker prints before reading commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyLine {
    /// Always `true`.
    pub ready: bool,
}

/// Groth16 proof points as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPoints {
    /// G1 point A: `[x, y]`.
    pub a: [String; 2],
    /// G2 point B: `[[x.c0, x.c1], [y.c0, y.c1]]`.
    pub b: [[String; 2]; 2],
    /// G1 point C: `[x, y]`.
    pub c: [String; 2],
}

/// Result of `generateProof`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    /// The proof points.
    pub proof: ProofPoints,
    /// Ordered public signals (decimal strings).
    pub public_signals: Vec<String>,
    /// Flat verifier calldata (decimal strings).
    pub calldata: Vec<String>,
}

/// Parameters of `computeCommitment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeCommitmentParams {
    /// Note secret (decimal).
    pub secret: String,
    /// Note nullifier (decimal).
    pub nullifier: String,
    /// Low amount half (decimal).
    pub amount_low: String,
    /// High amount half (decimal).
    pub amount_high: String,
    /// Token address (decimal or hex).
    pub token: String,
}

/// Parameters of `computePositionCommitment`; ticks are signed here, the
/// worker performs the offset itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputePositionCommitmentParams {
    /// Position secret (decimal).
    pub secret: String,
    /// Position nullifier (decimal).
    pub nullifier: String,
    /// Signed lower tick.
    pub tick_lower: i32,
    /// Signed upper tick.
    pub tick_upper: i32,
    /// Liquidity (decimal u128).
    pub liquidity: String,
}

/// Parameters of `generateProof`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateProofParams {
    /// Circuit name.
    pub circuit: String,
    /// Named signal assignment.
    pub inputs: Value,
}

/// Parameters of `buildTree`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTreeParams {
    /// Leaves in insertion order (decimal).
    pub leaves: Vec<String>,
}

/// Parameters of `insertLeaf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertLeafParams {
    /// Leaf value (decimal).
    pub leaf: String,
}

/// Parameters of `getProof`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetProofParams {
    /// Index to prove.
    pub leaf_index: u64,
}

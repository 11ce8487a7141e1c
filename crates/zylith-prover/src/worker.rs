//! The worker request loop.
//!
//! Single-threaded and strictly sequential per connection: requests are
//! answered in arrival order, one at a time. Poseidon is initialized before
//! the ready line is emitted, so a parent that has seen `{"ready":true}`
//! can rely on every command being servable. A closed stdin ends the loop
//! cleanly; in-flight work is simply abandoned with the process.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
use zylith_core::{Amount, CircuitKind, FieldElement, PoseidonHasher, Tick};
use zylith_tree::LeanImt;

use crate::engine::ProofEngine;
use crate::error::ProverError;
use crate::protocol::{
    BuildTreeParams, ComputeCommitmentParams, ComputePositionCommitmentParams,
    GenerateProofParams, GetProofParams, InsertLeafParams, WorkerRequest, WorkerResponse,
};

/// Resident worker state: hasher, tree replica and proving engine.
#[derive(Debug)]
pub struct WorkerState {
    hasher: Arc<PoseidonHasher>,
    tree: LeanImt,
    engine: ProofEngine,
}

impl WorkerState {
    /// Initialize Poseidon (fail-fast) and open the artifact directory.
    ///
    /// # Errors
    /// Fails when Poseidon parameters cannot be constructed.
    pub fn new(artifact_dir: PathBuf) -> Result<Self, ProverError> {
        let hasher = Arc::new(PoseidonHasher::new()?);
        let tree = LeanImt::with_default_height(Arc::clone(&hasher));
        Ok(Self {
            hasher,
            tree,
            engine: ProofEngine::new(artifact_dir),
        })
    }

    /// Answer one request. Never panics; failures become error responses.
    #[must_use]
    pub fn handle(&mut self, request: WorkerRequest) -> WorkerResponse {
        match self.dispatch(&request.command, request.params) {
            Ok(data) => WorkerResponse {
                id: request.id,
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(e) => WorkerResponse {
                id: request.id,
                ok: false,
                data: None,
                error: Some(format!("{}: {e}", e.kind())),
            },
        }
    }

    fn dispatch(&mut self, command: &str, params: Value) -> Result<Value, ProverError> {
        match command {
            "ping" => Ok(json!({"pong": true})),
            "buildTree" => {
                let params: BuildTreeParams = parse(params)?;
                let mut tree = LeanImt::with_default_height(Arc::clone(&self.hasher));
                for leaf in &params.leaves {
                    let value = FieldElement::from_decimal(leaf)?;
                    tree.insert(value)?;
                }
                self.tree = tree;
                Ok(json!({
                    "root": self.tree.root().to_decimal(),
                    "leaf_count": self.tree.leaf_count(),
                }))
            }
            "insertLeaf" => {
                let params: InsertLeafParams = parse(params)?;
                let value = FieldElement::from_decimal(&params.leaf)?;
                let leaf_index = self.tree.insert(value)?;
                Ok(json!({
                    "leaf_index": leaf_index,
                    "root": self.tree.root().to_decimal(),
                }))
            }
            "getRoot" => Ok(json!({
                "root": self.tree.root().to_decimal(),
                "leaf_count": self.tree.leaf_count(),
            })),
            "getProof" => {
                let params: GetProofParams = parse(params)?;
                let proof = self.tree.proof(params.leaf_index)?;
                let leaf = self.tree.leaf(params.leaf_index)?;
                Ok(json!({
                    "leaf_index": proof.leaf_index,
                    "commitment": leaf.to_decimal(),
                    "path_elements": proof
                        .path_elements
                        .iter()
                        .map(FieldElement::to_decimal)
                        .collect::<Vec<_>>(),
                    "path_indices": proof.path_indices,
                    "root": proof.root.to_decimal(),
                }))
            }
            "computeCommitment" => {
                let params: ComputeCommitmentParams = parse(params)?;
                let secret = FieldElement::from_decimal(&params.secret)?;
                let nullifier = FieldElement::from_decimal(&params.nullifier)?;
                let token = params.token.parse::<FieldElement>()?;
                let amount = Amount::from_halves(
                    parse_u128(&params.amount_low, "amount_low")?,
                    parse_u128(&params.amount_high, "amount_high")?,
                );
                let commitment = zylith_core::commitment::note_commitment(
                    &self.hasher,
                    secret,
                    nullifier,
                    &amount,
                    token,
                )?;
                let nh = zylith_core::commitment::nullifier_hash(&self.hasher, nullifier)?;
                Ok(json!({
                    "commitment": commitment.to_decimal(),
                    "nullifier_hash": nh.to_decimal(),
                }))
            }
            "computePositionCommitment" => {
                let params: ComputePositionCommitmentParams = parse(params)?;
                let secret = FieldElement::from_decimal(&params.secret)?;
                let nullifier = FieldElement::from_decimal(&params.nullifier)?;
                let tick_lower = Tick::new(params.tick_lower)?;
                let tick_upper = Tick::new(params.tick_upper)?;
                let liquidity = parse_u128(&params.liquidity, "liquidity")?;
                let commitment = zylith_core::commitment::position_commitment(
                    &self.hasher,
                    secret,
                    nullifier,
                    tick_lower.to_offset(),
                    tick_upper.to_offset(),
                    liquidity,
                )?;
                let nh = zylith_core::commitment::nullifier_hash(&self.hasher, nullifier)?;
                Ok(json!({
                    "commitment": commitment.to_decimal(),
                    "nullifier_hash": nh.to_decimal(),
                }))
            }
            "generateProof" => {
                let params: GenerateProofParams = parse(params)?;
                let circuit: CircuitKind = params
                    .circuit
                    .parse()
                    .map_err(|e: zylith_core::circuit::UnknownCircuit| {
                        ProverError::Protocol(e.to_string())
                    })?;
                let inputs: Map<String, Value> = match params.inputs {
                    Value::Object(map) => map,
                    _ => return Err(ProverError::Protocol("inputs must be an object".into())),
                };
                let artifact = self.engine.generate_proof(circuit, &inputs)?;
                serde_json::to_value(&artifact)
                    .map_err(|e| ProverError::Protocol(e.to_string()))
            }
            other => Err(ProverError::Protocol(format!("unknown command: {other}"))),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, ProverError> {
    serde_json::from_value(params).map_err(|e| ProverError::Protocol(e.to_string()))
}

fn parse_u128(s: &str, name: &str) -> Result<u128, ProverError> {
    s.parse::<u128>()
        .map_err(|_| ProverError::Protocol(format!("{name} is not a u128 decimal")))
}

/// Run the stdio loop until stdin closes.
///
/// # Errors
/// Fails on Poseidon initialization or an unrecoverable stdio error.
pub async fn run(artifact_dir: PathBuf) -> Result<(), ProverError> {
    let mut state = WorkerState::new(artifact_dir)?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    stdout.write_all(b"{\"ready\":true}\n").await?;
    stdout.flush().await?;

    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<WorkerRequest>(&line) {
            Ok(request) => state.handle(request),
            Err(e) => WorkerResponse {
                id: String::new(),
                ok: false,
                data: None,
                error: Some(format!("protocol: {e}")),
            },
        };
        let mut out =
            serde_json::to_string(&response).map_err(|e| ProverError::Protocol(e.to_string()))?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    fn state() -> WorkerState {
        WorkerState::new(PathBuf::from("/nonexistent-artifacts")).unwrap()
    }

    fn request(id: &str, command: &str, params: Value) -> WorkerRequest {
        WorkerRequest {
            id: id.into(),
            command: command.into(),
            params,
        }
    }

    #[test]
    fn ping_answers_in_order_with_matching_ids() {
        let mut state = state();
        let resp = state.handle(request("a", "ping", Value::Null));
        assert_eq!(resp.id, "a");
        assert!(resp.ok);
    }

    #[test]
    fn tree_commands_share_one_replica() {
        let mut state = state();

        let resp = state.handle(request(
            "1",
            "buildTree",
            json!({"leaves": ["111", "222"]}),
        ));
        assert!(resp.ok, "{:?}", resp.error);
        let count = resp
            .data
            .as_ref()
            .and_then(|d| d.get("leaf_count"))
            .and_then(Value::as_u64);
        assert_eq!(count, Some(2));

        let resp = state.handle(request("2", "insertLeaf", json!({"leaf": "333"})));
        assert!(resp.ok);
        assert_eq!(
            resp.data
                .as_ref()
                .and_then(|d| d.get("leaf_index"))
                .and_then(Value::as_u64),
            Some(2)
        );

        let resp = state.handle(request("3", "getProof", json!({"leaf_index": 1})));
        assert!(resp.ok);
        let data = resp.data.unwrap();
        assert_eq!(
            data.get("commitment").and_then(Value::as_str),
            Some("222")
        );
        assert_eq!(
            data.get("path_elements")
                .and_then(Value::as_array)
                .map(Vec::len),
            Some(zylith_tree::TREE_HEIGHT)
        );
    }

    #[test]
    fn single_leaf_root_equals_leaf() {
        let mut state = state();
        let resp = state.handle(request("1", "buildTree", json!({"leaves": ["12345"]})));
        assert!(resp.ok);
        assert_eq!(
            resp.data
                .as_ref()
                .and_then(|d| d.get("root"))
                .and_then(Value::as_str),
            Some("12345")
        );
    }

    #[test]
    fn commitment_command_matches_core() {
        let mut state = state();
        let resp = state.handle(request(
            "1",
            "computeCommitment",
            json!({
                "secret": "11",
                "nullifier": "22",
                "amount_low": "1000000",
                "amount_high": "0",
                "token": "33",
            }),
        ));
        assert!(resp.ok, "{:?}", resp.error);

        let hasher = PoseidonHasher::new().unwrap();
        let expected = zylith_core::commitment::note_commitment(
            &hasher,
            FieldElement::from_u64(11),
            FieldElement::from_u64(22),
            &Amount::from_u128(1_000_000),
            FieldElement::from_u64(33),
        )
        .unwrap();
        assert_eq!(
            resp.data
                .as_ref()
                .and_then(|d| d.get("commitment"))
                .and_then(Value::as_str),
            Some(expected.to_decimal().as_str())
        );
    }

    #[test]
    fn unknown_command_is_a_protocol_error() {
        let mut state = state();
        let resp = state.handle(request("9", "frobnicate", Value::Null));
        assert!(!resp.ok);
        assert!(resp.error.unwrap().starts_with("protocol"));
    }

    #[test]
    fn invalid_field_surfaces_as_error_response() {
        let mut state = state();
        let resp = state.handle(request(
            "1",
            "insertLeaf",
            json!({"leaf": zylith_core::field::FIELD_MODULUS_DEC}),
        ));
        assert!(!resp.ok);
        assert!(resp.error.unwrap().contains("hash"));
    }
}

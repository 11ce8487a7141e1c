//! JSON-RPC implementation of [`ChainClient`].
//!
//! Speaks JSON-RPC 2.0 against the node's gateway; the coordinator and pool
//! addresses come from configuration and ride in every call's params. Reads
//! are retried per [`RetryConfig`]; writes are submitted once and then
//! driven through `wait_for_confirmation`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use zylith_core::schema::pool::PoolKey;
use zylith_core::{CircuitKind, FieldElement};

use crate::client::{ChainClient, OperationAux, PoolState, PositionState};
use crate::error::ChainError;
use crate::retry::{retry_with_backoff, RetryConfig};

/// Contract addresses the client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Verifier coordinator address (`0x`-hex).
    pub coordinator: String,
    /// CLMM pool address (`0x`-hex).
    pub pool: String,
}

/// JSON-RPC 2.0 client over HTTP.
#[derive(Debug)]
pub struct JsonRpcChainClient {
    http: reqwest::Client,
    url: String,
    contracts: ContractAddresses,
    retry: RetryConfig,
    confirmation_poll: Duration,
    confirmation_attempts: u32,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl JsonRpcChainClient {
    /// Create a client against `url` with the configured contracts.
    #[must_use]
    pub fn new(url: String, contracts: ContractAddresses) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            contracts,
            retry: RetryConfig::default(),
            confirmation_poll: Duration::from_secs(2),
            confirmation_attempts: 30,
            next_id: AtomicU64::new(1),
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let envelope: RpcEnvelope = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = envelope.error {
            // Execution reverts come back as a dedicated error code; node
            // trouble is anything else.
            return if error.code == -32000 {
                Err(ChainError::Reverted(error.message))
            } else {
                Err(ChainError::Rpc(format!("{} ({})", error.message, error.code)))
            };
        }
        let result = envelope
            .result
            .ok_or_else(|| ChainError::InvalidResponse("missing result".into()))?;
        serde_json::from_value(result).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        retry_with_backoff(&self.retry, || self.call_once(method, params.clone())).await
    }

    fn field(value: &str) -> Result<FieldElement, ChainError> {
        value
            .parse::<FieldElement>()
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn submit_operation(
        &self,
        circuit: CircuitKind,
        calldata: &[String],
        aux: &OperationAux,
    ) -> Result<String, ChainError> {
        // Submission is not retried: a duplicate broadcast could double-apply.
        self.call_once(
            "zylith_submitOperation",
            json!({
                "coordinator": self.contracts.coordinator,
                "circuit": circuit.as_str(),
                "calldata": calldata,
                "aux": aux,
            }),
        )
        .await
    }

    async fn submit_root(&self, root: &FieldElement) -> Result<String, ChainError> {
        self.call_once(
            "zylith_submitRoot",
            json!({
                "coordinator": self.contracts.coordinator,
                "root": root.to_hex(),
            }),
        )
        .await
    }

    async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<(), ChainError> {
        for _ in 0..self.confirmation_attempts {
            #[derive(Deserialize)]
            struct Receipt {
                status: String,
                #[serde(default)]
                revert_reason: Option<String>,
            }
            let receipt: Option<Receipt> = self
                .call(
                    "zylith_getTransactionReceipt",
                    json!({ "tx_hash": tx_hash }),
                )
                .await?;
            if let Some(receipt) = receipt {
                return match receipt.status.as_str() {
                    "confirmed" => Ok(()),
                    "rejected" => Err(ChainError::Reverted(
                        receipt.revert_reason.unwrap_or_else(|| "rejected".into()),
                    )),
                    _ => {
                        tokio::time::sleep(self.confirmation_poll).await;
                        continue;
                    }
                };
            }
            tokio::time::sleep(self.confirmation_poll).await;
        }
        Err(ChainError::ConfirmationTimeout(tx_hash.to_owned()))
    }

    async fn deposit_calldata(
        &self,
        commitment: &FieldElement,
    ) -> Result<Vec<String>, ChainError> {
        self.call(
            "zylith_buildDepositCalldata",
            json!({
                "coordinator": self.contracts.coordinator,
                "commitment": commitment.to_decimal(),
            }),
        )
        .await
    }

    async fn pool_state(&self, pool: &PoolKey) -> Result<PoolState, ChainError> {
        self.call(
            "zylith_getPoolState",
            json!({ "pool": self.contracts.pool, "pool_key": pool }),
        )
        .await
    }

    async fn position_state(
        &self,
        pool: &PoolKey,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<PositionState, ChainError> {
        self.call(
            "zylith_getPositionState",
            json!({
                "pool": self.contracts.pool,
                "pool_key": pool,
                "tick_lower": tick_lower,
                "tick_upper": tick_upper,
            }),
        )
        .await
    }

    async fn is_nullifier_spent(
        &self,
        nullifier_hash: &FieldElement,
    ) -> Result<bool, ChainError> {
        self.call(
            "zylith_isNullifierSpent",
            json!({
                "coordinator": self.contracts.coordinator,
                "nullifier_hash": nullifier_hash.to_decimal(),
            }),
        )
        .await
    }

    async fn merkle_root(&self) -> Result<FieldElement, ChainError> {
        let root: String = self
            .call(
                "zylith_getMerkleRoot",
                json!({ "coordinator": self.contracts.coordinator }),
            )
            .await?;
        Self::field(&root)
    }

    async fn is_known_root(&self, root: &FieldElement) -> Result<bool, ChainError> {
        self.call(
            "zylith_isKnownRoot",
            json!({
                "coordinator": self.contracts.coordinator,
                "root": root.to_hex(),
            }),
        )
        .await
    }

    async fn next_leaf_index(&self) -> Result<u64, ChainError> {
        self.call(
            "zylith_nextLeafIndex",
            json!({ "coordinator": self.contracts.coordinator }),
        )
        .await
    }

    async fn is_paused(&self) -> Result<bool, ChainError> {
        self.call(
            "zylith_isPaused",
            json!({ "coordinator": self.contracts.coordinator }),
        )
        .await
    }

    async fn accepted_commitments(
        &self,
        from_index: u64,
    ) -> Result<Vec<FieldElement>, ChainError> {
        let raw: Vec<String> = self
            .call(
                "zylith_getAcceptedCommitments",
                json!({
                    "coordinator": self.contracts.coordinator,
                    "from_index": from_index,
                }),
            )
            .await?;
        raw.iter().map(|s| Self::field(s)).collect()
    }

    async fn latest_block(&self) -> Result<u64, ChainError> {
        self.call("zylith_blockNumber", json!({})).await
    }
}

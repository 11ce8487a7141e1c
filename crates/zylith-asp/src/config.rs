//! Service configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zylith_chain::rpc::ContractAddresses;

/// Verifier addresses per circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierAddresses {
    /// Membership verifier address.
    pub membership: String,
    /// Swap verifier address.
    pub swap: String,
    /// Mint verifier address.
    pub mint: String,
    /// Burn verifier address.
    pub burn: String,
}

/// Everything the ASP needs to run.
#[derive(Debug, Clone)]
pub struct AspConfig {
    /// Bind address for the REST listener.
    pub bind: SocketAddr,
    /// Chain RPC endpoint.
    pub rpc_url: String,
    /// Chain identifier (rides in status/logging only).
    pub chain_id: String,
    /// Coordinator and pool addresses.
    pub contracts: ContractAddresses,
    /// Verifier addresses per circuit.
    pub verifiers: VerifierAddresses,
    /// Directory holding `{circuit}.{wasm,r1cs,zkey}`.
    pub artifact_dir: PathBuf,
    /// Directory for the sled ledger.
    pub data_dir: PathBuf,
    /// Path to the `zylith-prover-worker` binary.
    pub worker_bin: PathBuf,
    /// Concurrent proof admission bound.
    pub prover_workers: usize,
    /// Overall per-operation deadline covering prover + chain.
    pub operation_timeout: Duration,
    /// Number of roots retained in the history.
    pub root_history_size: usize,
    /// Poll period of the deposit finalization task.
    pub sync_interval: Duration,
    /// How long a tentative deposit reservation survives unobserved.
    pub pending_deposit_ttl: Duration,
}

impl Default for AspConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
            rpc_url: "http://127.0.0.1:5050".into(),
            chain_id: "zylith-devnet".into(),
            contracts: ContractAddresses {
                coordinator: "0x0".into(),
                pool: "0x0".into(),
            },
            verifiers: VerifierAddresses {
                membership: "0x0".into(),
                swap: "0x0".into(),
                mint: "0x0".into(),
                burn: "0x0".into(),
            },
            artifact_dir: PathBuf::from("artifacts"),
            data_dir: PathBuf::from("data"),
            worker_bin: PathBuf::from("zylith-prover-worker"),
            prover_workers: 2,
            operation_timeout: Duration::from_secs(60),
            root_history_size: 128,
            sync_interval: Duration::from_secs(5),
            pending_deposit_ttl: Duration::from_secs(600),
        }
    }
}

//! Parent-side worker client and pool.
//!
//! [`WorkerClient`] owns one subprocess: spawn, ready handshake, id-matched
//! request/response over stdio, kill on drop. [`WorkerPool`] owns several
//! and bounds admission with a semaphore so concurrent proofs cannot exhaust
//! memory; a worker that fails at the channel level is discarded rather
//! than returned to the pool.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, Semaphore};
use zylith_circuits::CircuitInputs;
use zylith_core::CircuitKind;

use crate::error::ProverError;
use crate::protocol::{ProofArtifact, ReadyLine, WorkerRequest, WorkerResponse};

/// Default time allowed for the ready handshake.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can turn circuit inputs into a proof artifact.
///
/// The production implementation is [`WorkerPool`]; orchestration tests use
/// [`crate::StubProofBackend`].
#[async_trait]
pub trait ProofBackend: Send + Sync {
    /// Generate, locally verify and format a proof.
    ///
    /// # Errors
    /// Surfaces pipeline failures with stage-specific kinds.
    async fn prove(&self, inputs: &CircuitInputs) -> Result<ProofArtifact, ProverError>;
}

/// One spawned worker subprocess.
#[derive(Debug)]
pub struct WorkerClient {
    _child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl WorkerClient {
    /// Spawn a worker binary and wait for its ready line.
    ///
    /// # Errors
    /// Returns [`ProverError::NotReady`] when the handshake times out or
    /// the first line is not `{"ready":true}`.
    pub async fn spawn(
        program: &Path,
        artifact_dir: &Path,
        ready_timeout: Duration,
    ) -> Result<Self, ProverError> {
        let mut child = Command::new(program)
            .arg("--artifact-dir")
            .arg(artifact_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProverError::Protocol("worker stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProverError::Protocol("worker stdout unavailable".into()))?;
        let mut lines = BufReader::new(stdout).lines();

        let first = tokio::time::timeout(ready_timeout, lines.next_line())
            .await
            .map_err(|_| ProverError::NotReady)??
            .ok_or(ProverError::NotReady)?;
        let ready: ReadyLine =
            serde_json::from_str(&first).map_err(|_| ProverError::NotReady)?;
        if !ready.ready {
            return Err(ProverError::NotReady);
        }

        Ok(Self {
            _child: child,
            stdin,
            lines,
            next_id: 0,
        })
    }

    /// Send one request and wait for its response. Strictly sequential.
    ///
    /// # Errors
    /// Channel failures and worker-reported errors.
    pub async fn request(
        &mut self,
        command: &str,
        params: Value,
    ) -> Result<Value, ProverError> {
        self.next_id = self.next_id.wrapping_add(1);
        let id = self.next_id.to_string();
        let request = WorkerRequest {
            id: id.clone(),
            command: command.to_owned(),
            params,
        };
        let mut line = serde_json::to_string(&request)
            .map_err(|e| ProverError::Protocol(e.to_string()))?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let answer = self
            .lines
            .next_line()
            .await?
            .ok_or_else(|| ProverError::Protocol("worker closed its stdout".into()))?;
        let response: WorkerResponse =
            serde_json::from_str(&answer).map_err(|e| ProverError::Protocol(e.to_string()))?;
        if response.id != id {
            return Err(ProverError::Protocol(format!(
                "response id {} does not match request id {id}",
                response.id
            )));
        }
        if response.ok {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            Err(ProverError::Worker(
                response.error.unwrap_or_else(|| "unspecified".into()),
            ))
        }
    }

    /// Liveness check.
    ///
    /// # Errors
    /// Channel failures.
    pub async fn ping(&mut self) -> Result<(), ProverError> {
        self.request("ping", Value::Null).await.map(|_| ())
    }

    /// Run `generateProof` for a prepared signal assignment.
    ///
    /// # Errors
    /// Pipeline failures as reported by the worker.
    pub async fn generate_proof(
        &mut self,
        circuit: CircuitKind,
        signals: &serde_json::Map<String, Value>,
    ) -> Result<ProofArtifact, ProverError> {
        let data = self
            .request(
                "generateProof",
                json!({
                    "circuit": circuit.as_str(),
                    "inputs": Value::Object(signals.clone()),
                }),
            )
            .await?;
        serde_json::from_value(data).map_err(|e| ProverError::Protocol(e.to_string()))
    }

    /// Rebuild the worker's tree replica.
    ///
    /// # Errors
    /// Channel failures and worker-reported errors.
    pub async fn build_tree(&mut self, leaves: &[String]) -> Result<Value, ProverError> {
        self.request("buildTree", json!({ "leaves": leaves })).await
    }

    /// Append one leaf to the worker's tree replica.
    ///
    /// # Errors
    /// Channel failures and worker-reported errors.
    pub async fn insert_leaf(&mut self, leaf: &str) -> Result<Value, ProverError> {
        self.request("insertLeaf", json!({ "leaf": leaf })).await
    }

    /// Fetch an authentication path from the worker's tree replica.
    ///
    /// # Errors
    /// Channel failures and worker-reported errors.
    pub async fn get_proof(&mut self, leaf_index: u64) -> Result<Value, ProverError> {
        self.request("getProof", json!({ "leaf_index": leaf_index }))
            .await
    }
}

/// A fixed set of workers with bounded proof admission.
pub struct WorkerPool {
    workers: Mutex<Vec<WorkerClient>>,
    permits: Semaphore,
}

impl WorkerPool {
    /// Spawn `count` workers over the same artifact directory.
    ///
    /// # Errors
    /// Fails when any worker cannot be spawned or does not become ready.
    pub async fn spawn(
        program: &Path,
        artifact_dir: &Path,
        count: usize,
    ) -> Result<Self, ProverError> {
        let count = count.max(1);
        let mut workers = Vec::with_capacity(count);
        for _ in 0..count {
            workers.push(WorkerClient::spawn(program, artifact_dir, DEFAULT_READY_TIMEOUT).await?);
        }
        Ok(Self {
            workers: Mutex::new(workers),
            permits: Semaphore::new(count),
        })
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProofBackend for WorkerPool {
    async fn prove(&self, inputs: &CircuitInputs) -> Result<ProofArtifact, ProverError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ProverError::Protocol("worker pool closed".into()))?;

        let mut worker = self
            .workers
            .lock()
            .await
            .pop()
            .ok_or_else(|| ProverError::Protocol("no workers available".into()))?;

        let result = worker.generate_proof(inputs.circuit, &inputs.signals).await;

        match &result {
            // A channel-level failure means the process is suspect; drop it
            // and shrink the pool rather than hand out a dead worker.
            Err(ProverError::Io(_) | ProverError::Protocol(_) | ProverError::NotReady) => {
                tracing::warn!(circuit = %inputs.circuit, "discarding failed prover worker");
                permit.forget();
                drop(worker);
            }
            _ => {
                self.workers.lock().await.push(worker);
                drop(permit);
            }
        }

        let artifact = result?;
        if artifact.public_signals.len() != inputs.publics.len() {
            return Err(ProverError::PublicSignals {
                expected: inputs.publics.len(),
                actual: artifact.public_signals.len(),
            });
        }
        Ok(artifact)
    }
}

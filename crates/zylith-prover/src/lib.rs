//! Groth16 proving worker and its parent-side pool.
//!
//! The worker is a long-lived subprocess speaking newline-delimited JSON on
//! stdin/stdout. It holds the Poseidon state and circuit artifacts resident,
//! serves tree and commitment queries, and runs the proof pipeline: witness
//! generation, local verification, artifact export and calldata formatting.
//! The parent side spawns workers, performs the ready handshake and bounds
//! admission so concurrent proofs cannot exhaust memory.

/// Verifier calldata formatting.
pub mod calldata;
/// Parent-side worker client and pool.
pub mod client;
/// The Groth16 proof pipeline.
pub mod engine;
/// Error types for the prover.
pub mod error;
/// Wire messages for the worker channel.
pub mod protocol;
/// Deterministic stub backend for orchestration tests.
pub mod stub;
/// The worker request loop.
pub mod worker;

pub use client::{ProofBackend, WorkerClient, WorkerPool};
pub use error::ProverError;
pub use protocol::{ProofArtifact, ProofPoints, WorkerRequest, WorkerResponse};
pub use stub::StubProofBackend;

//! Error types for the prover.

use zylith_core::CoreError;
use zylith_tree::TreeError;

/// Failures along the proof pipeline and the worker channel.
///
/// Each pipeline stage has its own variant so callers can distinguish a
/// witness failure (bad inputs) from a local verification failure (never
/// submit) from plumbing problems.
#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    /// Channel or process IO failure.
    #[error("worker io: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed message on the worker channel.
    #[error("worker protocol: {0}")]
    Protocol(String),

    /// The worker exited or failed the ready handshake.
    #[error("worker did not become ready")]
    NotReady,

    /// Witness generation failed against the compiled circuit.
    #[error("witness generation: {0}")]
    Witness(String),

    /// Groth16 proving failed.
    #[error("proving: {0}")]
    Proving(String),

    /// The freshly produced proof did not verify locally. Fatal for the
    /// operation: nothing is submitted.
    #[error("local verification failed")]
    LocalVerification,

    /// Circuit artifacts missing or unreadable.
    #[error("artifact: {0}")]
    Artifact(String),

    /// Calldata formatting failed.
    #[error("calldata: {0}")]
    Calldata(String),

    /// The circuit emitted a different public block than declared.
    #[error("public signals mismatch: expected {expected}, got {actual}")]
    PublicSignals {
        /// Declared count.
        expected: usize,
        /// Emitted count.
        actual: usize,
    },

    /// Error string reported by the worker process.
    #[error("worker: {0}")]
    Worker(String),

    /// Hash-layer failure inside the worker.
    #[error("hash: {0}")]
    Core(#[from] CoreError),

    /// Tree failure inside the worker.
    #[error("tree: {0}")]
    Tree(#[from] TreeError),
}

impl ProverError {
    /// Stable kind tag used on the worker channel.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Protocol(_) => "protocol",
            Self::NotReady => "not_ready",
            Self::Witness(_) => "witness_generation",
            Self::Proving(_) => "proving",
            Self::LocalVerification => "local_verification",
            Self::Artifact(_) => "artifact",
            Self::Calldata(_) => "calldata",
            Self::PublicSignals { .. } => "public_signals",
            Self::Worker(_) => "worker",
            Self::Core(_) => "hash",
            Self::Tree(_) => "tree",
        }
    }
}

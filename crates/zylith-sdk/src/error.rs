//! Error types for the SDK.

use zylith_chain::ChainError;
use zylith_core::CoreError;
use zylith_prover::ProverError;
use zylith_vault::VaultError;

/// Failures surfaced to SDK callers.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Vault storage or decryption failure.
    #[error("vault: {0}")]
    Vault(#[from] VaultError),

    /// Transport failure talking to the ASP.
    #[error("asp transport: {0}")]
    Http(#[from] reqwest::Error),

    /// The ASP rejected the request.
    #[error("asp rejected ({kind}): {message}")]
    Asp {
        /// HTTP status code.
        status: u16,
        /// Wire error kind.
        kind: String,
        /// Human-readable message.
        message: String,
    },

    /// Chain read failure.
    #[error("chain: {0}")]
    Chain(#[from] ChainError),

    /// Local prover worker failure (client-side mode).
    #[error("prover: {0}")]
    Prover(#[from] ProverError),

    /// Hash-layer failure.
    #[error("hash: {0}")]
    Core(#[from] CoreError),

    /// The referenced note/position is absent or already spent.
    #[error("note not found or already spent")]
    UnknownNote,

    /// The note's commitment has no confirmed leaf index yet.
    #[error("note has no leaf index yet; wait for deposit finalization")]
    MissingLeafIndex,

    /// A response the client could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SdkError {
    /// Whether the ASP reported the input as already spent.
    #[must_use]
    pub fn is_already_spent(&self) -> bool {
        matches!(self, Self::Asp { kind, .. } if kind == "already_spent")
    }
}

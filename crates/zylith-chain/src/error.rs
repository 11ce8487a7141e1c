//! Error types and transience classification.

/// Errors from chain reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// HTTP transport failure.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// RPC-level error reported by the node.
    #[error("rpc: {0}")]
    Rpc(String),

    /// The submitted transaction reverted.
    #[error("reverted: {0}")]
    Reverted(String),

    /// Confirmation was not observed in time.
    #[error("confirmation timed out for {0}")]
    ConfirmationTimeout(String),

    /// A response the client could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ChainError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Reverts and malformed responses are deterministic; transport errors
    /// and node-side RPC failures are worth one retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Rpc(_) => true,
            Self::Reverted(_) | Self::ConfirmationTimeout(_) | Self::InvalidResponse(_) => false,
        }
    }
}

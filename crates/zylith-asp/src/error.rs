//! Error types and HTTP mapping.
//!
//! Caller errors (constraint violations, unknown commitments, spent
//! nullifiers) map to 4xx; prover and chain failures map to 5xx. The wire
//! shape is always `{error, message}` and messages never carry secrets.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use zylith_chain::ChainError;
use zylith_circuits::BuildError;
use zylith_core::schema::ops::ErrorBody;
use zylith_core::CoreError;
use zylith_prover::ProverError;

/// Service-level errors with wire kinds.
#[derive(Debug, thiserror::Error)]
pub enum AspError {
    /// Malformed or out-of-range request field.
    #[error("{0}")]
    InvalidInput(String),

    /// A circuit algebraic constraint would fail.
    #[error("{0}")]
    Constraint(#[from] BuildError),

    /// Commitment or leaf index not present in the ledger.
    #[error("{0}")]
    NotFound(String),

    /// Nullifier hash already consumed (or reserved by an in-flight op).
    #[error("nullifier already spent")]
    AlreadySpent,

    /// Proof root not present in the root history.
    #[error("root is not in the accepted history")]
    UnknownRoot,

    /// The commitment tree is at capacity.
    #[error("commitment tree is full")]
    TreeFull,

    /// The coordinator is paused.
    #[error("coordinator is paused")]
    Paused,

    /// Proof pipeline failure.
    #[error("prover: {0}")]
    Prover(#[from] ProverError),

    /// Chain submission or read failure.
    #[error("chain: {0}")]
    Chain(#[from] ChainError),

    /// The operation exceeded its overall deadline.
    #[error("operation timed out")]
    Timeout,

    /// Anything else; never exposes internals beyond the message.
    #[error("{0}")]
    Internal(String),
}

impl AspError {
    /// Stable wire kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Constraint(BuildError::Core(CoreError::InvalidField(_))) => "invalid_field",
            Self::Constraint(_) => "constraint_violation",
            Self::NotFound(_) => "not_found",
            Self::AlreadySpent => "already_spent",
            Self::UnknownRoot => "unknown_root",
            Self::TreeFull => "tree_full",
            Self::Paused => "paused",
            Self::Prover(_) => "prover_failure",
            Self::Chain(_) => "chain_failure",
            Self::Timeout => "timeout",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for the kind.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::Constraint(_) | Self::UnknownRoot => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadySpent | Self::TreeFull => StatusCode::CONFLICT,
            Self::Paused => StatusCode::SERVICE_UNAVAILABLE,
            Self::Prover(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Chain(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<sled::Error> for AspError {
    fn from(e: sled::Error) -> Self {
        Self::Internal(format!("ledger store: {e}"))
    }
}

impl From<zylith_tree::TreeError> for AspError {
    fn from(e: zylith_tree::TreeError) -> Self {
        match e {
            zylith_tree::TreeError::TreeFull(_) => Self::TreeFull,
            zylith_tree::TreeError::LeafOutOfBounds { index, .. } => {
                Self::NotFound(format!("no leaf at index {index}"))
            }
            zylith_tree::TreeError::Hash(e) => Self::Internal(format!("hash: {e}")),
        }
    }
}

impl IntoResponse for AspError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind().to_owned(),
            message: self.to_string(),
        };
        if self.status().is_server_error() {
            tracing::error!(kind = self.kind(), "request failed: {self}");
        } else {
            tracing::debug!(kind = self.kind(), "request rejected: {self}");
        }
        (self.status(), Json(body)).into_response()
    }
}

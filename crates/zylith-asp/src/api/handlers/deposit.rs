//! `POST /deposit`.
//!
//! The commitment is NOT added to the canonical tree here. The handler
//! reserves the next tentative leaf index, returns the escrow calldata the
//! user must submit, and the sync task finalizes the assignment once the
//! coordinator accepts the commitment on chain.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use zylith_core::schema::ops::{DepositRequest, DepositResponse};

use crate::api::validation::parse_secret;
use crate::error::AspError;
use crate::state::AppState;

/// Reserve a leaf index and build escrow calldata for a new commitment.
///
/// # Errors
/// [`AspError::InvalidInput`] for a malformed commitment,
/// [`AspError::Paused`] when the coordinator is paused,
/// [`AspError::TreeFull`] at capacity.
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DepositRequest>,
) -> Result<Json<DepositResponse>, AspError> {
    let commitment = parse_secret(&req.commitment, "commitment")?;

    state.ensure_not_paused().await?;

    let (leaf_index, root, confirmed) = state.reserve_deposit(commitment).await?;
    let calldata = state.chain.deposit_calldata(&commitment).await?;

    tracing::info!(leaf_index, confirmed, "deposit reservation issued");

    let status = if confirmed { "confirmed" } else { "pending" };
    Ok(Json(DepositResponse {
        status: status.to_owned(),
        leaf_index,
        calldata,
        root: root.to_hex(),
    }))
}

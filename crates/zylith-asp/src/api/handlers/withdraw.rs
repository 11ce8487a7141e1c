//! `POST /withdraw`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use zylith_chain::OperationAux;
use zylith_circuits::membership_inputs;
use zylith_core::commitment::{note_commitment, nullifier_hash};
use zylith_core::schema::ops::{WithdrawRequest, WithdrawResponse};

use crate::api::validation::{parse_address, parse_amount, parse_secret};
use crate::error::AspError;
use crate::state::AppState;

/// Spend a note to a public recipient via a membership proof.
///
/// # Errors
/// Taxonomy kinds per stage: validation 4xx, prover/chain 5xx.
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, AspError> {
    let secret = parse_secret(&req.secret, "secret")?;
    let nullifier = parse_secret(&req.nullifier, "nullifier")?;
    let amount = parse_amount(&req.amount_low, &req.amount_high, "amount")?;
    let token = parse_address(&req.token, "token")?;
    let recipient = parse_address(&req.recipient, "recipient")?;

    let opening = zylith_circuits::NoteOpening {
        secret,
        nullifier,
        amount,
        token,
    };

    // Recompute the commitment and locate it in the canonical tree.
    let commitment = note_commitment(&state.hasher, secret, nullifier, &amount, token)
        .map_err(|e| AspError::InvalidInput(e.to_string()))?;
    let proof = state.proof_for(req.leaf_index, commitment).await?;

    let inputs = membership_inputs(&state.hasher, &opening, &proof)?;
    let nh = nullifier_hash(&state.hasher, nullifier)
        .map_err(|e| AspError::Internal(e.to_string()))?;

    let aux = OperationAux::Withdraw {
        recipient: recipient.to_hex(),
    };
    let (tx_hash, _artifact) = state
        .prove_and_submit(&inputs, &aux, &[nh], &[])
        .await?;

    Ok(Json(WithdrawResponse {
        status: "confirmed".into(),
        tx_hash,
        nullifier_hash: nh.to_decimal(),
    }))
}

//! `POST /swap`.
//!
//! Consumes one input note, produces an output commitment and (unless the
//! swap is exact-input) a change commitment. The three nullifiers (input,
//! output, change) must be pairwise distinct.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use zylith_chain::OperationAux;
use zylith_circuits::{swap_inputs, SwapSpec};
use zylith_core::commitment::note_commitment;
use zylith_core::schema::ops::{SwapRequest, SwapResponse};

use crate::api::validation::{
    parse_address, parse_amount, parse_field, parse_fresh, parse_note_input, parse_pool_key,
};
use crate::error::AspError;
use crate::state::AppState;

/// Execute a shielded swap.
///
/// # Errors
/// Taxonomy kinds per stage: validation 4xx, prover/chain 5xx.
pub async fn swap(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwapRequest>,
) -> Result<Json<SwapResponse>, AspError> {
    parse_pool_key(&req.pool_key)?;
    let input = parse_note_input(&req.input_note, "input_note")?;
    let output = parse_fresh(&req.output_note, "output_note")?;
    let change = parse_fresh(&req.change_note, "change_note")?;
    // The limit is an execution parameter, but it must still be a field
    // element the pool can consume.
    parse_field(&req.sqrt_price_limit, "sqrt_price_limit")?;

    let spec = SwapSpec {
        token_in: parse_address(&req.swap_params.token_in, "swap_params.token_in")?,
        token_out: parse_address(&req.swap_params.token_out, "swap_params.token_out")?,
        amount_in: parse_amount(
            &req.swap_params.amount_in_low,
            &req.swap_params.amount_in_high,
            "swap_params.amount_in",
        )?,
        expected_out: parse_amount(
            &req.swap_params.expected_out_low,
            &req.swap_params.expected_out_high,
            "swap_params.expected_out",
        )?,
    };

    tracing::info!(leaf_index = req.input_note.leaf_index, "processing shielded swap");

    // Locate the input note in the canonical tree.
    let commitment = note_commitment(
        &state.hasher,
        input.secret,
        input.nullifier,
        &input.amount,
        input.token,
    )
    .map_err(|e| AspError::InvalidInput(e.to_string()))?;
    let proof = state.proof_for(req.input_note.leaf_index, commitment).await?;

    let build = swap_inputs(&state.hasher, &input, &proof, &spec, &output, &change)?;
    let input_nh = build
        .inputs
        .publics
        .get(3)
        .copied()
        .ok_or_else(|| AspError::Internal("swap publics layout".into()))?;

    let aux = OperationAux::Swap {
        pool_key: req.pool_key.clone(),
        sqrt_price_limit: req.sqrt_price_limit.clone(),
    };
    let (tx_hash, _artifact) = state
        .prove_and_submit(
            &build.inputs,
            &aux,
            &[input_nh],
            &[build.new_commitment, build.change_commitment],
        )
        .await?;

    Ok(Json(SwapResponse {
        status: "confirmed".into(),
        tx_hash,
        new_commitment: build.new_commitment.to_decimal(),
        change_commitment: build.change_commitment.to_decimal(),
    }))
}

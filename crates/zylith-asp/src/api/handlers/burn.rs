//! `POST /burn`.
//!
//! Spends a position note and produces one output note per pool token. The
//! output amounts come from the pool: tokens owed for the burned liquidity.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use zylith_chain::OperationAux;
use zylith_circuits::burn_inputs;
use zylith_core::commitment::position_commitment;
use zylith_core::schema::ops::{BurnRequest, BurnResponse};
use zylith_core::Amount;

use crate::api::validation::{parse_fresh, parse_pool_key, parse_position_spend};
use crate::error::AspError;
use crate::state::AppState;

/// Burn a shielded LP position.
///
/// # Errors
/// Taxonomy kinds per stage: validation 4xx, prover/chain 5xx.
pub async fn burn(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BurnRequest>,
) -> Result<Json<BurnResponse>, AspError> {
    let (token0, token1) = parse_pool_key(&req.pool_key)?;
    let (position, leaf_index) = parse_position_spend(&req.position_note, "position_note")?;
    let output0 = parse_fresh(&req.output_note_0, "output_note_0")?;
    let output1 = parse_fresh(&req.output_note_1, "output_note_1")?;
    if req.liquidity == 0 {
        return Err(AspError::InvalidInput("liquidity must be > 0".into()));
    }

    tracing::info!(leaf_index, "processing shielded burn");

    // Locate the position in the canonical tree.
    let commitment = position_commitment(
        &state.hasher,
        position.secret,
        position.nullifier,
        position.tick_lower.to_offset(),
        position.tick_upper.to_offset(),
        position.liquidity,
    )
    .map_err(|e| AspError::InvalidInput(e.to_string()))?;
    let proof = state.proof_for(leaf_index, commitment).await?;

    // The pool decides the output amounts for the burned liquidity.
    let position_state = state
        .chain
        .position_state(
            &req.pool_key,
            position.tick_lower.get(),
            position.tick_upper.get(),
        )
        .await?;
    let amount0 = Amount::from_decimal(&position_state.tokens_owed_0)
        .map_err(|e| AspError::Chain(zylith_chain::ChainError::InvalidResponse(e.to_string())))?;
    let amount1 = Amount::from_decimal(&position_state.tokens_owed_1)
        .map_err(|e| AspError::Chain(zylith_chain::ChainError::InvalidResponse(e.to_string())))?;

    let build = burn_inputs(
        &state.hasher,
        &position,
        &proof,
        token0,
        token1,
        &amount0,
        &amount1,
        &output0,
        &output1,
    )?;
    let position_nh = build
        .inputs
        .publics
        .get(3)
        .copied()
        .ok_or_else(|| AspError::Internal("burn publics layout".into()))?;

    let aux = OperationAux::Burn {
        pool_key: req.pool_key.clone(),
        liquidity: req.liquidity,
    };
    let (tx_hash, _artifact) = state
        .prove_and_submit(
            &build.inputs,
            &aux,
            &[position_nh],
            &[build.new_commitment_0, build.new_commitment_1],
        )
        .await?;

    Ok(Json(BurnResponse {
        status: "confirmed".into(),
        tx_hash,
        new_commitment_0: build.new_commitment_0.to_decimal(),
        new_commitment_1: build.new_commitment_1.to_decimal(),
    }))
}

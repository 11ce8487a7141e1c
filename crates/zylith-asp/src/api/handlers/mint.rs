//! `POST /mint`.
//!
//! Consumes one note of each pool token from the same tree snapshot,
//! produces a position commitment and up to two change commitments. Five
//! nullifiers (two inputs, position, two change notes) must be pairwise
//! distinct, and the pool tokens must be ordered.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use zylith_chain::OperationAux;
use zylith_circuits::mint_inputs;
use zylith_core::commitment::note_commitment;
use zylith_core::schema::ops::{MintRequest, MintResponse};

use crate::api::validation::{
    parse_amount, parse_fresh, parse_note_input, parse_pool_key, parse_position_input,
};
use crate::error::AspError;
use crate::state::AppState;

/// Mint a shielded LP position.
///
/// # Errors
/// Taxonomy kinds per stage: validation 4xx, prover/chain 5xx.
pub async fn mint(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MintRequest>,
) -> Result<Json<MintResponse>, AspError> {
    parse_pool_key(&req.pool_key)?;
    let note0 = parse_note_input(&req.input_note_0, "input_note_0")?;
    let note1 = parse_note_input(&req.input_note_1, "input_note_1")?;
    let position = parse_position_input(&req.position, "position")?;
    let change0 = parse_fresh(&req.change_note_0, "change_note_0")?;
    let change1 = parse_fresh(&req.change_note_1, "change_note_1")?;
    let amount0 = parse_amount(
        &req.amounts.amount0_low,
        &req.amounts.amount0_high,
        "amounts.amount0",
    )?;
    let amount1 = parse_amount(
        &req.amounts.amount1_low,
        &req.amounts.amount1_high,
        "amounts.amount1",
    )?;
    if req.liquidity == 0 {
        return Err(AspError::InvalidInput("liquidity must be > 0".into()));
    }

    tracing::info!(
        tick_lower = req.position.tick_lower,
        tick_upper = req.position.tick_upper,
        "processing shielded mint"
    );

    // Locate both input notes in one tree snapshot.
    let commitment0 = note_commitment(
        &state.hasher,
        note0.secret,
        note0.nullifier,
        &note0.amount,
        note0.token,
    )
    .map_err(|e| AspError::InvalidInput(e.to_string()))?;
    let commitment1 = note_commitment(
        &state.hasher,
        note1.secret,
        note1.nullifier,
        &note1.amount,
        note1.token,
    )
    .map_err(|e| AspError::InvalidInput(e.to_string()))?;
    let (proof0, proof1) = state
        .proofs_for(
            req.input_note_0.leaf_index,
            commitment0,
            req.input_note_1.leaf_index,
            commitment1,
        )
        .await?;

    let build = mint_inputs(
        &state.hasher,
        &note0,
        &proof0,
        &note1,
        &proof1,
        &position,
        &amount0,
        &amount1,
        &change0,
        &change1,
    )?;
    let nh0 = build
        .inputs
        .publics
        .get(3)
        .copied()
        .ok_or_else(|| AspError::Internal("mint publics layout".into()))?;
    let nh1 = build
        .inputs
        .publics
        .get(4)
        .copied()
        .ok_or_else(|| AspError::Internal("mint publics layout".into()))?;

    let aux = OperationAux::Mint {
        pool_key: req.pool_key.clone(),
        liquidity: req.liquidity,
    };
    let (tx_hash, _artifact) = state
        .prove_and_submit(
            &build.inputs,
            &aux,
            &[nh0, nh1],
            &[
                build.change_commitment_0,
                build.change_commitment_1,
                build.position_commitment,
            ],
        )
        .await?;

    Ok(Json(MintResponse {
        status: "confirmed".into(),
        tx_hash,
        position_commitment: build.position_commitment.to_decimal(),
        change_commitment_0: build.change_commitment_0.to_decimal(),
        change_commitment_1: build.change_commitment_1.to_decimal(),
    }))
}

//! Read endpoints: tree queries, nullifier lookups, status, commitment
//! sync. These serve the SDK's local leaf-index table maintenance.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use zylith_core::schema::ops::{
    CommitmentIndex, ContractsStatus, NullifierStatusResponse, StatusResponse,
    SyncCommitmentsRequest, SyncCommitmentsResponse, SyncStatus, TreePathResponse,
    TreeRootResponse, TreeStatus,
};
use zylith_core::FieldElement;

use crate::api::validation::parse_field;
use crate::error::AspError;
use crate::state::AppState;

/// `GET /tree/root`.
///
/// # Errors
/// None in practice; the signature matches the handler contract.
pub async fn tree_root(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TreeRootResponse>, AspError> {
    let guard = state.tree.read().await;
    Ok(Json(TreeRootResponse {
        root: guard.tree.root().to_hex(),
        leaf_count: guard.tree.leaf_count(),
    }))
}

/// `GET /tree/path/{leaf_index}`.
///
/// # Errors
/// [`AspError::NotFound`] for an unassigned index.
pub async fn tree_path(
    State(state): State<Arc<AppState>>,
    Path(leaf_index): Path<u64>,
) -> Result<Json<TreePathResponse>, AspError> {
    let guard = state.tree.read().await;
    let commitment = guard
        .tree
        .leaf(leaf_index)
        .map_err(|_| AspError::NotFound(format!("no commitment at leaf {leaf_index}")))?;
    let proof = guard.tree.proof(leaf_index)?;
    Ok(Json(TreePathResponse {
        leaf_index,
        commitment: commitment.to_decimal(),
        path_elements: proof
            .path_elements
            .iter()
            .map(FieldElement::to_decimal)
            .collect(),
        path_indices: proof.path_indices,
        root: proof.root.to_hex(),
    }))
}

/// `GET /nullifier/{hash}`.
///
/// # Errors
/// [`AspError::InvalidInput`] for a malformed hash.
pub async fn nullifier_status(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<NullifierStatusResponse>, AspError> {
    let nh = parse_field(&hash, "nullifier_hash")?;
    let record = state.db.nullifier_record(&nh)?;
    Ok(Json(NullifierStatusResponse {
        nullifier_hash: nh.to_decimal(),
        spent: record.is_some(),
        circuit_type: record.as_ref().map(|r| r.circuit_type.clone()),
        tx_hash: record.and_then(|r| r.tx_hash),
    }))
}

/// `GET /status`.
///
/// # Errors
/// Ledger read failures only.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, AspError> {
    let guard = state.tree.read().await;
    Ok(Json(StatusResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_owned(),
        tree: TreeStatus {
            leaf_count: guard.tree.leaf_count(),
            root: guard.tree.root().to_hex(),
        },
        sync: SyncStatus {
            last_synced_block: state.db.last_synced_block()?,
        },
        contracts: ContractsStatus {
            coordinator: state.config.contracts.coordinator.clone(),
            pool: state.config.contracts.pool.clone(),
        },
    }))
}

/// `POST /sync-commitments`.
///
/// # Errors
/// [`AspError::InvalidInput`] for a malformed commitment in the batch.
pub async fn sync_commitments(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SyncCommitmentsRequest>,
) -> Result<Json<SyncCommitmentsResponse>, AspError> {
    let guard = state.tree.read().await;
    let mut out = Vec::with_capacity(req.commitments.len());
    for raw in &req.commitments {
        let commitment = parse_field(raw, "commitments[]")?;
        out.push(CommitmentIndex {
            commitment: commitment.to_decimal(),
            leaf_index: guard.ledger.get(&commitment).copied(),
        });
    }
    Ok(Json(SyncCommitmentsResponse { commitments: out }))
}

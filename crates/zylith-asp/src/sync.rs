//! Deposit finalization against on-chain acceptance order.
//!
//! Deposits are not added to the canonical tree when requested; the user
//! submits the escrow transaction and the coordinator accepts commitments in
//! its own order. This task polls that sequence from the confirmed leaf
//! count forward and applies it, so leaf-index assignment total-orders
//! with on-chain acceptance by construction. Tentative reservations whose
//! commitments never appear are rolled back after a TTL and their indices
//! reused.

use std::sync::Arc;
use std::time::Duration;

use crate::error::AspError;
use crate::state::AppState;

/// Apply every newly accepted commitment. Returns how many were applied.
///
/// Exposed for tests, which drive finalization deterministically instead of
/// waiting on the polling loop.
///
/// # Errors
/// Propagates chain read and ledger persistence failures.
pub async fn finalize_accepted(state: &AppState) -> Result<usize, AspError> {
    let from_index = { state.tree.read().await.tree.leaf_count() };
    let accepted = state.chain.accepted_commitments(from_index).await?;
    if accepted.is_empty() {
        prune_expired(state).await;
        return Ok(0);
    }

    let mut guard = state.tree.write().await;
    let mut applied = 0usize;
    for commitment in accepted {
        // The coordinator's sequence also carries operation outputs, which
        // the operation path already applied locally.
        if guard.ledger.contains_key(&commitment) {
            continue;
        }
        let index = guard.tree.insert(commitment)?;
        guard.ledger.insert(commitment, index);
        state.db.insert_commitment(index, &commitment, None)?;
        // Resolve the matching reservation wherever it sits in the queue.
        if let Some(position) = guard.pending.iter().position(|p| p.commitment == commitment) {
            guard.pending.remove(position);
        }
        applied = applied.saturating_add(1);
        tracing::debug!(leaf_index = index, "deposit finalized");
    }
    if applied == 0 {
        drop(guard);
        prune_expired(state).await;
        return Ok(0);
    }
    let root = guard.tree.root();
    let leaf_count = guard.tree.leaf_count();
    guard.history.push(root);
    state.db.insert_root(&root, leaf_count, None)?;
    // Re-point surviving reservations at the indices after the new leaves.
    for (offset, pending) in guard.pending.iter_mut().enumerate() {
        pending.tentative_index =
            leaf_count.saturating_add(u64::try_from(offset).unwrap_or(u64::MAX));
    }
    drop(guard);

    if let Err(e) = state.chain.submit_root(&root).await {
        tracing::warn!("root submission failed after deposit batch: {e}");
    }
    let block = state.chain.latest_block().await.unwrap_or(0);
    state.db.set_last_synced_block(block)?;

    prune_expired(state).await;
    Ok(applied)
}

/// Roll back reservations older than the TTL; their indices are reused.
async fn prune_expired(state: &AppState) {
    let ttl = state.config.pending_deposit_ttl;
    let mut guard = state.tree.write().await;
    let before = guard.pending.len();
    guard.pending.retain(|p| p.reserved_at.elapsed() < ttl);
    let dropped = before.saturating_sub(guard.pending.len());
    if dropped > 0 {
        let base = guard.tree.leaf_count();
        for (offset, pending) in guard.pending.iter_mut().enumerate() {
            pending.tentative_index =
                base.saturating_add(u64::try_from(offset).unwrap_or(u64::MAX));
        }
        tracing::info!(dropped, "expired deposit reservations rolled back");
    }
}

/// Run the polling loop until the task is aborted.
pub async fn run(state: Arc<AppState>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match finalize_accepted(&state).await {
            Ok(0) => {}
            Ok(applied) => tracing::info!(applied, "deposit sync applied commitments"),
            Err(e) => tracing::warn!("deposit sync failed, will retry: {e}"),
        }
    }
}

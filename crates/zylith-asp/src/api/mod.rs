//! REST surface.

/// Operation and read handlers.
pub mod handlers;
/// Wire-to-typed conversion.
pub mod validation;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Assemble the service router.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/deposit", post(handlers::deposit::deposit))
        .route("/withdraw", post(handlers::withdraw::withdraw))
        .route("/swap", post(handlers::swap::swap))
        .route("/mint", post(handlers::mint::mint))
        .route("/burn", post(handlers::burn::burn))
        .route("/tree/root", get(handlers::reads::tree_root))
        .route("/tree/path/{leaf_index}", get(handlers::reads::tree_path))
        .route("/nullifier/{hash}", get(handlers::reads::nullifier_status))
        .route("/status", get(handlers::reads::status))
        .route("/sync-commitments", post(handlers::reads::sync_commitments))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

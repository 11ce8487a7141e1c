//! Server entry point.

use std::sync::Arc;

use crate::api;
use crate::error::AspError;
use crate::state::AppState;
use crate::sync;

/// Bind the listener, spawn the deposit sync task and serve until ctrl-c.
///
/// # Errors
/// Bind and serve failures.
pub async fn serve(state: Arc<AppState>) -> Result<(), AspError> {
    let bind = state.config.bind;
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| AspError::Internal(format!("bind {bind}: {e}")))?;

    let sync_task = tokio::spawn(sync::run(
        Arc::clone(&state),
        state.config.sync_interval,
    ));

    tracing::info!(%bind, "asp listening");

    let router = api::router(state);
    let result = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .map_err(|e| AspError::Internal(format!("serve: {e}")));

    sync_task.abort();
    result
}

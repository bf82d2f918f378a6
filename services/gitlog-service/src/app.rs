use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{healthz, invoke, readyz};
use crate::state::AppState;

/// Probes are answered directly; everything else goes through [`invoke`],
/// which owns route resolution for the log operations.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz).fallback(invoke))
        .route("/readyz", get(readyz).fallback(invoke))
        .fallback(invoke)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

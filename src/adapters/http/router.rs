//! Top-level axum router.

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;

use super::account::account_routes;
use super::admin::admin_routes;
use super::billing::billing_routes;
use super::middleware::auth_middleware;
use super::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health - Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the application router with session authentication applied.
///
/// Transport layers (tracing, CORS, timeout) are added by the binary.
///
/// # Routes
/// - `GET /health`
/// - `/api/...` - account, billing and admin endpoints
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(account_routes())
        .merge(billing_routes())
        .nest("/admin", admin_routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.session_validator.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

//! Axum router configuration for account endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{add_credits, check_auth, get_credits, get_history, record_search};
use crate::adapters::http::state::AppState;

/// Create the account API router.
///
/// # Routes
/// - `GET /checkauth` - Session check (public)
/// - `GET /credits` - Current balance
/// - `GET /credits/add` - Manual credit grant
/// - `GET /history` - Search history
/// - `POST /search` - Record a charged search
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/checkauth", get(check_auth))
        .route("/credits", get(get_credits))
        .route("/credits/add", get(add_credits))
        .route("/history", get(get_history))
        .route("/search", post(record_search))
}

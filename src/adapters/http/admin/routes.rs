//! Axum router configuration for admin endpoints.

use axum::{routing::get, Router};

use super::handlers::{check_admin, list_admins, list_users};
use crate::adapters::http::state::AppState;

/// Create the admin API router.
///
/// # Routes
/// - `GET /check` - Admin gate result for the caller
/// - `GET /list` - Admin allow-list
/// - `GET /users` - All accounts
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/check", get(check_admin))
        .route("/list", get(list_admins))
        .route("/users", get(list_users))
}

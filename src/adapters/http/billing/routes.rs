//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_checkout, create_portal, get_subscription, handle_stripe_webhook};
use crate::adapters::http::state::AppState;

/// Create the billing API router.
///
/// # Routes
///
/// ## User Endpoints (require authentication)
/// - `GET /subscription` - Current subscription
/// - `POST /stripe/create-checkout` - Start checkout
/// - `POST /stripe/create-portal` - Open the billing portal
///
/// ## Webhook Endpoints (no auth, signature verified)
/// - `POST /stripe/webhook` - Handle Stripe webhooks
pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/subscription", get(get_subscription))
        .route("/stripe/create-checkout", post(create_checkout))
        .route("/stripe/create-portal", post(create_portal))
        .route("/stripe/webhook", post(handle_stripe_webhook))
}

//! HTTP handlers for billing endpoints.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::HeaderMap;

use super::dto::{CreateCheckoutRequest, RedirectResponse, SubscriptionResponse, WebhookAckResponse};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::billing::{
    CreateCheckoutCommand, CreatePortalCommand, GetSubscriptionQuery, HandlePaymentWebhookCommand,
};
use crate::domain::foundation::{DomainError, ErrorCode};

/// Header Stripe signs webhook deliveries with.
const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// GET /api/subscription - Current subscription, real or fallback
pub async fn get_subscription(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = state
        .get_subscription_handler()
        .handle(GetSubscriptionQuery {
            external_id: user.id,
        })
        .await?;

    Ok(Json(SubscriptionResponse { subscription }))
}

/// POST /api/stripe/create-checkout - Start a subscription checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<CreateCheckoutRequest>, JsonRejection>,
) -> Result<Json<RedirectResponse>, ApiError> {
    let Json(request) = payload?;

    let result = state
        .create_checkout_handler()
        .handle(CreateCheckoutCommand {
            caller: user,
            tier_id: request.tier_id,
        })
        .await?;

    Ok(Json(RedirectResponse { url: result.url }))
}

/// POST /api/stripe/create-portal - Open the billing portal
pub async fn create_portal(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<RedirectResponse>, ApiError> {
    let result = state
        .create_portal_handler()
        .handle(CreatePortalCommand {
            external_id: user.id,
        })
        .await?;

    Ok(Json(RedirectResponse { url: result.url }))
}

/// POST /api/stripe/webhook - Handle Stripe webhook events
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckResponse>, ApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            DomainError::new(ErrorCode::InvalidWebhook, "Missing Stripe-Signature header")
        })?;

    state
        .webhook_handler()
        .handle(HandlePaymentWebhookCommand {
            payload: body.to_vec(),
            signature: signature.to_string(),
        })
        .await?;

    Ok(Json(WebhookAckResponse { received: true }))
}

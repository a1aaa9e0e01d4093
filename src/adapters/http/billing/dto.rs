//! HTTP DTOs for billing endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::billing::SubscriptionView;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start checkout for a tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub tier_id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response of `GET /api/subscription`; `subscription` is `null` when there is none.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: Option<SubscriptionView>,
}

/// Hosted Stripe page to redirect to.
#[derive(Debug, Clone, Serialize)]
pub struct RedirectResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_subscription_serializes_as_null() {
        let json = serde_json::to_value(SubscriptionResponse { subscription: None }).unwrap();
        assert_eq!(json, serde_json::json!({"subscription": null}));
    }

    #[test]
    fn checkout_request_reads_camel_case_tier() {
        let request: CreateCheckoutRequest = serde_json::from_str(r#"{"tierId":"pro"}"#).unwrap();
        assert_eq!(request.tier_id, "pro");
    }
}

//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Stripe REST API with
//! form-encoded requests.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
    PortalSession, WebhookEvent, WebhookEventData, WebhookEventType,
};

use super::webhook_types::{
    SignatureHeader, StripeCheckoutSession, StripeErrorResponse, StripeInvoice,
    StripePortalSession, StripeSubscription, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Reject test-mode events.
    require_livemode: bool,
}

impl StripeConfig {
    pub fn new(api_key: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            api_key,
            webhook_secret,
            api_base_url: "https://api.stripe.com".to_string(),
            require_livemode: false,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Require livemode events (production).
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_base_url", &self.api_base_url)
            .field("require_livemode", &self.require_livemode)
            .finish_non_exhaustive()
    }
}

/// Stripe payment provider adapter.
#[derive(Debug)]
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Verify webhook signature using HMAC-SHA256 against the clock `now`.
    fn verify_signature(
        &self,
        payload: &[u8],
        header: &SignatureHeader,
        now: i64,
    ) -> Result<(), PaymentError> {
        let age = now
            .checked_sub(header.timestamp)
            .ok_or_else(|| PaymentError::invalid_webhook("Invalid timestamp"))?;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "webhook event too old, possible replay"
            );
            return Err(PaymentError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "webhook event timestamp in the future"
            );
            return Err(PaymentError::invalid_webhook("Event timestamp in future"));
        }

        let mut mac =
            HmacSha256::new_from_slice(self.config.webhook_secret.expose_secret().as_bytes())
                .map_err(|_| PaymentError::invalid_webhook("Unusable webhook secret"))?;
        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        let matched = header
            .v1_signatures
            .iter()
            .any(|sig| expected.as_slice().ct_eq(sig.as_slice()).into());

        if !matched {
            tracing::warn!("invalid webhook signature");
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }

        Ok(())
    }

    /// Parse a Stripe event and convert to port types.
    fn parse_event(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let stripe_event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "failed to parse webhook payload");
            PaymentError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;

        if self.config.require_livemode && !stripe_event.livemode {
            tracing::warn!(event_id = %stripe_event.id, "rejected test mode event");
            return Err(PaymentError::invalid_webhook(
                "Test mode events not allowed in production",
            ));
        }

        let event_type = WebhookEventType::from_stripe(&stripe_event.event_type);
        let data = extract_event_data(&event_type, stripe_event.data.object)?;

        Ok(WebhookEvent {
            id: stripe_event.id,
            event_type,
            data,
            created_at: stripe_event.created,
        })
    }

    /// POST a form to the Stripe API and decode the JSON response.
    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, PaymentError> {
        let url = format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path, "Stripe request failed");
                PaymentError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status, &body);
            tracing::error!(%status, path, error = %err, "Stripe API returned an error");
            return Err(err);
        }

        response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

/// Maps an error response to a `PaymentError`, keeping Stripe's message.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<StripeErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|r| r.error.message.clone())
        .unwrap_or_else(|| format!("Stripe API error ({})", status));

    let code = match status.as_u16() {
        400 | 402 | 404 => PaymentErrorCode::InvalidRequest,
        401 | 403 => PaymentErrorCode::AuthenticationError,
        429 => PaymentErrorCode::RateLimitExceeded,
        _ => PaymentErrorCode::ProviderError,
    };

    let mut err = PaymentError::new(code, message);
    if let Some(provider_code) = parsed.and_then(|r| r.error.code.or(r.error.error_type)) {
        err = err.with_provider_code(provider_code);
    }
    err
}

fn decode_object<T: DeserializeOwned>(
    object: serde_json::Value,
    what: &str,
) -> Result<T, PaymentError> {
    serde_json::from_value(object)
        .map_err(|e| PaymentError::invalid_webhook(format!("Invalid {}: {}", what, e)))
}

/// Reduce the event object to the fields Ziq acts on.
fn extract_event_data(
    event_type: &WebhookEventType,
    object: serde_json::Value,
) -> Result<WebhookEventData, PaymentError> {
    match event_type {
        WebhookEventType::CheckoutSessionCompleted => {
            let session: StripeCheckoutSession = decode_object(object, "checkout session")?;
            let user_id = session.user_id();
            Ok(WebhookEventData::Checkout {
                tier_id: session.metadata.get("tier_id").cloned(),
                session_id: session.id,
                customer_id: session.customer,
                subscription_id: session.subscription,
                user_id,
            })
        }

        WebhookEventType::SubscriptionCreated
        | WebhookEventType::SubscriptionUpdated
        | WebhookEventType::SubscriptionDeleted => {
            let sub: StripeSubscription = decode_object(object, "subscription")?;
            let price_id = sub.price_id();
            let user_id = sub.user_id();
            let current_period_end = sub.period_end().ok_or_else(|| {
                PaymentError::invalid_webhook("Subscription without current_period_end")
            })?;
            Ok(WebhookEventData::Subscription {
                user_id,
                subscription_id: sub.id,
                customer_id: sub.customer,
                status: sub.status,
                price_id,
                current_period_end,
                cancel_at_period_end: sub.cancel_at_period_end,
            })
        }

        WebhookEventType::InvoicePaid => {
            let invoice: StripeInvoice = decode_object(object, "invoice")?;
            let price_id = invoice.price_id();
            let user_id = invoice.user_id();
            Ok(WebhookEventData::Invoice {
                user_id,
                invoice_id: invoice.id,
                customer_id: invoice.customer,
                subscription_id: invoice.subscription,
                price_id,
                amount_paid: invoice.amount_paid,
            })
        }

        WebhookEventType::Unknown(_) => Ok(WebhookEventData::Raw {
            json: object.to_string(),
        }),
    }
}

/// Form parameters of a subscription checkout session.
fn checkout_params(request: &CreateCheckoutRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("mode", "subscription".to_string()),
        ("line_items[0][price]", request.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("client_reference_id", request.user_id.clone()),
        ("metadata[user_id]", request.user_id.clone()),
        ("metadata[tier_id]", request.tier_id.clone()),
        ("subscription_data[metadata][user_id]", request.user_id.clone()),
        ("subscription_data[metadata][tier_id]", request.tier_id.clone()),
    ];

    match (&request.customer_id, &request.email) {
        (Some(customer), _) => params.push(("customer", customer.clone())),
        (None, Some(email)) => params.push(("customer_email", email.clone())),
        (None, None) => {}
    }

    params
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let params = checkout_params(&request);
        let session: StripeCheckoutSession =
            self.post_form("/v1/checkout/sessions", &params).await?;

        let url = session.url.ok_or_else(|| {
            tracing::error!(session_id = %session.id, "checkout session has no url");
            PaymentError::provider("Checkout session has no url")
        })?;

        tracing::info!(
            session_id = %session.id,
            tier_id = %request.tier_id,
            user_id = %request.user_id,
            "created checkout session"
        );

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        let params = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        let portal: StripePortalSession =
            self.post_form("/v1/billing_portal/sessions", &params).await?;

        Ok(PortalSession {
            id: portal.id,
            url: portal.url,
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent, PaymentError> {
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "failed to parse Stripe-Signature header");
            PaymentError::invalid_webhook(e.to_string())
        })?;

        self.verify_signature(payload, &header, chrono::Utc::now().timestamp())?;

        let event = self.parse_event(payload)?;

        tracing::debug!(
            event_id = %event.id,
            event_type = event.event_type.as_stripe(),
            "webhook signature verified"
        );

        Ok(event)
    }
}

/// Computes a `Stripe-Signature` header value for `payload`.
///
/// Used by tests to produce webhooks the adapter accepts.
pub fn sign_webhook_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let sig = mac.finalize().into_bytes();
    format!("t={},v1={}", timestamp, super::webhook_types::hex_encode(&sig))
}

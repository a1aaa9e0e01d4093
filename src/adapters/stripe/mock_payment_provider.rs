//! Mock payment provider for testing.
//!
//! Provides a configurable `PaymentProvider` for unit and router tests:
//! - Deterministic checkout and portal URLs
//! - Error injection
//! - Call tracking
//! - Webhook events taken verbatim from the request body

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentProvider, PortalSession,
    WebhookEvent,
};

/// Mock payment provider.
///
/// `verify_webhook` accepts any signature and deserializes the body as a
/// `WebhookEvent`, unless built with `rejecting_webhooks`.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.set_error(PaymentError::network("down"));
/// assert!(mock.create_portal_session("cus_1", "https://ziq.ai").await.is_err());
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Returned by the next call, then cleared.
    next_error: Option<PaymentError>,
    reject_webhooks: bool,
    checkout_requests: Vec<CreateCheckoutRequest>,
    portal_customers: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.state().reject_webhooks = true;
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_error(&self) -> Option<PaymentError> {
        self.state().next_error.take()
    }

    /// Makes the next call fail with `error`.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Checkout requests received so far.
    pub fn checkout_requests(&self) -> Vec<CreateCheckoutRequest> {
        self.state().checkout_requests.clone()
    }

    /// Customer ids portal sessions were created for.
    pub fn portal_customers(&self) -> Vec<String> {
        self.state().portal_customers.clone()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        let mut state = self.state();
        let id = format!("cs_test_{}", state.checkout_requests.len() + 1);
        state.checkout_requests.push(request);

        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/c/pay/{}", id),
            id,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        self.state().portal_customers.push(customer_id.to_string());

        Ok(PortalSession {
            id: format!("bps_test_{}", customer_id),
            url: format!(
                "https://billing.stripe.test/p/session/{}?return={}",
                customer_id, return_url
            ),
        })
    }

    fn verify_webhook(&self, payload: &[u8], _signature: &str) -> Result<WebhookEvent, PaymentError> {
        if self.state().reject_webhooks {
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }

        serde_json::from_slice(payload)
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid JSON: {}", e)))
    }
}

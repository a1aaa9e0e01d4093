//! WebhookEventStore port - idempotency tracking for Stripe webhooks.
//!
//! Stripe may deliver the same webhook multiple times (timeouts, 5xx from our
//! endpoint, lost acknowledgements). An event is claimed before its effects
//! are applied and released again if applying them fails, so a retry from
//! Stripe gets another chance while a duplicate delivery is skipped.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Result of attempting to claim a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time seeing this event.
    Inserted,
    /// Event was already claimed.
    AlreadyExists,
}

/// Port for recording processed webhook events.
///
/// Implementations should rely on a unique constraint on `event_id` so that
/// concurrent deliveries cannot both claim the same event.
#[async_trait]
pub trait WebhookEventStore: Send + Sync {
    /// Claim `event_id`. Uses `ON CONFLICT DO NOTHING` semantics.
    async fn claim(&self, event_id: &str, event_type: &str) -> Result<SaveResult, DomainError>;

    /// Forget a claim whose processing failed.
    async fn release(&self, event_id: &str) -> Result<(), DomainError>;
}

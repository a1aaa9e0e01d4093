//! Subscription repository port.
//!
//! Rows are written only by webhook synchronization and keyed by the Stripe
//! subscription id, so replays and out-of-order deliveries converge on a
//! single row per Stripe subscription.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, UserId};

/// Repository port for `Subscription` rows.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// The active row with the latest `current_period_end`, if any.
    async fn find_latest_active(&self, user_id: &UserId)
        -> Result<Option<Subscription>, DomainError>;

    /// Find by Stripe subscription id.
    async fn find_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Insert or update by Stripe subscription id and return the stored row.
    ///
    /// On update, `id` and `created_at` of the existing row are kept.
    async fn upsert(&self, subscription: &Subscription) -> Result<Subscription, DomainError>;
}

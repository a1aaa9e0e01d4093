//! GetSubscriptionHandler - Query handler for the caller's current subscription.

use std::sync::Arc;

use tracing::warn;

use crate::domain::billing::{reconcile_subscription, FallbackPolicy, SubscriptionView};
use crate::domain::foundation::{DomainError, ExternalUserId, Timestamp};
use crate::ports::{SubscriptionRepository, UserRepository};

/// Query for the caller's subscription.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub external_id: ExternalUserId,
}

/// Result: `None` when the caller has no plan (or no account yet).
pub type GetSubscriptionResult = Option<SubscriptionView>;

/// Handler for subscription lookups.
///
/// Prefers the newest active stored row and falls back to the user's billing
/// columns when webhooks have not produced a row yet.
pub struct GetSubscriptionHandler {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    policy: FallbackPolicy,
}

impl GetSubscriptionHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            users,
            subscriptions,
            policy,
        }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<GetSubscriptionResult, DomainError> {
        let Some(user) = self.users.find_by_external_id(&query.external_id).await? else {
            return Ok(None);
        };

        let stored = self.subscriptions.find_latest_active(&user.id).await?;
        let now = Timestamp::now();
        if let Some(row) = stored.as_ref().filter(|s| !s.is_current(&now)) {
            warn!(
                user_id = %user.external_id,
                stripe_subscription_id = %row.stripe_subscription_id,
                current_period_end = %row.current_period_end.as_datetime(),
                "Active subscription row is past its period end"
            );
        }
        let view = reconcile_subscription(&user, stored.as_ref(), now, &self.policy);

        if let Some(view) = view.as_ref().filter(|v| v.fallback) {
            warn!(
                user_id = %user.external_id,
                stripe_subscription_id = %view.stripe_subscription_id,
                tier_id = %view.tier_id,
                "No subscription row for active Stripe subscription, serving fallback"
            );
        }

        Ok(view)
    }
}

//! User account record.

use serde::{Deserialize, Serialize};

use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::{ExternalUserId, Timestamp, UserId};

/// A Ziq user account.
///
/// Rows are created lazily the first time an authenticated caller touches the
/// API. The credit balance is only ever changed through atomic store updates,
/// never by writing back a value computed in application code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub external_id: ExternalUserId,
    pub email: Option<String>,
    pub credits: i64,
    pub tier_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_subscription_status: Option<SubscriptionStatus>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Builds a fresh account with the given starting balance and no billing linkage.
    pub fn new(external_id: ExternalUserId, email: Option<String>, credits: i64) -> Self {
        let now = Timestamp::now();
        Self {
            id: UserId::new(),
            external_id,
            email,
            credits,
            tier_id: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            stripe_subscription_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the user's own billing columns show an active Stripe subscription.
    pub fn has_active_stripe_subscription(&self) -> bool {
        self.stripe_subscription_id.is_some()
            && self.stripe_subscription_status == Some(SubscriptionStatus::Active)
    }
}

/// Billing columns mirrored onto the user row by webhook synchronization.
///
/// Every field is written as-is; callers merge with the current row first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingLink {
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_subscription_status: Option<SubscriptionStatus>,
    pub tier_id: Option<String>,
}

impl BillingLink {
    /// Snapshot of the billing columns currently on `user`.
    pub fn from_user(user: &User) -> Self {
        Self {
            stripe_customer_id: user.stripe_customer_id.clone(),
            stripe_subscription_id: user.stripe_subscription_id.clone(),
            stripe_subscription_status: user.stripe_subscription_status,
            tier_id: user.tier_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            ExternalUserId::new("user_1").unwrap(),
            Some("a@example.com".to_string()),
            10,
        )
    }

    #[test]
    fn new_user_has_no_billing_linkage() {
        let user = user();
        assert_eq!(user.credits, 10);
        assert!(user.tier_id.is_none());
        assert!(user.stripe_customer_id.is_none());
        assert!(!user.has_active_stripe_subscription());
    }

    #[test]
    fn active_subscription_requires_id_and_status() {
        let mut user = user();
        user.stripe_subscription_status = Some(SubscriptionStatus::Active);
        assert!(!user.has_active_stripe_subscription());

        user.stripe_subscription_id = Some("sub_123".to_string());
        assert!(user.has_active_stripe_subscription());

        user.stripe_subscription_status = Some(SubscriptionStatus::PastDue);
        assert!(!user.has_active_stripe_subscription());
    }

    #[test]
    fn billing_link_snapshots_user_columns() {
        let mut user = user();
        user.stripe_customer_id = Some("cus_1".to_string());
        user.tier_id = Some("basic".to_string());

        let link = BillingLink::from_user(&user);
        assert_eq!(link.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(link.tier_id.as_deref(), Some("basic"));
        assert!(link.stripe_subscription_id.is_none());
    }
}

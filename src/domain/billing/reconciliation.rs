//! Reconciliation between stored subscription rows and user billing columns.
//!
//! Webhooks update the `User` columns and the `Subscription` table separately,
//! so a reader can observe a user marked active with no row yet. In that case
//! a non-persisted fallback view is synthesized and flagged as such.

use serde::Serialize;

use super::{Subscription, SubscriptionStatus};
use crate::domain::account::User;
use crate::domain::foundation::Timestamp;

/// Prefix of synthesized subscription ids.
pub const FALLBACK_ID_PREFIX: &str = "fallback-";

/// How fallback views are filled in when no stored row exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Days added to "now" for the synthesized period end.
    pub period_days: i64,
    /// Tier reported when the user row carries none.
    pub default_tier_id: String,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            period_days: 30,
            default_tier_id: super::PRO_TIER_ID.to_string(),
        }
    }
}

/// Subscription as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub id: String,
    pub stripe_subscription_id: String,
    pub status: SubscriptionStatus,
    pub tier_id: String,
    pub current_period_end: Timestamp,
    pub cancel_at_period_end: bool,
    /// True when the view was synthesized from user columns.
    pub fallback: bool,
}

impl SubscriptionView {
    /// View of a stored subscription row.
    pub fn from_stored(sub: &Subscription) -> Self {
        Self {
            id: sub.id.to_string(),
            stripe_subscription_id: sub.stripe_subscription_id.clone(),
            status: sub.status,
            tier_id: sub.tier_id.clone(),
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
            fallback: false,
        }
    }
}

/// Picks the subscription to report for `user`.
///
/// A stored active row always wins. Otherwise a fallback is built when the
/// user's own columns show an active Stripe subscription. Returns `None` when
/// neither source indicates a plan.
pub fn reconcile_subscription(
    user: &User,
    stored: Option<&Subscription>,
    now: Timestamp,
    policy: &FallbackPolicy,
) -> Option<SubscriptionView> {
    if let Some(sub) = stored {
        return Some(SubscriptionView::from_stored(sub));
    }

    if !user.has_active_stripe_subscription() {
        return None;
    }
    let stripe_id = user.stripe_subscription_id.as_deref()?;

    Some(SubscriptionView {
        id: format!("{FALLBACK_ID_PREFIX}{stripe_id}"),
        stripe_subscription_id: stripe_id.to_string(),
        status: SubscriptionStatus::Active,
        tier_id: user
            .tier_id
            .clone()
            .unwrap_or_else(|| policy.default_tier_id.clone()),
        current_period_end: now.add_days(policy.period_days),
        cancel_at_period_end: false,
        fallback: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ExternalUserId, SubscriptionId};

    fn user() -> User {
        User::new(ExternalUserId::new("user_1").unwrap(), None, 10)
    }

    fn linked_user() -> User {
        let mut user = user();
        user.stripe_subscription_id = Some("sub_123".to_string());
        user.stripe_subscription_status = Some(SubscriptionStatus::Active);
        user
    }

    fn stored(user: &User, now: Timestamp) -> Subscription {
        Subscription {
            id: SubscriptionId::new(),
            user_id: user.id,
            stripe_subscription_id: "sub_stored".to_string(),
            status: SubscriptionStatus::Active,
            tier_id: "basic".to_string(),
            current_period_end: now.add_days(12),
            cancel_at_period_end: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn no_linkage_yields_none() {
        let view = reconcile_subscription(&user(), None, Timestamp::now(), &FallbackPolicy::default());
        assert!(view.is_none());
    }

    #[test]
    fn active_user_without_row_gets_fallback() {
        let now = Timestamp::now();
        let view = reconcile_subscription(&linked_user(), None, now, &FallbackPolicy::default())
            .unwrap();

        assert_eq!(view.id, "fallback-sub_123");
        assert!(view.id.starts_with(FALLBACK_ID_PREFIX));
        assert_eq!(view.tier_id, "pro");
        assert!(!view.cancel_at_period_end);
        assert_eq!(view.status, SubscriptionStatus::Active);
        assert!(view.fallback);
        assert_eq!(view.current_period_end.duration_since(&now).num_days(), 30);
    }

    #[test]
    fn fallback_keeps_user_tier() {
        let mut user = linked_user();
        user.tier_id = Some("basic".to_string());
        let view = reconcile_subscription(&user, None, Timestamp::now(), &FallbackPolicy::default())
            .unwrap();
        assert_eq!(view.tier_id, "basic");
    }

    #[test]
    fn fallback_honours_policy() {
        let policy = FallbackPolicy {
            period_days: 7,
            default_tier_id: "basic".to_string(),
        };
        let now = Timestamp::now();
        let view = reconcile_subscription(&linked_user(), None, now, &policy).unwrap();
        assert_eq!(view.tier_id, "basic");
        assert_eq!(view.current_period_end.duration_since(&now).num_days(), 7);
    }

    #[test]
    fn non_active_status_yields_none() {
        let mut user = linked_user();
        user.stripe_subscription_status = Some(SubscriptionStatus::PastDue);
        let view = reconcile_subscription(&user, None, Timestamp::now(), &FallbackPolicy::default());
        assert!(view.is_none());
    }

    #[test]
    fn stored_row_wins_over_fallback() {
        let now = Timestamp::now();
        let user = linked_user();
        let row = stored(&user, now);
        let view =
            reconcile_subscription(&user, Some(&row), now, &FallbackPolicy::default()).unwrap();

        assert_eq!(view.id, row.id.to_string());
        assert_eq!(view.stripe_subscription_id, "sub_stored");
        assert_eq!(view.tier_id, "basic");
        assert!(view.cancel_at_period_end);
        assert!(!view.fallback);
    }

    #[test]
    fn view_serializes_camel_case() {
        let view = reconcile_subscription(
            &linked_user(),
            None,
            Timestamp::now(),
            &FallbackPolicy::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["tierId"], "pro");
        assert_eq!(json["cancelAtPeriodEnd"], false);
        assert_eq!(json["status"], "active");
        assert_eq!(json["fallback"], true);
        assert!(json.get("currentPeriodEnd").is_some());
    }
}

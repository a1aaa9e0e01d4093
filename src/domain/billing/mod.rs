//! Billing domain - tiers, subscriptions, and reconciliation of Stripe state.

mod reconciliation;
mod subscription;
mod tier;

pub use reconciliation::{
    reconcile_subscription, FallbackPolicy, SubscriptionView, FALLBACK_ID_PREFIX,
};
pub use subscription::{Subscription, SubscriptionStatus};
pub use tier::{Tier, TierCatalog, BASIC_TIER_ID, FREE_TIER_ID, PRO_TIER_ID};

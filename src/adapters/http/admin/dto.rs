//! HTTP DTOs for admin endpoints.

use serde::Serialize;

use crate::domain::account::User;
use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheckResponse {
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminListResponse {
    pub admins: Vec<String>,
}

/// Account row as shown to administrators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub external_id: String,
    pub email: Option<String>,
    pub credits: i64,
    pub tier_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_status: Option<SubscriptionStatus>,
    pub created_at: Timestamp,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            external_id: user.external_id.to_string(),
            email: user.email,
            credits: user.credits,
            tier_id: user.tier_id,
            stripe_customer_id: user.stripe_customer_id,
            stripe_subscription_status: user.stripe_subscription_status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

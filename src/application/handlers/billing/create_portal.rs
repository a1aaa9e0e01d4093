//! CreatePortalHandler - Command handler for the Stripe billing portal.

use std::sync::Arc;

use tracing::error;

use crate::domain::foundation::{DomainError, ErrorCode, ExternalUserId};
use crate::ports::{PaymentProvider, UserRepository};

/// Command to open the billing portal for the caller.
#[derive(Debug, Clone)]
pub struct CreatePortalCommand {
    pub external_id: ExternalUserId,
}

/// Result: hosted portal URL.
#[derive(Debug, Clone)]
pub struct CreatePortalResult {
    pub url: String,
}

/// Handler for billing portal sessions.
///
/// Only callers that already went through checkout have a Stripe customer;
/// everyone else gets `NoBillingAccount`.
pub struct CreatePortalHandler {
    users: Arc<dyn UserRepository>,
    payments: Arc<dyn PaymentProvider>,
    return_url: String,
}

impl CreatePortalHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        payments: Arc<dyn PaymentProvider>,
        app_url: &str,
    ) -> Self {
        Self {
            users,
            payments,
            return_url: format!("{}/dashboard", app_url.trim_end_matches('/')),
        }
    }

    pub async fn handle(&self, cmd: CreatePortalCommand) -> Result<CreatePortalResult, DomainError> {
        let customer_id = self
            .users
            .find_by_external_id(&cmd.external_id)
            .await?
            .and_then(|u| u.stripe_customer_id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::NoBillingAccount, "No billing account for user")
            })?;

        let session = self
            .payments
            .create_portal_session(&customer_id, &self.return_url)
            .await
            .map_err(|e| {
                error!(user_id = %cmd.external_id, error = %e, "Portal session failed");
                DomainError::from(e)
            })?;

        Ok(CreatePortalResult { url: session.url })
    }
}

//! CreateCheckoutHandler - Command handler that starts a Stripe checkout.

use std::sync::Arc;

use tracing::error;

use crate::application::handlers::account::{GetOrCreateUserCommand, GetOrCreateUserHandler};
use crate::domain::billing::TierCatalog;
use crate::domain::foundation::{AuthenticatedUser, DomainError, ErrorCode};
use crate::ports::{CreateCheckoutRequest, PaymentProvider};

/// Command to create a checkout session for a tier.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub caller: AuthenticatedUser,
    pub tier_id: String,
}

/// Result: hosted checkout URL.
#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    pub url: String,
}

/// Handler for subscription checkout.
pub struct CreateCheckoutHandler {
    accounts: GetOrCreateUserHandler,
    payments: Arc<dyn PaymentProvider>,
    catalog: Arc<TierCatalog>,
    app_url: String,
}

impl CreateCheckoutHandler {
    pub fn new(
        accounts: GetOrCreateUserHandler,
        payments: Arc<dyn PaymentProvider>,
        catalog: Arc<TierCatalog>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            accounts,
            payments,
            catalog,
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, DomainError> {
        let tier = self.catalog.find(&cmd.tier_id).ok_or_else(|| {
            DomainError::new(ErrorCode::UnknownTier, format!("Unknown tier: {}", cmd.tier_id))
        })?;
        let price_id = match (&tier.stripe_price_id, tier.is_paid()) {
            (Some(price_id), true) => price_id.clone(),
            _ => {
                return Err(DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("Tier '{}' cannot be purchased", tier.id),
                ))
            }
        };

        let user = self
            .accounts
            .handle(GetOrCreateUserCommand {
                caller: cmd.caller,
            })
            .await?;

        let request = CreateCheckoutRequest {
            user_id: user.external_id.to_string(),
            tier_id: tier.id.clone(),
            price_id,
            email: if user.stripe_customer_id.is_some() {
                None
            } else {
                user.email.clone()
            },
            customer_id: user.stripe_customer_id.clone(),
            success_url: format!("{}/dashboard?checkout=success", self.app_url),
            cancel_url: format!("{}/pricing?checkout=canceled", self.app_url),
        };

        let session = self
            .payments
            .create_checkout_session(request)
            .await
            .map_err(|e| {
                error!(user_id = %user.external_id, tier_id = %tier.id, error = %e, "Checkout session failed");
                DomainError::from(e)
            })?;

        Ok(CreateCheckoutResult { url: session.url })
    }
}

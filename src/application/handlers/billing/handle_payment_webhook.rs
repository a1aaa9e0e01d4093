//! HandlePaymentWebhookHandler - Command handler for Stripe webhooks.
//!
//! Webhooks are the only path by which billing state reaches the database.
//! Each event id is claimed before its effects are applied and released again
//! if applying fails, so a Stripe retry of a failed event is processed while
//! a replay of a successful one is not.
//!
//! Stripe does not order deliveries. A subscription or invoice event whose
//! user cannot be resolved yet fails with `BillingNotLinked`, which releases
//! the claim and answers 503 so Stripe delivers it again after checkout.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::account::{BillingLink, User};
use crate::domain::billing::{Subscription, SubscriptionStatus, TierCatalog, FREE_TIER_ID};
use crate::domain::foundation::{
    DomainError, ErrorCode, ExternalUserId, SubscriptionId, Timestamp,
};
use crate::ports::{
    PaymentProvider, SaveResult, SubscriptionRepository, UserRepository, WebhookEvent,
    WebhookEventData, WebhookEventStore, WebhookEventType,
};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header.
    pub signature: String,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlePaymentWebhookResult {
    /// Checkout completed, customer and subscription linked to the user.
    CheckoutLinked { user_id: String },
    /// Subscription row upserted and mirrored onto the user.
    SubscriptionSynced {
        subscription_id: String,
        status: SubscriptionStatus,
    },
    /// Invoice paid, tier credits granted.
    CreditsGranted {
        user_id: String,
        amount: i64,
        balance: i64,
    },
    /// Event id was already processed.
    Duplicate,
    /// Event acknowledged but no action taken.
    Ignored,
}

/// Handler for processing Stripe webhooks.
pub struct HandlePaymentWebhookHandler {
    payments: Arc<dyn PaymentProvider>,
    events: Arc<dyn WebhookEventStore>,
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    catalog: Arc<TierCatalog>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        payments: Arc<dyn PaymentProvider>,
        events: Arc<dyn WebhookEventStore>,
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        catalog: Arc<TierCatalog>,
    ) -> Self {
        Self {
            payments,
            events,
            users,
            subscriptions,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, DomainError> {
        // 1. Verify signature and parse
        let event = self
            .payments
            .verify_webhook(&cmd.payload, &cmd.signature)
            .map_err(|e| {
                warn!(error = %e, "Rejected webhook");
                DomainError::from(e)
            })?;

        // 2. Claim the event id
        let claim = self
            .events
            .claim(&event.id, event.event_type.as_stripe())
            .await?;
        if claim == SaveResult::AlreadyExists {
            info!(event_id = %event.id, event_type = %event.event_type.as_stripe(), "Duplicate webhook skipped");
            return Ok(HandlePaymentWebhookResult::Duplicate);
        }

        // 3. Apply, releasing the claim on failure so Stripe's retry is processed
        match self.apply(&event).await {
            Ok(result) => {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type.as_stripe(),
                    outcome = ?result,
                    "Webhook processed"
                );
                Ok(result)
            }
            Err(e) => {
                if let Err(release) = self.events.release(&event.id).await {
                    warn!(event_id = %event.id, error = %release, "Failed to release webhook claim");
                }
                Err(e)
            }
        }
    }

    async fn apply(&self, event: &WebhookEvent) -> Result<HandlePaymentWebhookResult, DomainError> {
        match (&event.event_type, &event.data) {
            (
                WebhookEventType::CheckoutSessionCompleted,
                WebhookEventData::Checkout {
                    customer_id,
                    subscription_id,
                    user_id,
                    tier_id,
                    ..
                },
            ) => {
                self.link_checkout(
                    customer_id.as_deref(),
                    subscription_id.as_deref(),
                    user_id.as_deref(),
                    tier_id.as_deref(),
                )
                .await
            }
            (
                WebhookEventType::SubscriptionCreated
                | WebhookEventType::SubscriptionUpdated
                | WebhookEventType::SubscriptionDeleted,
                WebhookEventData::Subscription {
                    subscription_id,
                    customer_id,
                    status,
                    price_id,
                    current_period_end,
                    cancel_at_period_end,
                    user_id,
                },
            ) => {
                self.sync_subscription(SubscriptionUpdate {
                    user_id: user_id.as_deref(),
                    subscription_id,
                    customer_id,
                    status,
                    price_id: price_id.as_deref(),
                    current_period_end: *current_period_end,
                    cancel_at_period_end: *cancel_at_period_end,
                })
                .await
            }
            (
                WebhookEventType::InvoicePaid,
                WebhookEventData::Invoice {
                    customer_id,
                    subscription_id,
                    price_id,
                    user_id,
                    ..
                },
            ) => {
                self.grant_period_credits(
                    customer_id,
                    subscription_id.as_deref(),
                    price_id.as_deref(),
                    user_id.as_deref(),
                )
                .await
            }
            (WebhookEventType::Unknown(_), _) => Ok(HandlePaymentWebhookResult::Ignored),
            (event_type, _) => Err(DomainError::new(
                ErrorCode::InvalidWebhook,
                format!("Unexpected payload for {}", event_type.as_stripe()),
            )),
        }
    }

    async fn link_checkout(
        &self,
        customer_id: Option<&str>,
        subscription_id: Option<&str>,
        user_id: Option<&str>,
        tier_id: Option<&str>,
    ) -> Result<HandlePaymentWebhookResult, DomainError> {
        let user = match user_id {
            Some(id) => {
                let external_id = ExternalUserId::new(id)?;
                self.users.find_by_external_id(&external_id).await?
            }
            None => None,
        };
        let user = match (user, customer_id) {
            (Some(user), _) => Some(user),
            (None, Some(customer)) => self.users.find_by_stripe_customer_id(customer).await?,
            (None, None) => None,
        };
        let Some(user) = user else {
            warn!(?user_id, ?customer_id, "Checkout completed for unknown user");
            return Ok(HandlePaymentWebhookResult::Ignored);
        };

        let mut link = BillingLink::from_user(&user);
        if let Some(customer) = customer_id {
            link.stripe_customer_id = Some(customer.to_string());
        }
        if let Some(subscription) = subscription_id {
            link.stripe_subscription_id = Some(subscription.to_string());
            link.stripe_subscription_status = Some(SubscriptionStatus::Active);
        }
        if let Some(tier) = tier_id.filter(|t| self.catalog.find(t).is_some()) {
            link.tier_id = Some(tier.to_string());
        }
        self.users.update_billing(&user.id, &link).await?;

        Ok(HandlePaymentWebhookResult::CheckoutLinked {
            user_id: user.external_id.to_string(),
        })
    }

    async fn sync_subscription(
        &self,
        update: SubscriptionUpdate<'_>,
    ) -> Result<HandlePaymentWebhookResult, DomainError> {
        let user = self
            .find_billing_user(update.customer_id, update.user_id)
            .await
            .inspect_err(|_| {
                warn!(
                    customer_id = %update.customer_id,
                    subscription_id = %update.subscription_id,
                    "Subscription event for unknown customer, awaiting checkout"
                )
            })?;

        let status = SubscriptionStatus::parse(update.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::InvalidWebhook,
                format!("Unknown subscription status: {}", update.status),
            )
        })?;
        let current_period_end = Timestamp::from_unix_secs(update.current_period_end)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InvalidWebhook, "Invalid current_period_end")
            })?;

        let existing = self
            .subscriptions
            .find_by_stripe_id(update.subscription_id)
            .await?;
        let tier_id = self.resolve_tier(update.price_id, existing.as_ref(), &user);

        let now = Timestamp::now();
        let stored = self
            .subscriptions
            .upsert(&Subscription {
                id: SubscriptionId::new(),
                user_id: user.id,
                stripe_subscription_id: update.subscription_id.to_string(),
                status,
                tier_id: tier_id.clone(),
                current_period_end,
                cancel_at_period_end: update.cancel_at_period_end,
                created_at: now,
                updated_at: now,
            })
            .await?;

        // A stale event for an older subscription must not overwrite the
        // linkage of the one the user currently holds.
        let tracks_this_subscription = match user.stripe_subscription_id.as_deref() {
            None => true,
            Some(current) => current == update.subscription_id,
        };
        if tracks_this_subscription || status == SubscriptionStatus::Active {
            let link = BillingLink {
                stripe_customer_id: Some(update.customer_id.to_string()),
                stripe_subscription_id: Some(stored.stripe_subscription_id.clone()),
                stripe_subscription_status: Some(status),
                tier_id: Some(tier_id),
            };
            self.users.update_billing(&user.id, &link).await?;
        }

        Ok(HandlePaymentWebhookResult::SubscriptionSynced {
            subscription_id: stored.stripe_subscription_id,
            status,
        })
    }

    async fn grant_period_credits(
        &self,
        customer_id: &str,
        subscription_id: Option<&str>,
        price_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<HandlePaymentWebhookResult, DomainError> {
        let Some(subscription_id) = subscription_id else {
            return Ok(HandlePaymentWebhookResult::Ignored);
        };
        let user = self
            .find_billing_user(customer_id, user_id)
            .await
            .inspect_err(|_| {
                warn!(%customer_id, %subscription_id, "Invoice paid for unknown customer, awaiting checkout")
            })?;

        let existing = self.subscriptions.find_by_stripe_id(subscription_id).await?;
        let tier_id = self.resolve_tier(price_id, existing.as_ref(), &user);
        let amount = self
            .catalog
            .find(&tier_id)
            .map(|t| t.credits_per_period)
            .unwrap_or(0);
        if amount <= 0 {
            warn!(%customer_id, %tier_id, "Invoice paid for tier without credit allotment");
            return Ok(HandlePaymentWebhookResult::Ignored);
        }

        let updated = self
            .users
            .add_credits(&user.external_id, amount)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "User not found"))?;

        Ok(HandlePaymentWebhookResult::CreditsGranted {
            user_id: updated.external_id.to_string(),
            amount,
            balance: updated.credits,
        })
    }

    /// The user behind a customer id, falling back to the `user_id` stamped
    /// into the subscription metadata at checkout. A user found that way gets
    /// the customer linked so later events resolve directly.
    async fn find_billing_user(
        &self,
        customer_id: &str,
        user_id: Option<&str>,
    ) -> Result<User, DomainError> {
        if let Some(user) = self.users.find_by_stripe_customer_id(customer_id).await? {
            return Ok(user);
        }

        let user = match user_id {
            Some(id) => {
                let external_id = ExternalUserId::new(id)?;
                self.users.find_by_external_id(&external_id).await?
            }
            None => None,
        };
        let Some(mut user) = user else {
            return Err(DomainError::new(
                ErrorCode::BillingNotLinked,
                format!("No user linked to customer {}", customer_id),
            ));
        };

        if user.stripe_customer_id.is_none() {
            let mut link = BillingLink::from_user(&user);
            link.stripe_customer_id = Some(customer_id.to_string());
            self.users.update_billing(&user.id, &link).await?;
            user.stripe_customer_id = link.stripe_customer_id;
        }
        Ok(user)
    }

    /// Tier from the price id, then the stored row, then the user's columns.
    fn resolve_tier(
        &self,
        price_id: Option<&str>,
        existing: Option<&Subscription>,
        user: &User,
    ) -> String {
        price_id
            .and_then(|p| self.catalog.find_by_price_id(p))
            .map(|t| t.id.clone())
            .or_else(|| existing.map(|s| s.tier_id.clone()))
            .or_else(|| user.tier_id.clone())
            .unwrap_or_else(|| {
                warn!(?price_id, user_id = %user.external_id, "Could not resolve tier, using free");
                FREE_TIER_ID.to_string()
            })
    }
}

struct SubscriptionUpdate<'a> {
    subscription_id: &'a str,
    customer_id: &'a str,
    status: &'a str,
    price_id: Option<&'a str>,
    current_period_end: i64,
    cancel_at_period_end: bool,
    user_id: Option<&'a str>,
}

//! Shared application state for the HTTP layer.

use std::sync::Arc;

use crate::application::handlers::account::{
    AddCreditsHandler, GetOrCreateUserHandler, ListHistoryHandler, RecordSearchHandler,
};
use crate::application::handlers::admin::{IsAdminHandler, ListUsersHandler};
use crate::application::handlers::billing::{
    CreateCheckoutHandler, CreatePortalHandler, GetSubscriptionHandler,
    HandlePaymentWebhookHandler,
};
use crate::domain::admin::AdminAllowList;
use crate::domain::billing::{FallbackPolicy, TierCatalog};
use crate::ports::{
    IdentityProvider, PaymentProvider, SearchRepository, SessionValidator,
    SubscriptionRepository, UserRepository, WebhookEventStore,
};

/// Tunables that handlers read but never change.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Starting balance of a newly created user.
    pub default_balance: i64,
    /// Credits added by `GET /api/credits/add`.
    pub manual_grant: i64,
    /// Credits charged per recorded search.
    pub search_cost: i64,
    pub fallback: FallbackPolicy,
    /// Public URL of the web app, used for Stripe redirects.
    pub app_url: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_balance: 10,
            manual_grant: 30,
            search_cost: 1,
            fallback: FallbackPolicy::default(),
            app_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every field is an `Arc`, so cloning is cheap.
/// Handlers are built on demand from the shared state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub searches: Arc<dyn SearchRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub webhook_events: Arc<dyn WebhookEventStore>,
    pub session_validator: Arc<dyn SessionValidator>,
    pub identity: Arc<dyn IdentityProvider>,
    pub payments: Arc<dyn PaymentProvider>,
    pub catalog: Arc<TierCatalog>,
    pub admins: Arc<AdminAllowList>,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    pub fn get_or_create_user_handler(&self) -> GetOrCreateUserHandler {
        GetOrCreateUserHandler::new(
            self.users.clone(),
            self.identity.clone(),
            self.settings.default_balance,
        )
    }

    pub fn add_credits_handler(&self) -> AddCreditsHandler {
        AddCreditsHandler::new(self.users.clone())
    }

    pub fn list_history_handler(&self) -> ListHistoryHandler {
        ListHistoryHandler::new(self.users.clone(), self.searches.clone())
    }

    pub fn record_search_handler(&self) -> RecordSearchHandler {
        RecordSearchHandler::new(
            self.get_or_create_user_handler(),
            self.users.clone(),
            self.searches.clone(),
            self.settings.search_cost,
        )
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(
            self.users.clone(),
            self.subscriptions.clone(),
            self.settings.fallback.clone(),
        )
    }

    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            self.get_or_create_user_handler(),
            self.payments.clone(),
            self.catalog.clone(),
            self.settings.app_url.clone(),
        )
    }

    pub fn create_portal_handler(&self) -> CreatePortalHandler {
        CreatePortalHandler::new(
            self.users.clone(),
            self.payments.clone(),
            &self.settings.app_url,
        )
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.payments.clone(),
            self.webhook_events.clone(),
            self.users.clone(),
            self.subscriptions.clone(),
            self.catalog.clone(),
        )
    }

    pub fn is_admin_handler(&self) -> IsAdminHandler {
        IsAdminHandler::new(self.users.clone(), self.admins.clone())
    }

    pub fn list_users_handler(&self) -> ListUsersHandler {
        ListUsersHandler::new(self.is_admin_handler(), self.users.clone())
    }
}

//! Billing handlers.
//!
//! ## Commands
//! - Creating Stripe checkout sessions
//! - Creating billing portal sessions
//! - Processing Stripe webhooks
//!
//! ## Queries
//! - Current subscription, with fallback reconciliation

mod create_checkout;
mod create_portal;
mod get_subscription;
mod handle_payment_webhook;

// Commands
pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler, CreateCheckoutResult};
pub use create_portal::{CreatePortalCommand, CreatePortalHandler, CreatePortalResult};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
};

// Queries
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery, GetSubscriptionResult};

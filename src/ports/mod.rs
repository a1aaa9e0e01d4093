//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Identity Ports
//!
//! - `SessionValidator` - Resolves the caller from a session token
//! - `IdentityProvider` - Profile lookups (primary email)
//!
//! ## Persistence Ports
//!
//! - `UserRepository` - Users and their atomic credit balance
//! - `SearchRepository` - Search history
//! - `SubscriptionRepository` - Stripe subscriptions synced by webhooks
//! - `WebhookEventStore` - Stripe webhook idempotency tracking
//!
//! ## Billing Ports
//!
//! - `PaymentProvider` - Checkout, portal and webhook verification

mod identity_provider;
mod payment_provider;
mod search_repository;
mod session_validator;
mod subscription_repository;
mod user_repository;
mod webhook_event_store;

pub use identity_provider::IdentityProvider;
pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
    PortalSession, WebhookEvent, WebhookEventData, WebhookEventType,
};
pub use search_repository::SearchRepository;
pub use session_validator::SessionValidator;
pub use subscription_repository::SubscriptionRepository;
pub use user_repository::UserRepository;
pub use webhook_event_store::{SaveResult, WebhookEventStore};

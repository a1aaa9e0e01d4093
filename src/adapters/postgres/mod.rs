//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresUserRepository` - Users and atomic credit updates
//! - `PostgresSearchRepository` - Search history
//! - `PostgresSubscriptionRepository` - Webhook-synced subscriptions
//! - `PostgresWebhookEventStore` - Stripe webhook idempotency

mod search_repository;
mod subscription_repository;
mod user_repository;
mod webhook_event_store;

pub use search_repository::PostgresSearchRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use user_repository::PostgresUserRepository;
pub use webhook_event_store::PostgresWebhookEventStore;

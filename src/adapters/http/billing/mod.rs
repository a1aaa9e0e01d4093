//! HTTP adapter for billing endpoints.
//!
//! - `GET /api/subscription` - Current subscription, or a flagged fallback
//! - `POST /api/stripe/create-checkout` - Hosted checkout URL for a tier
//! - `POST /api/stripe/create-portal` - Hosted billing portal URL
//! - `POST /api/stripe/webhook` - Stripe webhook receiver

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::billing_routes;

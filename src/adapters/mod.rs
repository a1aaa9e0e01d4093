//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Clerk session validation and user lookups
//! - `stripe` - Stripe checkout, portal and webhook verification
//! - `postgres` - PostgreSQL repositories
//! - `memory` - In-memory repositories for tests and local runs
//! - `http` - axum routes, extractors and error mapping

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

//! Ziq API - authenticated search sessions, credits and subscription billing.
//!
//! Hexagonal layout: `domain` holds the rules, `ports` the traits the
//! application depends on, `application` the use-case handlers and `adapters`
//! the Clerk, Stripe, PostgreSQL and HTTP implementations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

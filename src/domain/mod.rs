//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, auth)
//! - `account` - Users, credit balances and search history
//! - `billing` - Tiers, subscriptions and Stripe state reconciliation
//! - `admin` - Administrator allow-list

pub mod account;
pub mod admin;
pub mod billing;
pub mod foundation;

//! User repository port.
//!
//! Credit balances are only changed through `add_credits` and
//! `try_debit_credits`, which implementations must perform as single atomic
//! statements. Callers never write a balance they computed themselves.

use async_trait::async_trait;

use crate::domain::account::{BillingLink, User};
use crate::domain::foundation::{DomainError, ExternalUserId, UserId};

/// Repository port for `User` rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by identity-provider id.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<User>, DomainError>;

    /// Find a user by Stripe customer id.
    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, DomainError>;

    /// Insert `user` unless a row with the same external id exists.
    ///
    /// Returns the stored row in both cases. Concurrent calls for the same
    /// external id converge on one row. An email is filled in on the existing
    /// row only when it had none.
    async fn insert_if_absent(&self, user: &User) -> Result<User, DomainError>;

    /// Atomically add `amount` to the balance.
    ///
    /// Returns `None` when no user has this external id.
    async fn add_credits(
        &self,
        external_id: &ExternalUserId,
        amount: i64,
    ) -> Result<Option<User>, DomainError>;

    /// Atomically subtract `cost` if the balance covers it.
    ///
    /// Returns the remaining balance, or `None` when credits are insufficient.
    async fn try_debit_credits(&self, user_id: &UserId, cost: i64)
        -> Result<Option<i64>, DomainError>;

    /// Overwrite the Stripe linkage columns.
    async fn update_billing(&self, user_id: &UserId, link: &BillingLink)
        -> Result<(), DomainError>;

    /// Users ordered by creation time, newest first.
    async fn list(&self, limit: i64) -> Result<Vec<User>, DomainError>;
}

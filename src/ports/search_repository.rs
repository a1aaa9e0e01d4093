//! Search history repository port.

use async_trait::async_trait;

use crate::domain::account::Search;
use crate::domain::foundation::{DomainError, UserId};

/// Repository port for `Search` rows.
#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// Persist a search.
    async fn record(&self, search: &Search) -> Result<(), DomainError>;

    /// Searches of one user, newest first.
    async fn list_for_user(&self, user_id: &UserId, limit: i64)
        -> Result<Vec<Search>, DomainError>;
}

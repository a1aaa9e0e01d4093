//! RecordSearchHandler - Command handler that charges credits for a search.

use std::sync::Arc;

use tracing::{error, info};

use super::{GetOrCreateUserCommand, GetOrCreateUserHandler};
use crate::domain::account::Search;
use crate::domain::foundation::{AuthenticatedUser, DomainError, ErrorCode};
use crate::ports::{SearchRepository, UserRepository};

/// Command to record a search for the caller.
#[derive(Debug, Clone)]
pub struct RecordSearchCommand {
    pub caller: AuthenticatedUser,
    pub query: String,
    pub group_id: Option<String>,
}

/// Result of a recorded search.
#[derive(Debug, Clone)]
pub struct RecordSearchResult {
    pub search: Search,
    /// Balance after the debit.
    pub credits: i64,
}

/// Handler for charged searches.
///
/// The debit is a conditional update in the store, so a balance can never go
/// negative. If the search row then fails to insert, the cost is refunded.
pub struct RecordSearchHandler {
    accounts: GetOrCreateUserHandler,
    users: Arc<dyn UserRepository>,
    searches: Arc<dyn SearchRepository>,
    cost: i64,
}

impl RecordSearchHandler {
    pub fn new(
        accounts: GetOrCreateUserHandler,
        users: Arc<dyn UserRepository>,
        searches: Arc<dyn SearchRepository>,
        cost: i64,
    ) -> Self {
        Self {
            accounts,
            users,
            searches,
            cost,
        }
    }

    pub async fn handle(&self, cmd: RecordSearchCommand) -> Result<RecordSearchResult, DomainError> {
        let user = self
            .accounts
            .handle(GetOrCreateUserCommand {
                caller: cmd.caller,
            })
            .await?;

        // Validate before charging so a bad query costs nothing.
        let search = Search::new(user.id, cmd.query, cmd.group_id)?;

        let credits = self
            .users
            .try_debit_credits(&user.id, self.cost)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InsufficientCredits, "Insufficient credits")
            })?;

        if let Err(e) = self.searches.record(&search).await {
            if let Err(refund) = self.users.add_credits(&user.external_id, self.cost).await {
                error!(
                    user_id = %user.external_id,
                    cost = self.cost,
                    error = %refund,
                    "Failed to refund search cost"
                );
            }
            return Err(e);
        }

        info!(user_id = %user.external_id, search_id = %search.id, credits, "Search recorded");
        Ok(RecordSearchResult { search, credits })
    }
}

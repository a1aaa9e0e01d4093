//! AddCreditsHandler - Command handler for atomic credit grants.

use std::sync::Arc;

use tracing::info;

use crate::domain::account::User;
use crate::domain::foundation::{DomainError, ErrorCode, ExternalUserId, ValidationError};
use crate::ports::UserRepository;

/// Command to add credits to a user's balance.
#[derive(Debug, Clone)]
pub struct AddCreditsCommand {
    pub external_id: ExternalUserId,
    pub amount: i64,
}

/// Handler for credit grants.
///
/// The increment happens inside the store so concurrent grants never lose
/// updates.
pub struct AddCreditsHandler {
    users: Arc<dyn UserRepository>,
}

impl AddCreditsHandler {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn handle(&self, cmd: AddCreditsCommand) -> Result<User, DomainError> {
        if cmd.amount <= 0 {
            return Err(ValidationError::out_of_range("amount", 1, i64::MAX, cmd.amount).into());
        }

        let user = self
            .users
            .add_credits(&cmd.external_id, cmd.amount)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "User not found"))?;

        info!(
            user_id = %cmd.external_id,
            amount = cmd.amount,
            balance = user.credits,
            "Credits granted"
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn external(id: &str) -> ExternalUserId {
        ExternalUserId::new(id).unwrap()
    }

    fn store_with_user(credits: i64) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.put_user(User::new(external("user_1"), None, credits));
        store
    }

    #[tokio::test]
    async fn adds_to_existing_balance() {
        let handler = AddCreditsHandler::new(store_with_user(5));

        let user = handler
            .handle(AddCreditsCommand {
                external_id: external("user_1"),
                amount: 30,
            })
            .await
            .unwrap();

        assert_eq!(user.credits, 35);
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts() {
        let handler = AddCreditsHandler::new(store_with_user(5));

        for amount in [0, -10] {
            let err = handler
                .handle(AddCreditsCommand {
                    external_id: external("user_1"),
                    amount,
                })
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed);
        }
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let handler = AddCreditsHandler::new(Arc::new(InMemoryStore::new()));

        let err = handler
            .handle(AddCreditsCommand {
                external_id: external("ghost"),
                amount: 30,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::UserNotFound);
    }
}

//! GetOrCreateUserHandler - Resolves the caller's user row, creating it on first use.

use std::sync::Arc;

use tracing::warn;

use crate::domain::account::User;
use crate::domain::foundation::{AuthenticatedUser, DomainError};
use crate::ports::{IdentityProvider, UserRepository};

/// Command to fetch or lazily create the caller's account.
#[derive(Debug, Clone)]
pub struct GetOrCreateUserCommand {
    pub caller: AuthenticatedUser,
}

/// Handler for lazy account creation.
///
/// Concurrent first requests for the same caller converge on one row because
/// the insert is an upsert keyed on the external id.
#[derive(Clone)]
pub struct GetOrCreateUserHandler {
    users: Arc<dyn UserRepository>,
    identity: Arc<dyn IdentityProvider>,
    default_balance: i64,
}

impl GetOrCreateUserHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        identity: Arc<dyn IdentityProvider>,
        default_balance: i64,
    ) -> Self {
        Self {
            users,
            identity,
            default_balance,
        }
    }

    pub async fn handle(&self, cmd: GetOrCreateUserCommand) -> Result<User, DomainError> {
        if let Some(user) = self.users.find_by_external_id(&cmd.caller.id).await? {
            return Ok(user);
        }

        let email = match cmd.caller.email {
            Some(email) => Some(email),
            None => self.lookup_email(&cmd.caller).await,
        };

        let user = User::new(cmd.caller.id, email, self.default_balance);
        self.users.insert_if_absent(&user).await
    }

    // The address is profile data only; a failed lookup must not block signup.
    async fn lookup_email(&self, caller: &AuthenticatedUser) -> Option<String> {
        match self.identity.primary_email(&caller.id).await {
            Ok(email) => email,
            Err(e) => {
                warn!(user_id = %caller.id, error = %e, "Could not resolve primary email");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockIdentityProvider;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{AuthError, ExternalUserId};

    fn caller(id: &str, email: Option<&str>) -> AuthenticatedUser {
        AuthenticatedUser::new(
            ExternalUserId::new(id).unwrap(),
            email.map(String::from),
        )
    }

    fn handler(store: Arc<InMemoryStore>, identity: MockIdentityProvider) -> GetOrCreateUserHandler {
        GetOrCreateUserHandler::new(store, Arc::new(identity), 10)
    }

    #[tokio::test]
    async fn creates_user_with_default_balance() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(store.clone(), MockIdentityProvider::new());

        let user = handler
            .handle(GetOrCreateUserCommand {
                caller: caller("user_1", Some("a@example.com")),
            })
            .await
            .unwrap();

        assert_eq!(user.credits, 10);
        assert_eq!(user.email.as_deref(), Some("a@example.com"));
        assert!(store.user("user_1").is_some());
    }

    #[tokio::test]
    async fn returns_existing_user_unchanged() {
        let store = Arc::new(InMemoryStore::new());
        let mut existing = User::new(ExternalUserId::new("user_1").unwrap(), None, 3);
        existing.tier_id = Some("basic".to_string());
        store.put_user(existing.clone());

        let user = handler(store, MockIdentityProvider::new())
            .handle(GetOrCreateUserCommand {
                caller: caller("user_1", None),
            })
            .await
            .unwrap();

        assert_eq!(user.id, existing.id);
        assert_eq!(user.credits, 3);
    }

    #[tokio::test]
    async fn resolves_email_from_identity_provider() {
        let store = Arc::new(InMemoryStore::new());
        let identity = MockIdentityProvider::new().with_email("user_1", "clerk@example.com");

        let user = handler(store, identity)
            .handle(GetOrCreateUserCommand {
                caller: caller("user_1", None),
            })
            .await
            .unwrap();

        assert_eq!(user.email.as_deref(), Some("clerk@example.com"));
    }

    #[tokio::test]
    async fn identity_failure_still_creates_user() {
        let store = Arc::new(InMemoryStore::new());
        let identity = MockIdentityProvider::new().with_error(AuthError::service_unavailable("down"));

        let user = handler(store, identity)
            .handle(GetOrCreateUserCommand {
                caller: caller("user_1", None),
            })
            .await
            .unwrap();

        assert!(user.email.is_none());
        assert_eq!(user.credits, 10);
    }
}

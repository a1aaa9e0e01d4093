//! IsAdminHandler - Query handler for the admin gate.

use std::sync::Arc;

use tracing::warn;

use crate::domain::admin::AdminAllowList;
use crate::domain::foundation::ExternalUserId;
use crate::ports::UserRepository;

/// Query whether the caller is an administrator.
#[derive(Debug, Clone)]
pub struct IsAdminQuery {
    /// `None` for anonymous callers.
    pub external_id: Option<ExternalUserId>,
}

/// Handler for the admin gate.
///
/// Fails closed: no session, no user row, no email or a failed lookup all
/// answer `false`. This handler never returns an error.
#[derive(Clone)]
pub struct IsAdminHandler {
    users: Arc<dyn UserRepository>,
    allow_list: Arc<AdminAllowList>,
}

impl IsAdminHandler {
    pub fn new(users: Arc<dyn UserRepository>, allow_list: Arc<AdminAllowList>) -> Self {
        Self { users, allow_list }
    }

    pub async fn handle(&self, query: IsAdminQuery) -> bool {
        let Some(external_id) = query.external_id else {
            return false;
        };

        match self.users.find_by_external_id(&external_id).await {
            Ok(user) => user
                .and_then(|u| u.email)
                .is_some_and(|email| self.allow_list.contains(&email)),
            Err(e) => {
                warn!(user_id = %external_id, error = %e, "Admin lookup failed, denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::account::{BillingLink, User};
    use crate::domain::foundation::{DomainError, UserId};
    use async_trait::async_trait;

    struct BrokenUsers;

    #[async_trait]
    impl UserRepository for BrokenUsers {
        async fn find_by_external_id(
            &self,
            _external_id: &ExternalUserId,
        ) -> Result<Option<User>, DomainError> {
            Err(DomainError::database("Simulated outage"))
        }

        async fn find_by_stripe_customer_id(
            &self,
            _customer_id: &str,
        ) -> Result<Option<User>, DomainError> {
            Err(DomainError::database("Simulated outage"))
        }

        async fn insert_if_absent(&self, _user: &User) -> Result<User, DomainError> {
            Err(DomainError::database("Simulated outage"))
        }

        async fn add_credits(
            &self,
            _external_id: &ExternalUserId,
            _amount: i64,
        ) -> Result<Option<User>, DomainError> {
            Err(DomainError::database("Simulated outage"))
        }

        async fn try_debit_credits(
            &self,
            _user_id: &UserId,
            _cost: i64,
        ) -> Result<Option<i64>, DomainError> {
            Err(DomainError::database("Simulated outage"))
        }

        async fn update_billing(
            &self,
            _user_id: &UserId,
            _link: &BillingLink,
        ) -> Result<(), DomainError> {
            Err(DomainError::database("Simulated outage"))
        }

        async fn list(&self, _limit: i64) -> Result<Vec<User>, DomainError> {
            Err(DomainError::database("Simulated outage"))
        }
    }

    fn external(id: &str) -> ExternalUserId {
        ExternalUserId::new(id).unwrap()
    }

    fn handler_with(email: Option<&str>) -> IsAdminHandler {
        let store = Arc::new(InMemoryStore::new());
        store.put_user(User::new(external("user_1"), email.map(String::from), 10));
        IsAdminHandler::new(store, Arc::new(AdminAllowList::default()))
    }

    async fn check(handler: &IsAdminHandler, id: Option<&str>) -> bool {
        handler
            .handle(IsAdminQuery {
                external_id: id.map(external),
            })
            .await
    }

    #[tokio::test]
    async fn listed_email_is_admin_ignoring_case() {
        let handler = handler_with(Some("  Founder@Ziq.AI "));
        assert!(check(&handler, Some("user_1")).await);
    }

    #[tokio::test]
    async fn unlisted_email_is_not_admin() {
        let handler = handler_with(Some("someone@example.com"));
        assert!(!check(&handler, Some("user_1")).await);
    }

    #[tokio::test]
    async fn missing_email_is_not_admin() {
        let handler = handler_with(None);
        assert!(!check(&handler, Some("user_1")).await);
    }

    #[tokio::test]
    async fn anonymous_and_unknown_callers_are_not_admin() {
        let handler = handler_with(Some("admin@ziq.ai"));
        assert!(!check(&handler, None).await);
        assert!(!check(&handler, Some("ghost")).await);
    }

    #[tokio::test]
    async fn lookup_failure_is_not_admin() {
        let handler = IsAdminHandler::new(Arc::new(BrokenUsers), Arc::new(AdminAllowList::default()));
        assert!(!check(&handler, Some("user_1")).await);
    }
}

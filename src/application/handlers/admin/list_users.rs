//! ListUsersHandler - Admin-only query over all user accounts.

use std::sync::Arc;

use super::{IsAdminHandler, IsAdminQuery};
use crate::domain::account::User;
use crate::domain::foundation::{DomainError, ErrorCode, ExternalUserId};
use crate::ports::UserRepository;

/// Most accounts returned by one listing.
pub const USER_LIST_LIMIT: i64 = 200;

/// Query for the account listing.
#[derive(Debug, Clone)]
pub struct ListUsersQuery {
    /// `None` for anonymous callers, who are refused like non-admins.
    pub external_id: Option<ExternalUserId>,
}

/// Handler for the admin user listing, newest accounts first.
pub struct ListUsersHandler {
    gate: IsAdminHandler,
    users: Arc<dyn UserRepository>,
}

impl ListUsersHandler {
    pub fn new(gate: IsAdminHandler, users: Arc<dyn UserRepository>) -> Self {
        Self { gate, users }
    }

    pub async fn handle(&self, query: ListUsersQuery) -> Result<Vec<User>, DomainError> {
        let is_admin = self
            .gate
            .handle(IsAdminQuery {
                external_id: query.external_id,
            })
            .await;
        if !is_admin {
            return Err(DomainError::new(ErrorCode::Forbidden, "Admin access required"));
        }

        self.users.list(USER_LIST_LIMIT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::admin::AdminAllowList;

    fn external(id: &str) -> ExternalUserId {
        ExternalUserId::new(id).unwrap()
    }

    fn handler() -> ListUsersHandler {
        let store = Arc::new(InMemoryStore::new());
        store.put_user(User::new(external("admin"), Some("admin@ziq.ai".into()), 10));
        store.put_user(User::new(external("user_1"), Some("u@example.com".into()), 10));
        let gate = IsAdminHandler::new(store.clone(), Arc::new(AdminAllowList::default()));
        ListUsersHandler::new(gate, store)
    }

    #[tokio::test]
    async fn admin_sees_all_users() {
        let users = handler()
            .handle(ListUsersQuery {
                external_id: Some(external("admin")),
            })
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn non_admin_and_anonymous_are_forbidden() {
        let handler = handler();
        for external_id in [Some(external("user_1")), None] {
            let err = handler
                .handle(ListUsersQuery { external_id })
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::Forbidden);
        }
    }
}

//! ListHistoryHandler - Query handler for a user's search history.

use std::sync::Arc;

use crate::domain::account::Search;
use crate::domain::foundation::{DomainError, ErrorCode, ExternalUserId};
use crate::ports::{SearchRepository, UserRepository};

/// Most rows a single history request returns.
pub const HISTORY_LIMIT: i64 = 100;

/// Query for the caller's searches.
#[derive(Debug, Clone)]
pub struct ListHistoryQuery {
    pub external_id: ExternalUserId,
}

/// Result: searches, newest first.
pub type ListHistoryResult = Vec<Search>;

/// Handler for listing search history.
///
/// Unlike the credit endpoints this never creates the user row; an unknown
/// caller is `UserNotFound`.
pub struct ListHistoryHandler {
    users: Arc<dyn UserRepository>,
    searches: Arc<dyn SearchRepository>,
}

impl ListHistoryHandler {
    pub fn new(users: Arc<dyn UserRepository>, searches: Arc<dyn SearchRepository>) -> Self {
        Self { users, searches }
    }

    pub async fn handle(&self, query: ListHistoryQuery) -> Result<ListHistoryResult, DomainError> {
        let user = self
            .users
            .find_by_external_id(&query.external_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "User not found"))?;

        self.searches.list_for_user(&user.id, HISTORY_LIMIT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::account::User;

    fn external(id: &str) -> ExternalUserId {
        ExternalUserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn returns_searches_newest_first() {
        let store = Arc::new(InMemoryStore::new());
        let user = User::new(external("user_1"), None, 10);
        store.put_user(user.clone());

        let base = crate::domain::foundation::Timestamp::now();
        for (query, offset) in [("first", -300), ("third", -10), ("second", -100)] {
            let mut search = Search::new(user.id, query, None).unwrap();
            search.created_at = base.add_secs(offset);
            store.put_search(search);
        }

        let handler = ListHistoryHandler::new(store.clone(), store);
        let searches = handler
            .handle(ListHistoryQuery {
                external_id: external("user_1"),
            })
            .await
            .unwrap();

        let queries: Vec<&str> = searches.iter().map(|s| s.query.as_str()).collect();
        assert_eq!(queries, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn excludes_other_users_searches() {
        let store = Arc::new(InMemoryStore::new());
        let mine = User::new(external("user_1"), None, 10);
        let theirs = User::new(external("user_2"), None, 10);
        store.put_user(mine.clone());
        store.put_user(theirs.clone());
        store.put_search(Search::new(theirs.id, "not mine", None).unwrap());

        let handler = ListHistoryHandler::new(store.clone(), store);
        let searches = handler
            .handle(ListHistoryQuery {
                external_id: external("user_1"),
            })
            .await
            .unwrap();

        assert!(searches.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let handler = ListHistoryHandler::new(store.clone(), store);

        let err = handler
            .handle(ListHistoryQuery {
                external_id: external("ghost"),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::UserNotFound);
    }
}

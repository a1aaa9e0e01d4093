//! Search history entries.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SearchId, Timestamp, UserId, ValidationError};

/// Longest query text accepted, in characters.
pub const MAX_QUERY_LEN: usize = 2000;

/// A search issued by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub id: SearchId,
    pub user_id: UserId,
    pub query: String,
    /// Groups follow-up searches of one session together.
    pub group_id: Option<String>,
    pub created_at: Timestamp,
}

impl Search {
    /// Creates a search, trimming the query and dropping a blank group id.
    pub fn new(
        user_id: UserId,
        query: impl Into<String>,
        group_id: Option<String>,
    ) -> Result<Self, ValidationError> {
        let query = query.into().trim().to_string();
        if query.is_empty() {
            return Err(ValidationError::empty_field("query"));
        }
        let len = query.chars().count();
        if len > MAX_QUERY_LEN {
            return Err(ValidationError::out_of_range(
                "query",
                1,
                MAX_QUERY_LEN as i64,
                len as i64,
            ));
        }

        Ok(Self {
            id: SearchId::new(),
            user_id,
            query,
            group_id: group_id
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty()),
            created_at: Timestamp::now(),
        })
    }
}

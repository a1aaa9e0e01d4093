//! PostgreSQL implementation of SearchRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::Search;
use crate::domain::foundation::{DomainError, SearchId, Timestamp, UserId};
use crate::ports::SearchRepository;

pub struct PostgresSearchRepository {
    pool: PgPool,
}

impl PostgresSearchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SearchRow {
    id: Uuid,
    user_id: Uuid,
    query: String,
    group_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SearchRow> for Search {
    fn from(row: SearchRow) -> Self {
        Search {
            id: SearchId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            query: row.query,
            group_id: row.group_id,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl SearchRepository for PostgresSearchRepository {
    async fn record(&self, search: &Search) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO searches (id, user_id, query, group_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(search.id.as_uuid())
        .bind(search.user_id.as_uuid())
        .bind(&search.query)
        .bind(&search.group_id)
        .bind(search.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record search: {}", e)))?;

        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Search>, DomainError> {
        // id breaks ties so equal timestamps still come back in a stable order
        let rows: Vec<SearchRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, query, group_id, created_at
            FROM searches
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list searches: {}", e)))?;

        Ok(rows.into_iter().map(Search::from).collect())
    }
}

//! PostgreSQL implementation of UserRepository.
//!
//! Credit changes are single `UPDATE ... RETURNING` statements so concurrent
//! grants and debits never lose an update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::{BillingLink, User};
use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::{
    DomainError, ErrorCode, ExternalUserId, Timestamp, UserId,
};
use crate::ports::UserRepository;

const USER_COLUMNS: &str = "id, external_id, email, credits, tier_id, stripe_customer_id, \
     stripe_subscription_id, stripe_subscription_status, created_at, updated_at";

/// PostgreSQL implementation of the UserRepository port.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    external_id: String,
    email: Option<String>,
    credits: i64,
    tier_id: Option<String>,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    stripe_subscription_status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let stripe_subscription_status = row
            .stripe_subscription_status
            .as_deref()
            .map(|s| {
                SubscriptionStatus::parse(s).ok_or_else(|| {
                    DomainError::database(format!("Invalid subscription status value: {}", s))
                })
            })
            .transpose()?;

        Ok(User {
            id: UserId::from_uuid(row.id),
            external_id: ExternalUserId::new(row.external_id)
                .map_err(|e| DomainError::database(format!("Invalid external_id: {}", e)))?,
            email: row.email,
            credits: row.credits,
            tier_id: row.tier_id,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_subscription_status,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE external_id = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(external_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find user", e))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!(
            "SELECT {} FROM users WHERE stripe_customer_id = $1",
            USER_COLUMNS
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find user by customer", e))?;

        row.map(User::try_from).transpose()
    }

    async fn insert_if_absent(&self, user: &User) -> Result<User, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, external_id, email, credits, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (external_id) DO UPDATE
                SET email = COALESCE(users.email, EXCLUDED.email)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(user.id.as_uuid())
            .bind(user.external_id.as_str())
            .bind(&user.email)
            .bind(user.credits)
            .bind(user.created_at.as_datetime())
            .bind(user.updated_at.as_datetime())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to create user", e))?;

        User::try_from(row)
    }

    async fn add_credits(
        &self,
        external_id: &ExternalUserId,
        amount: i64,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!(
            r#"
            UPDATE users
            SET credits = credits + $2, updated_at = NOW()
            WHERE external_id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(external_id.as_str())
            .bind(amount)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to add credits", e))?;

        row.map(User::try_from).transpose()
    }

    async fn try_debit_credits(
        &self,
        user_id: &UserId,
        cost: i64,
    ) -> Result<Option<i64>, DomainError> {
        sqlx::query_scalar(
            r#"
            UPDATE users
            SET credits = credits - $2, updated_at = NOW()
            WHERE id = $1 AND credits >= $2
            RETURNING credits
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(cost)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to debit credits", e))
    }

    async fn update_billing(
        &self,
        user_id: &UserId,
        link: &BillingLink,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                stripe_customer_id = $2,
                stripe_subscription_id = $3,
                stripe_subscription_status = $4,
                tier_id = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&link.stripe_customer_id)
        .bind(&link.stripe_subscription_id)
        .bind(link.stripe_subscription_status.map(|s| s.as_str()))
        .bind(&link.tier_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update billing", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::UserNotFound, "User not found"));
        }
        Ok(())
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1",
            USER_COLUMNS
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list users", e))?;

        rows.into_iter().map(User::try_from).collect()
    }
}

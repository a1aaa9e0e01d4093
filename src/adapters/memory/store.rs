//! In-memory implementation of every persistence port.
//!
//! A single mutex guards all tables, so each port call is atomic in the
//! same way the single-statement SQL in the PostgreSQL adapters is.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::account::{BillingLink, Search, User};
use crate::domain::billing::{Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, ExternalUserId, Timestamp, UserId};
use crate::ports::{
    SaveResult, SearchRepository, SubscriptionRepository, UserRepository, WebhookEventStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    searches: Vec<Search>,
    subscriptions: HashMap<String, Subscription>,
    webhook_events: HashSet<String>,
}

impl Tables {
    fn user_by_external_id_mut(&mut self, external_id: &ExternalUserId) -> Option<&mut User> {
        self.users
            .values_mut()
            .find(|u| &u.external_id == external_id)
    }
}

/// In-memory store for tests and local runs.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let users: Arc<dyn UserRepository> = store.clone();
/// let searches: Arc<dyn SearchRepository> = store.clone();
/// ```
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Test Helpers ===

    /// Inserts or replaces a user row as-is.
    pub fn put_user(&self, user: User) {
        self.tables().users.insert(user.id, user);
    }

    /// Inserts or replaces a subscription row as-is.
    pub fn put_subscription(&self, subscription: Subscription) {
        self.tables()
            .subscriptions
            .insert(subscription.stripe_subscription_id.clone(), subscription);
    }

    /// Inserts a search row as-is.
    pub fn put_search(&self, search: Search) {
        self.tables().searches.push(search);
    }

    /// Snapshot of the user with this external id.
    pub fn user(&self, external_id: &str) -> Option<User> {
        self.tables()
            .users
            .values()
            .find(|u| u.external_id.as_str() == external_id)
            .cloned()
    }

    pub fn search_count(&self) -> usize {
        self.tables().searches.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.tables().subscriptions.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<User>, DomainError> {
        Ok(self.user(external_id.as_str()))
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, DomainError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn insert_if_absent(&self, user: &User) -> Result<User, DomainError> {
        let mut tables = self.tables();
        if let Some(existing) = tables.user_by_external_id_mut(&user.external_id) {
            if existing.email.is_none() {
                existing.email = user.email.clone();
            }
            return Ok(existing.clone());
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn add_credits(
        &self,
        external_id: &ExternalUserId,
        amount: i64,
    ) -> Result<Option<User>, DomainError> {
        let mut tables = self.tables();
        Ok(tables.user_by_external_id_mut(external_id).map(|user| {
            user.credits += amount;
            user.updated_at = Timestamp::now();
            user.clone()
        }))
    }

    async fn try_debit_credits(
        &self,
        user_id: &UserId,
        cost: i64,
    ) -> Result<Option<i64>, DomainError> {
        let mut tables = self.tables();
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "User not found"))?;

        if user.credits < cost {
            return Ok(None);
        }
        user.credits -= cost;
        user.updated_at = Timestamp::now();
        Ok(Some(user.credits))
    }

    async fn update_billing(
        &self,
        user_id: &UserId,
        link: &BillingLink,
    ) -> Result<(), DomainError> {
        let mut tables = self.tables();
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "User not found"))?;

        user.stripe_customer_id = link.stripe_customer_id.clone();
        user.stripe_subscription_id = link.stripe_subscription_id.clone();
        user.stripe_subscription_status = link.stripe_subscription_status;
        user.tier_id = link.tier_id.clone();
        user.updated_at = Timestamp::now();
        Ok(())
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, DomainError> {
        let mut users: Vec<User> = self.tables().users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }
}

#[async_trait]
impl SearchRepository for InMemoryStore {
    async fn record(&self, search: &Search) -> Result<(), DomainError> {
        self.tables().searches.push(search.clone());
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Search>, DomainError> {
        let mut searches: Vec<Search> = self
            .tables()
            .searches
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        searches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        searches.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(searches)
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn find_latest_active(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .tables()
            .subscriptions
            .values()
            .filter(|s| &s.user_id == user_id && s.status == SubscriptionStatus::Active)
            .max_by_key(|s| s.current_period_end)
            .cloned())
    }

    async fn find_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .tables()
            .subscriptions
            .get(stripe_subscription_id)
            .cloned())
    }

    async fn upsert(&self, subscription: &Subscription) -> Result<Subscription, DomainError> {
        let mut tables = self.tables();
        let stored = match tables
            .subscriptions
            .get(&subscription.stripe_subscription_id)
        {
            Some(existing) => Subscription {
                id: existing.id,
                created_at: existing.created_at,
                ..subscription.clone()
            },
            None => subscription.clone(),
        };
        tables
            .subscriptions
            .insert(stored.stripe_subscription_id.clone(), stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl WebhookEventStore for InMemoryStore {
    async fn claim(&self, event_id: &str, _event_type: &str) -> Result<SaveResult, DomainError> {
        if self.tables().webhook_events.insert(event_id.to_string()) {
            Ok(SaveResult::Inserted)
        } else {
            Ok(SaveResult::AlreadyExists)
        }
    }

    async fn release(&self, event_id: &str) -> Result<(), DomainError> {
        self.tables().webhook_events.remove(event_id);
        Ok(())
    }
}

//! Mock authentication adapters for testing.
//!
//! These adapters implement the `SessionValidator` and `IdentityProvider`
//! ports without talking to Clerk.
//!
//! # Example
//!
//! ```ignore
//! use ziq::adapters::auth::MockSessionValidator;
//!
//! let validator = MockSessionValidator::new().with_test_user("valid-token", "user_123");
//! let result = validator.validate("valid-token").await;
//! assert!(result.is_ok());
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, ExternalUserId};
use crate::ports::{IdentityProvider, SessionValidator};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock session validator.
///
/// Stores a map of tokens to users. Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: Mutex<HashMap<String, AuthenticatedUser>>,
    /// Returned for every validation when set.
    force_error: Mutex<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a user.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Adds a valid token for a user with a derived test email.
    ///
    /// An empty `user_id` is ignored.
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let Ok(id) = ExternalUserId::new(user_id.clone()) else {
            return self;
        };
        let user = AuthenticatedUser::new(id, Some(format!("{}@test.example.com", user_id)));
        self.with_user(token, user)
    }

    /// Forces all validations to return `error`.
    pub fn with_error(self, error: AuthError) -> Self {
        *lock(&self.force_error) = Some(error);
        self
    }

    /// Registers a valid token at runtime.
    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        lock(&self.tokens).insert(token.into(), user);
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = lock(&self.force_error).clone() {
            return Err(error);
        }

        lock(&self.tokens)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

/// Mock identity provider.
///
/// Unknown ids resolve to `Ok(None)` so tests can create users without
/// registering every profile.
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    emails: Mutex<HashMap<String, String>>,
    force_error: Mutex<Option<AuthError>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the primary email of `user_id`.
    pub fn with_email(self, user_id: impl Into<String>, email: impl Into<String>) -> Self {
        lock(&self.emails).insert(user_id.into(), email.into());
        self
    }

    /// Forces all lookups to return `error`.
    pub fn with_error(self, error: AuthError) -> Self {
        *lock(&self.force_error) = Some(error);
        self
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn primary_email(&self, user_id: &ExternalUserId) -> Result<Option<String>, AuthError> {
        if let Some(error) = lock(&self.force_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.emails).get(user_id.as_str()).cloned())
    }
}

//! Identity provider port for profile lookups.
//!
//! # When to Use
//!
//! - **SessionValidator**: validating incoming requests
//! - **IdentityProvider**: fetching profile data the session token lacks
//!
//! Clerk session tokens carry the user id but usually not the email, so the
//! account handlers call this port once, when the user row is first created.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, ExternalUserId};

/// Retrieves user profile information from the identity provider.
///
/// # Contract
///
/// - `Ok(None)` when the user exists but has no primary email
/// - `Err(AuthError::UserNotFound)` if the user does not exist
/// - `Err(AuthError::ServiceUnavailable)` for transient errors
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Primary email address of `user_id`.
    async fn primary_email(&self, user_id: &ExternalUserId) -> Result<Option<String>, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn IdentityProvider) {}
    }
}

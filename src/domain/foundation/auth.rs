//! Authentication types for the domain layer.
//!
//! These types represent the caller resolved from a session token. They have
//! **no external dependencies** - the Clerk adapter (or a mock in tests)
//! populates them via the `SessionValidator` port.
//!
//! Clerk session tokens do not carry an email claim unless the instance is
//! configured with a custom session template, so `email` is optional here.
//! When a user row has to be created without it, the `IdentityProvider` port
//! resolves the address.

use super::ExternalUserId;
use thiserror::Error;

/// Caller extracted from a validated session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the identity provider.
    pub id: ExternalUserId,

    /// Email address, when present in the token or resolved from the provider.
    pub email: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(id: ExternalUserId, email: Option<String>) -> Self {
        Self { id, email }
    }
}

/// Authentication errors that can occur during token validation.
///
/// These errors are **domain-centric** - they describe what went wrong
/// from the application's perspective, not the identity provider's.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// Token is valid but the user no longer exists in the identity provider.
    #[error("User not found")]
    UserNotFound,

    /// The identity provider is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}

//! Session validation port.
//!
//! Resolves the caller behind a session token. Implementations exist for
//! Clerk and for tests; the HTTP middleware depends only on this trait.
//!
//! All implementations MUST validate:
//! - **Signature** against the provider's published keys
//! - **Issuer (iss)**: Token must come from the configured instance
//! - **Expiry (exp)**: Token must not be expired

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates session tokens and extracts user identity.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw session token (without "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

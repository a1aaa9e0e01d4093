//! Authentication middleware and extractors for axum.
//!
//! This module provides:
//! - `auth_middleware` - Layer that validates the session token and injects the caller into extensions
//! - `RequireAuth` - Extractor that requires authentication
//! - `OptionalAuth` - Extractor for optional authentication
//!
//! # Architecture
//!
//! The middleware uses the `SessionValidator` port, keeping it provider-agnostic.
//! Clerk in production and a mock in tests plug in the same way.
//!
//! ```text
//! Request → auth_middleware → injects AuthenticatedUser into extensions
//!                                      ↓
//!                              Handler → RequireAuth extractor reads from extensions
//! ```
//!
//! A token that fails validation leaves the request anonymous instead of
//! rejecting it here. Public routes such as `/api/checkauth` still answer, and
//! protected routes reject through `RequireAuth`.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::adapters::http::error::ErrorResponse;
use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Auth middleware state - wraps the session validator.
pub type AuthState = Arc<dyn SessionValidator>;

/// Name of the cookie Clerk's frontend SDK stores the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Authentication middleware.
///
/// 1. Reads the token from `Authorization: Bearer <token>`, falling back to
///    the `__session` cookie
/// 2. Validates it using the `SessionValidator` port
/// 3. On success, injects `AuthenticatedUser` into request extensions
/// 4. Otherwise continues without a caller
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers()) {
        match validator.validate(&token).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(AuthError::ServiceUnavailable(msg)) => {
                error!(error = %msg, "Session validation unavailable");
            }
            Err(e) => {
                warn!(error = %e, path = %request.uri().path(), "Rejected session token");
            }
        }
    }

    next.run(request).await
}

/// Extracts the session token from the request headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Extractor that requires authentication.
///
/// If no caller is in the request extensions, returns 401 Unauthorized.
///
/// # Example
///
/// ```ignore
/// async fn my_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Extractor for optional authentication.
///
/// Returns `None` if no valid token was provided, `Some(user)` otherwise.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    /// No valid session token was provided.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("UNAUTHORIZED", "Authentication required")),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::domain::foundation::ExternalUserId;
    use axum::http::HeaderValue;

    fn test_user() -> AuthenticatedUser {
        AuthenticatedUser::new(
            ExternalUserId::new("user_123").unwrap(),
            Some("test@example.com".to_string()),
        )
    }

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Token Extraction Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn bearer_token_is_extracted() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer my-token")]);
        assert_eq!(session_token(&map).as_deref(), Some("my-token"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(session_token(&map), None);
    }

    #[test]
    fn session_cookie_is_extracted() {
        let map = headers(&[(header::COOKIE, "theme=dark; __session=cookie-token; other=1")]);
        assert_eq!(session_token(&map).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer header-token"),
            (header::COOKIE, "__session=cookie-token"),
        ]);
        assert_eq!(session_token(&map).as_deref(), Some("header-token"));
    }

    #[test]
    fn similarly_named_cookie_is_ignored() {
        let map = headers(&[(header::COOKIE, "__session_abc=x; __client=y")]);
        assert_eq!(session_token(&map), None);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // SessionValidator Tests (indirect via MockSessionValidator)
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn validator_returns_user_for_valid_token() {
        let validator: AuthState =
            Arc::new(MockSessionValidator::new().with_user("valid-token", test_user()));

        let user = validator.validate("valid-token").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("test@example.com"));
    }

    #[tokio::test]
    async fn validator_returns_error_for_invalid_token() {
        let validator: AuthState = Arc::new(MockSessionValidator::new());

        let result = validator.validate("invalid-token").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Extractor Tests
    // ════════════════════════════════════════════════════════════════════════════

    fn parts_with(user: Option<AuthenticatedUser>) -> Parts {
        let mut request = axum::http::Request::builder()
            .uri("/test")
            .body(())
            .unwrap();
        if let Some(user) = user {
            request.extensions_mut().insert(user);
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn require_auth_extracts_user_from_extensions() {
        let mut parts = parts_with(Some(test_user()));

        let RequireAuth(user) = RequireAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id.as_str(), "user_123");
    }

    #[tokio::test]
    async fn require_auth_fails_without_user() {
        let mut parts = parts_with(None);

        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthRejection::Unauthenticated)));
    }

    #[tokio::test]
    async fn optional_auth_reflects_extensions() {
        let mut with_user = parts_with(Some(test_user()));
        let mut without = parts_with(None);

        let OptionalAuth(present) = OptionalAuth::from_request_parts(&mut with_user, &())
            .await
            .unwrap();
        let OptionalAuth(absent) = OptionalAuth::from_request_parts(&mut without, &())
            .await
            .unwrap();

        assert!(present.is_some());
        assert!(absent.is_none());
    }

    #[test]
    fn auth_rejection_returns_401() {
        let response = AuthRejection::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

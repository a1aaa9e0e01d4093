//! HTTP middleware for axum.
//!
//! This module contains middleware layers for cross-cutting concerns:
//!
//! - `auth` - Session authentication middleware and extractors

pub mod auth;

pub use auth::{
    auth_middleware, session_token, AuthRejection, AuthState, OptionalAuth, RequireAuth,
    SESSION_COOKIE,
};

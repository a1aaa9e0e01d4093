//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` and `IdentityProvider` ports:
//!
//! - `clerk` - Production Clerk implementation (JWKS + Backend API)
//! - `mock` - Test implementations that don't require external services

mod clerk;
mod mock;

pub use clerk::{ClerkConfig, ClerkIdentityProvider, ClerkSessionValidator};
pub use mock::{MockIdentityProvider, MockSessionValidator};

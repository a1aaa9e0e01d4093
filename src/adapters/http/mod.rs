//! HTTP adapters - REST API implementations.
//!
//! Each feature area has its own module with DTOs, handlers and routes:
//! - `account` - Session check, credits, history and search
//! - `billing` - Subscription, Stripe checkout, portal and webhook
//! - `admin` - Admin gate and listings

pub mod account;
pub mod admin;
pub mod billing;
pub mod error;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use router::build_router;
pub use state::{AppSettings, AppState};

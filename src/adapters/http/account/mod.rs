//! HTTP adapter for account endpoints.
//!
//! - `GET /api/checkauth` - Whether the caller has a valid session
//! - `GET /api/credits` - Current credit balance
//! - `GET /api/credits/add` - Grant the manual credit amount
//! - `GET /api/history` - Search history, newest first
//! - `POST /api/search` - Record a search, charging its cost

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::account_routes;

//! HTTP adapter for admin endpoints.
//!
//! - `GET /api/admin/check` - `{isAdmin}` for the caller
//! - `GET /api/admin/list` - Admin allow-list (admins only)
//! - `GET /api/admin/users` - Account listing (admins only)

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::admin_routes;

//! Admin handlers.
//!
//! The gate itself never errors; the listing turns a negative answer into
//! `Forbidden`.

mod is_admin;
mod list_users;

pub use is_admin::{IsAdminHandler, IsAdminQuery};
pub use list_users::{ListUsersHandler, ListUsersQuery, USER_LIST_LIMIT};

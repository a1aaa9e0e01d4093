//! Account domain - users, their credit balance, and search history.

mod search;
mod user;

pub use search::{Search, MAX_QUERY_LEN};
pub use user::{BillingLink, User};

//! Account handlers.
//!
//! ## Commands
//! - Lazy user creation on first authenticated request
//! - Atomic credit grants
//! - Charged search recording
//!
//! ## Queries
//! - Search history

mod add_credits;
mod get_or_create_user;
mod list_history;
mod record_search;

// Commands
pub use add_credits::{AddCreditsCommand, AddCreditsHandler};
pub use get_or_create_user::{GetOrCreateUserCommand, GetOrCreateUserHandler};
pub use record_search::{RecordSearchCommand, RecordSearchHandler, RecordSearchResult};

// Queries
pub use list_history::{ListHistoryHandler, ListHistoryQuery, ListHistoryResult, HISTORY_LIMIT};

//! Admin domain - the allow-list that gates administrative endpoints.

mod allow_list;

pub use allow_list::{AdminAllowList, DEFAULT_ADMIN_EMAILS};

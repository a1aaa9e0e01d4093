//! Administrator configuration

use serde::Deserialize;

use crate::domain::admin::AdminAllowList;

/// Admin allow-list override
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Comma-separated emails; the built-in list applies when unset or empty
    pub emails: Option<String>,
}

impl AdminConfig {
    pub fn allow_list(&self) -> AdminAllowList {
        AdminAllowList::from_override(self.emails.as_deref())
    }
}

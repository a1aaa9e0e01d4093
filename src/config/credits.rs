//! Credit accounting configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Credit amounts
#[derive(Debug, Clone, Deserialize)]
pub struct CreditsConfig {
    /// Balance a new account starts with
    #[serde(default = "default_balance")]
    pub default_balance: i64,

    /// Amount granted by `/api/credits/add`
    #[serde(default = "default_manual_grant")]
    pub manual_grant: i64,

    /// Cost of one recorded search
    #[serde(default = "default_search_cost")]
    pub search_cost: i64,
}

impl CreditsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_balance < 0 {
            return Err(ValidationError::InvalidCreditAmount("default_balance"));
        }
        if self.manual_grant <= 0 {
            return Err(ValidationError::InvalidCreditAmount("manual_grant"));
        }
        if self.search_cost <= 0 {
            return Err(ValidationError::InvalidCreditAmount("search_cost"));
        }
        Ok(())
    }
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            default_balance: default_balance(),
            manual_grant: default_manual_grant(),
            search_cost: default_search_cost(),
        }
    }
}

fn default_balance() -> i64 {
    10
}

fn default_manual_grant() -> i64 {
    30
}

fn default_search_cost() -> i64 {
    1
}

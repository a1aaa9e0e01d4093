//! Subscription fallback configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::billing::{FallbackPolicy, PRO_TIER_ID};

/// How `/api/subscription` answers for accounts with no stored subscription row
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Days until the synthesized period end
    #[serde(default = "default_fallback_period_days")]
    pub fallback_period_days: i64,

    /// Tier reported when the account has none
    #[serde(default = "default_fallback_tier_id")]
    pub fallback_tier_id: String,
}

impl BillingConfig {
    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy {
            period_days: self.fallback_period_days,
            default_tier_id: self.fallback_tier_id.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=366).contains(&self.fallback_period_days) {
            return Err(ValidationError::InvalidFallbackPeriod);
        }
        if self.fallback_tier_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("FALLBACK_TIER_ID"));
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            fallback_period_days: default_fallback_period_days(),
            fallback_tier_id: default_fallback_tier_id(),
        }
    }
}

fn default_fallback_period_days() -> i64 {
    30
}

fn default_fallback_tier_id() -> String {
    PRO_TIER_ID.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_defaults() {
        assert_eq!(BillingConfig::default().fallback_policy(), FallbackPolicy::default());
    }

    #[test]
    fn test_period_out_of_range() {
        for days in [0, 400] {
            let config = BillingConfig {
                fallback_period_days: days,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidFallbackPeriod));
        }
    }
}

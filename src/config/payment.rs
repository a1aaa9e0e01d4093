//! Payment configuration

use serde::Deserialize;
use std::fmt;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Stripe price ID for the basic plan
    pub stripe_basic_price_id: Option<String>,

    /// Stripe price ID for the pro plan
    pub stripe_pro_price_id: Option<String>,

    /// Public frontend URL checkout and portal pages return to
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

impl PaymentConfig {
    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if !self.app_url.starts_with("http://") && !self.app_url.starts_with("https://") {
            return Err(ValidationError::InvalidAppUrl(self.app_url.clone()));
        }

        Ok(())
    }
}

impl fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("live_mode", &self.is_live_mode())
            .field("stripe_basic_price_id", &self.stripe_basic_price_id)
            .field("stripe_pro_price_id", &self.stripe_pro_price_id)
            .field("app_url", &self.app_url)
            .finish_non_exhaustive()
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_basic_price_id: None,
            stripe_pro_price_id: None,
            app_url: default_app_url(),
        }
    }
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

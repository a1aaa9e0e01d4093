//! Application configuration module
//!
//! Configuration is loaded from environment variables using the `config` and
//! `dotenvy` crates, with the `ZIQ` prefix and `__` separating nested values.
//!
//! # Example
//!
//! ```no_run
//! use ziq::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod admin;
mod auth;
mod billing;
mod credits;
mod database;
mod error;
mod payment;
mod server;

pub use admin::AdminConfig;
pub use auth::AuthConfig;
pub use billing::BillingConfig;
pub use credits::CreditsConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Authentication configuration (Clerk)
    pub auth: AuthConfig,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,

    /// Credit amounts
    #[serde(default)]
    pub credits: CreditsConfig,

    /// Subscription fallback behavior
    #[serde(default)]
    pub billing: BillingConfig,

    /// Admin allow-list override
    #[serde(default)]
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads variables such as
    /// `ZIQ__SERVER__PORT=8080` (-> `server.port`) or
    /// `ZIQ__AUTH__CLERK_ISSUER=...` (-> `auth.clerk_issuer`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or a value
    /// cannot be parsed into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("ZIQ").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.payment.validate()?;
        self.credits.validate()?;
        self.billing.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "ZIQ__DATABASE__URL",
        "ZIQ__AUTH__CLERK_ISSUER",
        "ZIQ__AUTH__CLERK_SECRET_KEY",
        "ZIQ__PAYMENT__STRIPE_API_KEY",
        "ZIQ__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "ZIQ__SERVER__PORT",
        "ZIQ__SERVER__ENVIRONMENT",
        "ZIQ__CREDITS__MANUAL_GRANT",
        "ZIQ__ADMIN__EMAILS",
    ];

    fn set_minimal_env() {
        env::set_var("ZIQ__DATABASE__URL", "postgresql://test@localhost/ziq");
        env::set_var("ZIQ__AUTH__CLERK_ISSUER", "https://clerk.example.com");
        env::set_var("ZIQ__AUTH__CLERK_SECRET_KEY", "sk_test_clerk");
        env::set_var("ZIQ__PAYMENT__STRIPE_API_KEY", "sk_test_xxx");
        env::set_var("ZIQ__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.database.url, "postgresql://test@localhost/ziq");
        assert_eq!(config.auth.clerk_issuer, "https://clerk.example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_section_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.credits.default_balance, 10);
        assert_eq!(config.credits.manual_grant, 30);
        assert_eq!(config.billing.fallback_period_days, 30);
        assert_eq!(config.payment.app_url, "http://localhost:3000");
        assert!(config.admin.emails.is_none());
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("ZIQ__SERVER__PORT", "3000"),
            ("ZIQ__SERVER__ENVIRONMENT", "production"),
            ("ZIQ__CREDITS__MANUAL_GRANT", "50"),
            ("ZIQ__ADMIN__EMAILS", "ops@example.com"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.credits.manual_grant, 50);
        assert!(config.admin.allow_list().contains("ops@example.com"));
    }

    #[test]
    fn test_missing_required_section_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::remove_var("ZIQ__DATABASE__URL");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}

//! Authentication configuration

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Authentication configuration (Clerk)
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Clerk Frontend API URL, used as JWT issuer and JWKS host
    pub clerk_issuer: String,

    /// Clerk Backend API secret key
    pub clerk_secret_key: String,

    /// Clerk Backend API base URL
    #[serde(default = "default_clerk_api_url")]
    pub clerk_api_url: String,

    /// Origins accepted in the `azp` claim (comma-separated)
    pub authorized_parties: Option<String>,

    /// JWKS cache TTL in seconds
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

impl AuthConfig {
    /// Get JWKS cache TTL as Duration
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    pub fn authorized_parties_list(&self) -> Vec<String> {
        self.authorized_parties
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|p| p.trim().trim_end_matches('/').to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate authentication configuration
    ///
    /// In production, requires HTTPS for the issuer URL.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.clerk_issuer.is_empty() {
            return Err(ValidationError::MissingRequired("CLERK_ISSUER"));
        }
        if self.clerk_secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("CLERK_SECRET_KEY"));
        }
        if !self.clerk_secret_key.starts_with("sk_") {
            return Err(ValidationError::InvalidClerkKey);
        }

        if *environment == Environment::Production && !self.clerk_issuer.starts_with("https://") {
            return Err(ValidationError::IssuerMustBeHttps);
        }

        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("clerk_issuer", &self.clerk_issuer)
            .field("clerk_api_url", &self.clerk_api_url)
            .field("authorized_parties", &self.authorized_parties)
            .field("jwks_cache_ttl_secs", &self.jwks_cache_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            clerk_issuer: String::new(),
            clerk_secret_key: String::new(),
            clerk_api_url: default_clerk_api_url(),
            authorized_parties: None,
            jwks_cache_ttl_secs: default_jwks_cache_ttl(),
        }
    }
}

fn default_clerk_api_url() -> String {
    "https://api.clerk.com".to_string()
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AuthConfig {
        AuthConfig {
            clerk_issuer: "https://clerk.ziq.ai".to_string(),
            clerk_secret_key: "sk_test_abc".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.jwks_cache_ttl_secs, 3600);
        assert_eq!(config.clerk_api_url, "https://api.clerk.com");
    }

    #[test]
    fn test_validation_missing_issuer() {
        let config = AuthConfig::default();
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("CLERK_ISSUER"))
        );
    }

    #[test]
    fn test_validation_bad_secret_prefix() {
        let config = AuthConfig {
            clerk_secret_key: "pk_test_abc".to_string(),
            ..valid()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidClerkKey)
        );
    }

    #[test]
    fn test_validation_production_requires_https() {
        let config = AuthConfig {
            clerk_issuer: "http://localhost:4000".to_string(),
            ..valid()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::IssuerMustBeHttps)
        );
    }

    #[test]
    fn test_authorized_parties_parsing() {
        let config = AuthConfig {
            authorized_parties: Some("https://ziq.ai/, https://www.ziq.ai,".to_string()),
            ..valid()
        };
        assert_eq!(
            config.authorized_parties_list(),
            vec!["https://ziq.ai", "https://www.ziq.ai"]
        );
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("sk_test_abc"));
    }
}

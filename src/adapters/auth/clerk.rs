//! Clerk adapters for session validation and profile lookups.
//!
//! `ClerkSessionValidator` implements `SessionValidator` by validating Clerk
//! session JWTs locally:
//!
//! 1. Fetching the instance JWKS from `{issuer}/.well-known/jwks.json`
//! 2. Validating the JWT signature against the public keys
//! 3. Validating issuer and expiry, and `azp` when authorized parties are set
//! 4. Mapping claims to the domain `AuthenticatedUser` type
//!
//! `ClerkIdentityProvider` implements `IdentityProvider` against the Clerk
//! Backend API, which is the only way to learn a user's email when the
//! session template does not include it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, TokenData, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::foundation::{AuthError, AuthenticatedUser, ExternalUserId};
use crate::ports::{IdentityProvider, SessionValidator};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum gap between refetches triggered by an unknown `kid`.
const MIN_FORCED_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for `ClerkSessionValidator`.
#[derive(Debug, Clone)]
pub struct ClerkConfig {
    /// The instance's Frontend API URL (e.g. "https://clerk.ziq.ai").
    /// Used for JWKS discovery and JWT issuer validation.
    pub issuer: String,

    /// Origins allowed in the `azp` claim. Empty disables the check.
    pub authorized_parties: Vec<String>,

    /// How long to cache JWKS before refetching.
    pub jwks_cache_duration: Duration,
}

impl ClerkConfig {
    /// Create a configuration with a one hour JWKS cache and no `azp` check.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            authorized_parties: Vec::new(),
            jwks_cache_duration: Duration::from_secs(3600),
        }
    }

    pub fn with_authorized_parties(mut self, parties: Vec<String>) -> Self {
        self.authorized_parties = parties;
        self
    }

    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.jwks_cache_duration = duration;
        self
    }

    fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer.trim_end_matches('/'))
    }

    fn authorizes(&self, azp: Option<&str>) -> bool {
        if self.authorized_parties.is_empty() {
            return true;
        }
        azp.is_some_and(|azp| self.authorized_parties.iter().any(|p| p == azp))
    }
}

/// Claims of a Clerk session token.
#[derive(Debug, Deserialize)]
struct ClerkClaims {
    /// Clerk user id (user_xxx)
    sub: String,

    iss: String,

    #[allow(dead_code)]
    exp: i64,

    /// Origin that requested the token
    #[serde(default)]
    azp: Option<String>,

    /// Present only with a custom session template
    #[serde(default)]
    email: Option<String>,
}

/// Cached JWKS with expiry tracking.
struct JwksCache {
    jwks: JwkSet,
    fetched_at: Instant,
    cache_duration: Duration,
}

impl JwksCache {
    fn new(jwks: JwkSet, cache_duration: Duration) -> Self {
        Self {
            jwks,
            fetched_at: Instant::now(),
            cache_duration,
        }
    }

    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > self.cache_duration
    }

    /// Whether the cached set can answer a lookup at `now`.
    ///
    /// A forced refresh is only honoured once the set is older than
    /// `MIN_FORCED_REFRESH_INTERVAL`, so tokens with made-up `kid`s cannot
    /// turn every request into a JWKS fetch.
    fn serves(&self, force_refresh: bool, now: Instant) -> bool {
        if self.is_expired() {
            return false;
        }
        !force_refresh || now.saturating_duration_since(self.fetched_at) < MIN_FORCED_REFRESH_INTERVAL
    }
}

/// Clerk session validator.
pub struct ClerkSessionValidator {
    config: ClerkConfig,
    http_client: reqwest::Client,
    jwks_cache: Arc<RwLock<Option<JwksCache>>>,
}

impl ClerkSessionValidator {
    /// Create a new validator.
    ///
    /// Keys are fetched lazily on first validation so startup never blocks
    /// on Clerk.
    pub fn new(config: ClerkConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            config,
            http_client,
            jwks_cache: Arc::new(RwLock::new(None)),
        })
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let url = self.config.jwks_url();

        tracing::debug!(url = %url, "fetching JWKS");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "failed to fetch JWKS");
            AuthError::service_unavailable(format!("Failed to fetch JWKS: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(%status, "JWKS endpoint returned an error");
            return Err(AuthError::service_unavailable(format!(
                "JWKS endpoint returned {}",
                status
            )));
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse JWKS");
            AuthError::service_unavailable(format!("Failed to parse JWKS: {}", e))
        })?;

        tracing::debug!(keys = jwks.keys.len(), "fetched JWKS");

        Ok(jwks)
    }

    /// Get JWKS, using the cache when it is still fresh.
    ///
    /// `force_refresh` bypasses the cache after a key rotation, at most once
    /// per `MIN_FORCED_REFRESH_INTERVAL`.
    async fn get_jwks(&self, force_refresh: bool) -> Result<JwkSet, AuthError> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.serves(force_refresh, Instant::now())) {
                return Ok(cached.jwks.clone());
            }
        }

        // Re-checked under the write lock so concurrent misses fetch once.
        let mut cache = self.jwks_cache.write().await;
        if let Some(cached) = cache.as_ref().filter(|c| c.serves(force_refresh, Instant::now())) {
            if force_refresh {
                tracing::debug!("JWKS refreshed recently, skipping refetch");
            }
            return Ok(cached.jwks.clone());
        }

        let jwks = self.fetch_jwks().await?;
        *cache = Some(JwksCache::new(jwks.clone(), self.config.jwks_cache_duration));

        Ok(jwks)
    }

    fn find_decoding_key(jwk_set: &JwkSet, kid: &str) -> Result<DecodingKey, AuthError> {
        let jwk = jwk_set.find(kid).ok_or(AuthError::InvalidToken)?;
        DecodingKey::from_jwk(jwk).map_err(|e| {
            tracing::warn!(error = %e, "failed to build decoding key");
            AuthError::InvalidToken
        })
    }

    fn validate_token(
        &self,
        token: &str,
        decoding_key: &DecodingKey,
    ) -> Result<TokenData<ClerkClaims>, AuthError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.config.issuer]);
        // Clerk session tokens carry no audience.
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<ClerkClaims>(token, decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer => {
                    tracing::warn!("invalid issuer in token");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::warn!(error = %e, "token validation failed");
                    AuthError::InvalidToken
                }
            }
        })
    }
}

#[async_trait]
impl SessionValidator for ClerkSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "failed to decode JWT header");
            AuthError::InvalidToken
        })?;

        if header.alg != Algorithm::RS256 {
            tracing::warn!(alg = ?header.alg, "unexpected JWT algorithm");
            return Err(AuthError::InvalidToken);
        }

        let kid = header.kid.ok_or_else(|| {
            tracing::warn!("JWT missing 'kid' header");
            AuthError::InvalidToken
        })?;

        let jwks = self.get_jwks(false).await?;
        let decoding_key = match Self::find_decoding_key(&jwks, &kid) {
            Ok(key) => key,
            Err(_) => {
                // Unknown kid: the instance may have rotated keys.
                let jwks = self.get_jwks(true).await?;
                Self::find_decoding_key(&jwks, &kid).map_err(|e| {
                    tracing::warn!(kid = %kid, "no matching key for kid");
                    e
                })?
            }
        };

        let claims = self.validate_token(token, &decoding_key)?.claims;

        if claims.iss != self.config.issuer {
            tracing::warn!(
                expected = %self.config.issuer,
                actual = %claims.iss,
                "issuer mismatch after validation"
            );
            return Err(AuthError::InvalidToken);
        }

        if !self.config.authorizes(claims.azp.as_deref()) {
            tracing::warn!(azp = ?claims.azp, "token from unauthorized party");
            return Err(AuthError::InvalidToken);
        }

        let user_id = ExternalUserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("token has an empty subject");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, claims.email))
    }
}

impl std::fmt::Debug for ClerkSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkSessionValidator")
            .field("issuer", &self.config.issuer)
            .field("authorized_parties", &self.config.authorized_parties)
            .finish_non_exhaustive()
    }
}

/// Response of `GET /v1/users/{id}`, reduced to what we read.
#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    id: String,
    email_address: String,
}

impl ClerkUser {
    /// The primary address, or the first one when none is marked primary.
    fn primary_email(self) -> Option<String> {
        let primary_id = self.primary_email_address_id;
        let mut addresses = self.email_addresses;
        let index = primary_id
            .and_then(|id| addresses.iter().position(|a| a.id == id))
            .unwrap_or(0);
        if index < addresses.len() {
            Some(addresses.swap_remove(index).email_address)
        } else {
            None
        }
    }
}

/// Clerk Backend API client.
pub struct ClerkIdentityProvider {
    api_url: String,
    secret_key: SecretString,
    http_client: reqwest::Client,
}

impl ClerkIdentityProvider {
    pub fn new(api_url: impl Into<String>, secret_key: SecretString) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            api_url: api_url.into(),
            secret_key,
            http_client,
        })
    }

    fn user_url(&self, user_id: &ExternalUserId) -> String {
        format!(
            "{}/v1/users/{}",
            self.api_url.trim_end_matches('/'),
            user_id.as_str()
        )
    }
}

#[async_trait]
impl IdentityProvider for ClerkIdentityProvider {
    async fn primary_email(&self, user_id: &ExternalUserId) -> Result<Option<String>, AuthError> {
        let response = self
            .http_client
            .get(self.user_url(user_id))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Clerk user lookup failed");
                AuthError::service_unavailable(e.to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AuthError::UserNotFound);
        }
        if !status.is_success() {
            tracing::error!(%status, user_id = %user_id, "Clerk user lookup returned an error");
            return Err(AuthError::service_unavailable(format!(
                "Clerk API returned {}",
                status
            )));
        }

        let user: ClerkUser = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Clerk user");
            AuthError::service_unavailable(e.to_string())
        })?;

        Ok(user.primary_email())
    }
}

impl std::fmt::Debug for ClerkIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkIdentityProvider")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn config_builds_correct_jwks_url() {
        let config = ClerkConfig::new("https://clerk.ziq.ai/");
        assert_eq!(config.jwks_url(), "https://clerk.ziq.ai/.well-known/jwks.json");
    }

    #[test]
    fn empty_authorized_parties_accept_anything() {
        let config = ClerkConfig::new("https://clerk.ziq.ai");
        assert!(config.authorizes(None));
        assert!(config.authorizes(Some("https://evil.example")));
    }

    #[test]
    fn authorized_parties_require_matching_azp() {
        let config = ClerkConfig::new("https://clerk.ziq.ai")
            .with_authorized_parties(vec!["https://ziq.ai".to_string()]);
        assert!(config.authorizes(Some("https://ziq.ai")));
        assert!(!config.authorizes(Some("https://evil.example")));
        assert!(!config.authorizes(None));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // JWKS Cache Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn jwks_cache_not_expired_initially() {
        let cache = JwksCache::new(JwkSet { keys: vec![] }, Duration::from_secs(3600));
        assert!(!cache.is_expired());
    }

    #[test]
    fn jwks_cache_expires_after_duration() {
        let cache = JwksCache::new(JwkSet { keys: vec![] }, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.is_expired());
    }

    #[test]
    fn forced_refresh_is_throttled() {
        let cache = JwksCache::new(JwkSet { keys: vec![] }, Duration::from_secs(3600));
        let fetched = cache.fetched_at;

        assert!(cache.serves(false, fetched + Duration::from_secs(1)));
        assert!(cache.serves(true, fetched + Duration::from_secs(1)));
        assert!(cache.serves(true, fetched + Duration::from_secs(59)));
        assert!(!cache.serves(true, fetched + MIN_FORCED_REFRESH_INTERVAL));
        assert!(!cache.serves(true, fetched + Duration::from_secs(600)));
    }

    #[test]
    fn expired_cache_never_serves() {
        let cache = JwksCache::new(JwkSet { keys: vec![] }, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(!cache.serves(false, Instant::now()));
        assert!(!cache.serves(true, Instant::now()));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_before_any_fetch() {
        let validator = ClerkSessionValidator::new(ClerkConfig::new("https://clerk.invalid")).unwrap();
        let result = validator.validate("not-a-jwt").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Backend API Parsing Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn primary_email_prefers_marked_address() {
        let user: ClerkUser = serde_json::from_value(serde_json::json!({
            "primary_email_address_id": "idn_2",
            "email_addresses": [
                {"id": "idn_1", "email_address": "old@example.com"},
                {"id": "idn_2", "email_address": "main@example.com"}
            ]
        }))
        .unwrap();
        assert_eq!(user.primary_email().as_deref(), Some("main@example.com"));
    }

    #[test]
    fn primary_email_falls_back_to_first() {
        let user: ClerkUser = serde_json::from_value(serde_json::json!({
            "email_addresses": [{"id": "idn_1", "email_address": "a@example.com"}]
        }))
        .unwrap();
        assert_eq!(user.primary_email().as_deref(), Some("a@example.com"));
    }

    #[test]
    fn no_addresses_means_no_email() {
        let user: ClerkUser = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(user.primary_email().is_none());
    }

    #[test]
    fn user_url_joins_api_base() {
        let provider =
            ClerkIdentityProvider::new("https://api.clerk.com/", SecretString::new("sk_test".into()))
                .unwrap();
        let id = ExternalUserId::new("user_abc").unwrap();
        assert_eq!(provider.user_url(&id), "https://api.clerk.com/v1/users/user_abc");
    }

    #[test]
    fn clerk_adapters_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClerkSessionValidator>();
        assert_send_sync::<ClerkIdentityProvider>();
    }

    #[tokio::test]
    #[ignore = "Requires a live Clerk instance"]
    async fn integration_test_fetch_jwks() {
        let issuer = std::env::var("ZIQ__AUTH__CLERK_ISSUER")
            .unwrap_or_else(|_| "https://clerk.ziq.ai".to_string());
        let validator = ClerkSessionValidator::new(ClerkConfig::new(issuer)).unwrap();

        let jwks = validator.fetch_jwks().await.unwrap();
        assert!(!jwks.keys.is_empty(), "JWKS should contain at least one key");
    }
}

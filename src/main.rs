//! Ziq API server entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use secrecy::SecretString;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ziq::adapters::auth::{ClerkConfig, ClerkIdentityProvider, ClerkSessionValidator};
use ziq::adapters::http::{build_router, AppSettings, AppState};
use ziq::adapters::postgres::{
    PostgresSearchRepository, PostgresSubscriptionRepository, PostgresUserRepository,
    PostgresWebhookEventStore,
};
use ziq::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use ziq::config::{AppConfig, ServerConfig};
use ziq::domain::billing::TierCatalog;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_tracing(&config.server);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.server.environment,
        "Starting Ziq API"
    );

    let pool = config
        .database
        .connect()
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(url = %config.database.redacted_url(), "Connected to PostgreSQL");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;
        info!("Database migrations applied");
    }

    let clerk = ClerkConfig::new(config.auth.clerk_issuer.clone())
        .with_authorized_parties(config.auth.authorized_parties_list())
        .with_cache_duration(config.auth.jwks_cache_ttl());
    let session_validator = ClerkSessionValidator::new(clerk)?;
    let identity = ClerkIdentityProvider::new(
        config.auth.clerk_api_url.clone(),
        SecretString::new(config.auth.clerk_secret_key.clone()),
    )?;

    let stripe = StripeConfig::new(
        SecretString::new(config.payment.stripe_api_key.clone()),
        SecretString::new(config.payment.stripe_webhook_secret.clone()),
    )
    .with_require_livemode(config.is_production() && config.payment.is_live_mode());

    let catalog = TierCatalog::standard(
        config.payment.stripe_basic_price_id.clone(),
        config.payment.stripe_pro_price_id.clone(),
    );
    if catalog.all().iter().any(|t| t.is_paid() && !t.is_purchasable()) {
        warn!("Paid tier without a Stripe price id; checkout for it will be rejected");
    }

    let admins = config.admin.allow_list();
    info!(admins = admins.len(), "Admin allow-list loaded");

    let state = AppState {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        searches: Arc::new(PostgresSearchRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        webhook_events: Arc::new(PostgresWebhookEventStore::new(pool)),
        session_validator: Arc::new(session_validator),
        identity: Arc::new(identity),
        payments: Arc::new(StripePaymentAdapter::new(stripe)),
        catalog: Arc::new(catalog),
        admins: Arc::new(admins),
        settings: Arc::new(AppSettings {
            default_balance: config.credits.default_balance,
            manual_grant: config.credits.manual_grant,
            search_cost: config.credits.search_cost,
            fallback: config.billing.fallback_policy(),
            app_url: config.payment.app_url.clone(),
        }),
    };

    let app = build_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() && !server.is_production() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

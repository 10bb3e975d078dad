//! Pitchboard server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, extract::DefaultBodyLimit, middleware};
use pitchboard_api::{AppState, auth_middleware, router as api_router};
use pitchboard_common::{AuthMode, Config, LocalStorage};
use pitchboard_core::{
    AccessControl, CriteriaService, IdentityProvider, JwtIdentityProvider, PolicyTable,
    TrustedHeaderIdentityProvider,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Multipart framing on top of the image bytes.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn identity_provider(config: &Config) -> Arc<dyn IdentityProvider> {
    match config.auth.mode {
        AuthMode::Jwt => Arc::new(JwtIdentityProvider::new(
            &config.auth.jwt_secret,
            config.auth.jwt_issuer.as_deref(),
        )),
        AuthMode::TrustedHeader => Arc::new(TrustedHeaderIdentityProvider::new(
            config.auth.user_header.as_str(),
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitchboard=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting pitchboard server...");

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    // Connect to database
    let db = pitchboard_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    pitchboard_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let access: Arc<dyn AccessControl> = Arc::new(PolicyTable::default());

    let seeded = CriteriaService::new(Arc::clone(&db), Arc::clone(&access))
        .seed_default_criteria()
        .await?;
    info!(seeded, "Criteria ready");

    let storage = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));
    let identity = identity_provider(&config);
    info!(
        mode = ?config.auth.mode,
        header = identity.header_name(),
        "Identity provider configured"
    );

    let state = AppState::new(
        db,
        storage,
        identity,
        access,
        config.storage.max_upload_bytes,
    );

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            config.storage.max_upload_bytes + MULTIPART_OVERHEAD,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .context("server.host is not an IP address")?;
    let addr = SocketAddr::from((ip, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

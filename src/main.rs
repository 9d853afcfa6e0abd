//! Bookworm - A book-review catalog API.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use bookworm::{
    config::Config,
    image::{CloudinaryHost, ImageHost, MemoryImageHost},
    keepalive::KeepAlive,
    server::{create_router, AppState, RouterConfig},
    store::{Stores, MEMORY_STORE_URL},
    TokenService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Bookworm v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Environment: {:?}", config.environment);
    info!("  Request timeout: {}s", config.request_timeout);
    match &config.cors_origins {
        Some(origins) if config.is_production() => {
            info!("  CORS origins: {}", origins.join(", "))
        }
        _ => info!("  CORS origins: any"),
    }

    // Connect to the store
    let database_url = config.database_url_or_empty();
    if database_url.starts_with(MEMORY_STORE_URL) {
        warn!("  Store: in-memory - data is lost on restart");
    } else {
        info!("Connecting to database...");
    }
    let stores = match Stores::connect(database_url).await {
        Ok(stores) => stores,
        Err(e) => {
            error!("Failed to connect to the store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Image host
    let images: Arc<dyn ImageHost> = match config.cloudinary() {
        Some(cloudinary) => {
            info!("  Image host: Cloudinary ({})", cloudinary.cloud_name);
            match CloudinaryHost::new(cloudinary) {
                Ok(host) => Arc::new(host),
                Err(e) => {
                    error!("Failed to create image host client: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => {
            warn!("  Image host: in-memory - cover images are not durable");
            Arc::new(MemoryImageHost::new())
        }
    };

    let tokens = TokenService::new(config.jwt_secret_or_empty());
    let state = AppState::new(stores, images, tokens);

    // Build router
    let router = create_router(state, RouterConfig::from_config(&config));

    // Keep-alive pinger
    let _keepalive = match start_keepalive(&config) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start keep-alive: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Bind and serve
    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "bookworm=debug,tower_http=debug"
    } else {
        "bookworm=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Spawn the keep-alive task if a URL is configured.
fn start_keepalive(config: &Config) -> Result<Option<tokio::task::JoinHandle<()>>, String> {
    let Some(ref raw) = config.keepalive_url else {
        return Ok(None);
    };

    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    let keepalive =
        KeepAlive::new(url, config.keepalive_interval()).map_err(|e| e.to_string())?;
    Ok(Some(keepalive.spawn()))
}

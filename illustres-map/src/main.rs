//! illustres-map - Femmes Illustres walking tour map service
//!
//! Loads the portrait and geo-trace datasets, renders markers, route and
//! sidebar, then serves search and selection over HTTP with an SSE stream
//! of map commands for the browser map widget.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use illustres_common::config::{CliOverrides, ConfigResolver, ENV_CONFIG_PATH};
use illustres_map::engine::{EngineSettings, MapEngine};
use illustres_map::events::EventBus;
use illustres_map::geocoder::{Geocoder, NominatimClient};
use illustres_map::sources::OpenDataClient;
use illustres_map::view::SceneMapView;
use illustres_map::{build_router, AppState};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "illustres-map")]
#[command(about = "Map service for the Femmes Illustres walking tour")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    /// Listen address (e.g. 127.0.0.1:5780)
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Portraits dataset URL
    #[arg(long)]
    portraits_url: Option<String>,

    /// Geo-traces dataset URL
    #[arg(long)]
    geo_traces_url: Option<String>,

    /// Nominatim-compatible geocoder root URL
    #[arg(long)]
    geocoder_url: Option<String>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        Self {
            config_path: args.config,
            bind_address: args.bind,
            log_level: args.log_level,
            portraits_url: args.portraits_url,
            geo_traces_url: args.geo_traces_url,
            geocoder_url: args.geocoder_url,
        }
    }
}

/// SSE channel capacity
const EVENT_BUS_CAPACITY: usize = 256;

/// Level used until the configuration is known
const BOOTSTRAP_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise the filter is swapped once config resolves
    let env_filter = EnvFilter::try_from_default_env().ok();
    let filter_from_env = env_filter.is_some();
    let initial = env_filter.unwrap_or_else(|| {
        EnvFilter::new(args.log_level.as_deref().unwrap_or(BOOTSTRAP_LOG_LEVEL))
    });
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let config = ConfigResolver::from_cli(args.into()).context("Configuration error")?;
    if !filter_from_env {
        if let Err(e) = filter_handle.reload(EnvFilter::new(&config.log_level)) {
            warn!("Failed to apply log level '{}': {}", config.log_level, e);
        }
    }

    info!(
        "Starting illustres-map v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    info!("Portraits source: {}", config.portraits_url);
    info!("Geo-traces source: {}", config.geo_traces_url);
    info!(
        "Geocoder: {} (city '{}', min interval {:?})",
        config.geocoder_url, config.geocoder_city, config.geocoder_min_interval
    );

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let view = SceneMapView::new(Some(event_bus.clone()));
    let scene = view.handle();

    let catalog = OpenDataClient::from_config(&config).context("Failed to build catalog client")?;
    let geocoder: Arc<dyn Geocoder> =
        Arc::new(NominatimClient::from_config(&config).context("Failed to build geocoder")?);

    let engine = Arc::new(
        MapEngine::bootstrap(EngineSettings::from(&config), &catalog, geocoder, Box::new(view))
            .await,
    );
    engine.spawn_sweep();

    let app = build_router(AppState::new(engine, event_bus, scene))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("illustres-map listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

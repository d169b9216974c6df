//! Thumbnail Streamer - resized thumbnails with a Redis-backed cache.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thumbnail_streamer::{
    config::Config,
    server::{create_router, RouterConfig},
    source::FsSource,
    store::{CacheStore, MemoryStore, RedisStore},
    thumbnail::{ResizeTransformer, ThumbnailService},
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

    info!(
        "Thumbnail Streamer v{} starting",
        env!("CARGO_PKG_VERSION")
    );
    info!("Configuration:");
    info!(
        "  Cache TTL: {}s, HTTP max-age: {}s",
        config.cache_ttl, config.cache_max_age
    );
    info!(
        "  Default width: {}px, JPEG quality: {}",
        config.default_width, config.jpeg_quality
    );
    match config.source_root {
        Some(ref root) => info!("  Source root: {}", root.display()),
        None => info!("  Source root: (paths read as given)"),
    }
    if config.single_flight {
        info!("  Single-flight: enabled");
    }

    // Connect the cache store
    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("  Failed to connect to Redis: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - The server is running and reachable");
            error!("    - The URL, including any password, is correct");
            return ExitCode::FAILURE;
        }
    };

    // Create source and service
    let source = match config.source_root {
        Some(ref root) => FsSource::with_root(root),
        None => FsSource::new(),
    };
    let transformer = Arc::new(ResizeTransformer::with_quality(config.jpeg_quality));
    let thumbnail_service = ThumbnailService::new(Arc::clone(&store), source)
        .with_transformer(transformer)
        .with_ttl(config.cache_ttl())
        .with_single_flight(config.single_flight);

    // Build router configuration
    let router_config = build_router_config(&config);

    // Create router
    let router = create_router(thumbnail_service, router_config);

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
    info!(
        "  curl -o thumb.jpg 'http://{}/thumbnail?path=/path/to/image.jpg&width=200'",
        addr
    );

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.shutdown().await;

    if let Err(e) = result {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Connect to Redis when a URL is configured, otherwise use the in-process store.
async fn open_store(
    config: &Config,
) -> Result<Arc<dyn CacheStore>, thumbnail_streamer::StoreError> {
    match config.resolved_redis_url() {
        Some(url) => {
            info!("Connecting to Redis...");
            let store = RedisStore::connect(&url).await?;
            info!("  Cache store: redis ({})", store.url());
            Ok(Arc::new(store))
        }
        None => {
            warn!("  No Redis URL configured, caching in process memory");
            info!(
                "  Cache store: memory ({}MB)",
                config.memory_cache_size / (1024 * 1024)
            );
            Ok(Arc::new(MemoryStore::with_capacity(config.memory_cache_size)))
        }
    }
}

/// Resolve when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "thumbnail_streamer=debug,tower_http=debug"
    } else {
        "thumbnail_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_default_width(config.default_width);

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config = router_config.with_tracing(!config.no_tracing);

    router_config
}

// langstats - GitHub language statistics cards with a two-tier cache
// Author: kelexine (https://github.com/kelexine)

use anyhow::{Context, Result};
use clap::Parser;
use langstats::cache::{CacheSweeper, CacheTier, GzipCompressor, SqliteConnector};
use langstats::cli::{Args, OutputFormat};
use langstats::config::{AppConfig, ChartConfig};
use langstats::github::GitHubClient;
use langstats::server::create_router;
use langstats::stats::{LanguageStatsService, StatsPayload, StatsRequest};
use langstats::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load(args.config.as_deref())?;

    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()
        .context("failed to build the Tokio runtime")?;

    runtime.block_on(run(args, config))
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting langstats v{}", env!("CARGO_PKG_VERSION"));
    if config.github.token.is_none() {
        warn!("No GitHub token configured; anonymous requests are limited to 60 per hour");
    }

    // Phase 3: Connect the cache tiers (degrades to memory-only on failure)
    let connector = SqliteConnector::new(config.cache.database_path.clone(), config.cache.pool_size);
    let compressor = Arc::new(GzipCompressor::new(config.cache.compression_level));
    let cache = Arc::new(CacheTier::connect(&config.cache, &connector, compressor).await);

    let shutdown = CancellationToken::new();
    let sweeper = CacheSweeper::start(
        Arc::clone(&cache),
        Duration::from_secs(config.cache.sweep_interval_seconds),
        shutdown.clone(),
    );

    // Phase 4: Build the service
    let client = GitHubClient::new(&config.github)?;
    let service = Arc::new(LanguageStatsService::new(client, cache, &config));

    let outcome = match args.render {
        Some(subject) => render_once(&service, subject, args.format, &config.chart).await,
        None => serve(config, service).await,
    };

    // Phase 6: Stop background work
    shutdown.cancel();
    sweeper.shutdown().await;
    outcome
}

async fn render_once(
    service: &LanguageStatsService,
    subject: String,
    format: OutputFormat,
    defaults: &ChartConfig,
) -> Result<()> {
    let mut request = StatsRequest::with_defaults(subject, defaults);
    request.raw = format == OutputFormat::Json;

    let response = service.get_language_stats(request).await?;
    match response.payload {
        StatsPayload::Document(svg) => println!("{}", svg),
        StatsPayload::Data(report) => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    info!(
        "Rendered {} languages ({}) in {}ms",
        response.total_languages,
        response.cache_source.as_str(),
        response.processing_time.as_millis()
    );
    Ok(())
}

async fn serve(config: AppConfig, service: Arc<LanguageStatsService>) -> Result<()> {
    // Phase 5: Build and start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(config, service)?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use rentgate::application::{ImageResolver, ListPropertyMediaUseCase, MediaListing, ResolverConfig};
use rentgate::domain::VersionedUrl;
use rentgate::infrastructure::{
    AppConfig, CliArgs, CloudinaryStore, ConfigLoader, RentmanClient, TtlCache,
};
use rentgate::presentation::{AppState, router, serve};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}

fn load_config() -> Result<AppConfig> {
    let args = CliArgs::parse();

    let loader = ConfigLoader::new()?;
    let mut config = loader.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_logging(&config)?;
    config.validate().wrap_err("incomplete configuration")?;

    info!(version = rentgate::VERSION, "Starting {}", rentgate::NAME);

    let source = Arc::new(RentmanClient::new(&config.upstream)?);
    let store = Arc::new(CloudinaryStore::new(&config.cdn)?);

    let url_cache: Arc<TtlCache<VersionedUrl>> = Arc::new(TtlCache::new(config.cache.capacity));
    let response_cache: Arc<TtlCache<MediaListing>> =
        Arc::new(TtlCache::new(config.cache.capacity));
    if let Some(sweep_interval) = config.cache.sweep_interval() {
        url_cache.spawn_sweeper(sweep_interval);
        response_cache.spawn_sweeper(sweep_interval);
    } else {
        info!("Expired-entry sweep disabled");
    }

    let resolver = ImageResolver::new(
        source.clone(),
        store,
        url_cache.clone(),
        ResolverConfig {
            image_ttl: config.cache.image_ttl(),
            fetch_timeout: Duration::from_secs(config.upstream.fetch_timeout_secs),
        },
    );
    let media = ListPropertyMediaUseCase::new(
        source.clone(),
        response_cache.clone(),
        config.cache.response_ttl(),
        config.server.public_base_url.clone().unwrap_or_default(),
    );

    let state = AppState {
        resolver,
        media,
        source,
        url_cache,
        response_cache,
    };

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .wrap_err_with(|| format!("failed to bind {}", config.server.listen_addr))?;

    serve(listener, router(state), shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}

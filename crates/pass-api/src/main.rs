//! Event Pass API Service
//!
//! REST API service for attendee registration, pass verification, selfie
//! storage and pass export.

use anyhow::{Context, Result};
use pass_api::config::Config;
use pass_api::mailer::{HttpMailer, LogMailer, Mailer};
use pass_api::photos::DiskPhotoStore;
use pass_api::storage::{AttendeeStore, MemoryStore, RedisStore};
use pass_api::{create_router, AppState, Settings};
use raster_export::{Exporter, ResvgBackend};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pass_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Event Pass API Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded - listening on {}",
        config.api_address()
    );

    // Ensure directories exist
    config
        .ensure_directories()
        .context("Failed to create directories")?;
    info!("Photo directory: {}", config.photo_dir.display());

    // Attendee storage
    let attendees: Arc<dyn AttendeeStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::new(url).await?),
        None => {
            warn!("REDIS_URL not set, attendee records are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // Email delivery
    let mailer: Arc<dyn Mailer> = match &config.email_api_key {
        Some(key) => Arc::new(HttpMailer::new(
            config.email_api_url.clone(),
            key.clone(),
            config.email_from.clone(),
            config.email_timeout,
        )?),
        None => {
            warn!("EMAIL_API_KEY not set, pass emails are only logged");
            Arc::new(LogMailer)
        }
    };

    // Render engine; loading system fonts can take a moment
    let backend = tokio::task::spawn_blocking(ResvgBackend::new)
        .await
        .context("Failed to initialize render engine")?;
    let exporter = Exporter::new(Arc::new(backend))
        .with_timeout(config.export_timeout)
        .with_jpeg_quality(config.jpeg_quality);
    info!(
        "Render engine: {} (timeout {:?})",
        exporter.backend_name(),
        exporter.timeout()
    );

    let state = AppState {
        attendees,
        photos: Arc::new(DiskPhotoStore::new(
            config.photo_dir.clone(),
            config.public_base_url.clone(),
        )),
        mailer,
        exporter,
        settings: Settings::from_config(&config),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Event Pass API listening on {}", config.api_address());
    info!("Health check: http://{}/health", config.api_address());
    info!("Pass links: {}/pass/{{id}}", config.public_base_url);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

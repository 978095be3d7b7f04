//! Event Pass REST API
//!
//! This service registers attendees, verifies passes, stores selfies and
//! turns pass templates into downloadable files.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /attendees` - Register an attendee
//! - `GET /attendees?email=&phone=` - List or search attendees
//! - `GET /attendees/export` - Download attendees as CSV
//! - `GET /verify/{id}` - Look up a pass
//! - `GET /pass/{id}` - Hosted pass page
//! - `POST /upload-photo` - Store a selfie for a pass
//! - `GET /storage/list-photos?passId=` - Photos for a pass, newest first
//! - `GET /storage/selfies/{name}` - Stored photo
//! - `POST /preview` - Render a pass to SVG
//! - `POST /export-pass` - Render and export a pass (svg, png, jpg, pdf)
//! - `POST /send-pass-email` - Email a link to the hosted pass

pub mod attendees;
pub mod config;
pub mod handlers;
pub mod mailer;
pub mod photos;
pub mod storage;

use axum::{
    routing::{get, post},
    Router,
};
use pass_renderer::SiteInfo;
use raster_export::Exporter;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::mailer::Mailer;
use crate::photos::{PhotoStore, SELFIE_FOLDER};
use crate::storage::AttendeeStore;

/// Request-independent values handlers need
#[derive(Debug, Clone)]
pub struct Settings {
    pub site: SiteInfo,

    /// Prefix of generated pass identifiers
    pub pass_id_prefix: String,

    /// Longest side of a stored photo
    pub photo_max_dimension: u32,

    /// Root of the photo store, served under `/storage`
    pub photo_dir: PathBuf,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            site: SiteInfo::new(config.public_base_url.clone(), config.site_url.clone()),
            pass_id_prefix: config.pass_id_prefix.clone(),
            photo_max_dimension: config.photo_max_dimension,
            photo_dir: config.photo_dir.clone(),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub attendees: Arc<dyn AttendeeStore>,
    pub photos: Arc<dyn PhotoStore>,
    pub mailer: Arc<dyn Mailer>,
    pub exporter: Exporter,
    pub settings: Settings,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let selfies = ServeDir::new(state.settings.photo_dir.join(SELFIE_FOLDER));
    let state = Arc::new(state);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_handler))
        // Attendee records
        .route(
            "/attendees",
            post(handlers::create_attendee_handler).get(handlers::list_attendees_handler),
        )
        .route("/attendees/export", get(handlers::export_attendees_handler))
        .route("/verify/{id}", get(handlers::verify_handler))
        .route("/pass/{id}", get(handlers::pass_page_handler))
        // Photos
        .route("/upload-photo", post(handlers::upload_photo_handler))
        .route("/storage/list-photos", get(handlers::list_photos_handler))
        .nest_service("/storage/selfies", selfies)
        // Rendering and delivery
        .route("/preview", post(handlers::preview_handler))
        .route("/export-pass", post(handlers::export_pass_handler))
        .route("/send-pass-email", post(handlers::send_pass_email_handler))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! API request handlers for pass operations

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use pass_common::{AttendeeView, Error, ErrorKind, PassId, PhotoAsset, Theme};
use pass_renderer::{render_pass, PassData, PhotoRef, RenderRequest, RenderedPass, TemplateKey};
use raster_export::{ExportFormat, ExportRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::attendees::{self, NewAttendee};
use crate::mailer::PassEmail;
use crate::photos;
use crate::storage::AttendeeFilter;
use crate::AppState;

/// Attendee lookup query
#[derive(Debug, Default, Deserialize)]
pub struct AttendeeQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Response wrapping one attendee
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeResponse {
    pub success: bool,
    pub attendee: AttendeeView,
    pub pass_url: String,
}

/// Response listing attendees
#[derive(Debug, Serialize)]
pub struct AttendeesResponse {
    pub success: bool,
    pub count: usize,
    pub attendees: Vec<AttendeeView>,
}

/// Request to store a selfie for a pass
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPhotoRequest {
    #[serde(default, alias = "id")]
    pub pass_id: Option<String>,

    /// Base64 payload, raw or as a `data:` URL
    #[serde(default, alias = "base64", alias = "data")]
    pub image: Option<String>,

    /// MIME type declared by the client
    #[serde(default, alias = "contentType")]
    pub mime_type: Option<String>,
}

/// Response from a photo upload
#[derive(Debug, Serialize)]
pub struct UploadPhotoResponse {
    pub success: bool,
    pub url: String,
    pub photo: PhotoAsset,
}

/// Photo listing query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoQuery {
    pub pass_id: Option<String>,
}

/// Response listing photos
#[derive(Debug, Serialize)]
pub struct PhotosResponse {
    pub success: bool,
    pub photos: Vec<PhotoAsset>,
}

/// Request to render a pass, for preview or export
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPassRequest {
    #[serde(default)]
    pub template: Option<String>,

    /// Attendee snapshot; a bare pass id is filled from the stored record
    #[serde(default, alias = "attendee")]
    pub data: PassData,

    /// Color theme key
    #[serde(default)]
    pub color: Option<String>,

    /// `data:image/...` URI, stored photo name, or stored photo URL
    #[serde(default)]
    pub photo: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    /// svg, png, jpg or pdf
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub scale: Option<f64>,
}

/// Response from a preview render
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub success: bool,
    pub pass_id: String,
    pub template: &'static str,
    pub width: u32,
    pub height: u32,
    pub svg: String,
}

/// Request to email a pass link
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(default, alias = "id")]
    pub pass_id: Option<String>,

    #[serde(default, alias = "to")]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// Pre-rendered body; a link email is generated when absent
    #[serde(default)]
    pub html: Option<String>,
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    fn validation(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": self.kind.as_str(),
            "message": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        let status = match &err {
            Error::Validation(_) | Error::UnsupportedInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Upstream { service, .. } if *service == raster_export::error::RENDER_ENGINE => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if kind == ErrorKind::Internal || kind == ErrorKind::Upstream {
            error!("Request failed: {}", err);
        }

        ApiError {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl From<pass_renderer::RenderError> for ApiError {
    fn from(err: pass_renderer::RenderError) -> Self {
        Error::from(err).into()
    }
}

impl From<raster_export::ExportError> for ApiError {
    fn from(err: raster_export::ExportError) -> Self {
        Error::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(format!("Invalid query: {}", rejection.body_text()))
    }
}

/// Trimmed value, or `None` when missing or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Canonical form of a pass id from a path or body; unparseable ids are
/// looked up as given.
fn canonical_pass_id(raw: &str) -> String {
    PassId::parse(raw)
        .map(PassId::into_string)
        .unwrap_or_else(|| raw.trim().to_string())
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = match state.attendees.health_check().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("Storage health check failed: {}", e);
            "unavailable"
        }
    };

    let status = if storage == "ok" { "healthy" } else { "degraded" };

    Json(serde_json::json!({
        "status": status,
        "service": "pass-api",
        "storage": storage,
        "mailer": state.mailer.name(),
        "renderEngine": state.exporter.backend_name()
    }))
}

/// Register an attendee
pub async fn create_attendee_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewAttendee>, JsonRejection>,
) -> Result<(StatusCode, Json<AttendeeResponse>), ApiError> {
    let Json(form) = payload?;

    let record = attendees::register(
        state.attendees.as_ref(),
        &state.settings.pass_id_prefix,
        form,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AttendeeResponse {
            success: true,
            pass_url: state.settings.site.pass_url(&record.pass_id),
            attendee: AttendeeView::from(&record),
        }),
    ))
}

/// List attendees, optionally filtered by email or phone
pub async fn list_attendees_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AttendeeQuery>, QueryRejection>,
) -> Result<Json<AttendeesResponse>, ApiError> {
    let Query(query) = query?;
    let filter = AttendeeFilter {
        email: present(query.email),
        phone: present(query.phone),
    };

    let records = state.attendees.list(&filter).await?;
    info!("Attendee lookup returned {} records", records.len());

    Ok(Json(AttendeesResponse {
        success: true,
        count: records.len(),
        attendees: records.iter().map(AttendeeView::from).collect(),
    }))
}

/// Download every attendee as CSV
pub async fn export_attendees_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let records = state.attendees.list(&AttendeeFilter::default()).await?;
    info!("Exporting {} attendees", records.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"attendees.csv\"",
            ),
        ],
        attendees::to_csv(&records),
    )
        .into_response())
}

/// Look up a pass for verification
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AttendeeResponse>, ApiError> {
    let pass_id = canonical_pass_id(&id);

    let record = state
        .attendees
        .get(&pass_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Pass not found: {}", pass_id)))?;

    info!("Verified pass {}", pass_id);
    Ok(Json(AttendeeResponse {
        success: true,
        pass_url: state.settings.site.pass_url(&record.pass_id),
        attendee: AttendeeView::from(&record),
    }))
}

/// Hosted pass page: story template with the newest selfie, or the QR code
pub async fn pass_page_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let pass_id = canonical_pass_id(&id);

    let record = state
        .attendees
        .get(&pass_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Pass not found: {}", pass_id)))?;

    let photo = match state.photos.latest(&pass_id).await? {
        Some(asset) => state
            .photos
            .read(&asset.name)
            .await?
            .map(|bytes| PhotoRef::from_bytes("image/jpeg", &bytes)),
        None => None,
    };

    let request = RenderRequest::new(
        TemplateKey::Story.key(),
        PassData::from(&record),
        Utc::now().date_naive(),
    )
    .with_theme(record.theme)
    .with_photo(photo);

    let pass = render_pass(&request, &state.settings.site)?;
    Ok(Html(pass.to_html()))
}

/// Upload a selfie for a pass
pub async fn upload_photo_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UploadPhotoRequest>, JsonRejection>,
) -> Result<Json<UploadPhotoResponse>, ApiError> {
    let Json(request) = payload?;

    // Both fields are checked before any storage call
    let (Some(raw_id), Some(image)) = (present(request.pass_id), present(request.image)) else {
        return Err(ApiError::validation(
            "Missing pass identifier or image payload",
        ));
    };
    let pass_id = PassId::parse(&raw_id)
        .ok_or_else(|| Error::validation(format!("Invalid pass identifier: {}", raw_id)))?;

    let bytes = photos::decode_payload(&image)?;
    let mime = request.mime_type;
    let max_dimension = state.settings.photo_max_dimension;
    let jpeg = tokio::task::spawn_blocking(move || {
        photos::normalize(&bytes, mime.as_deref(), max_dimension)
    })
    .await
    .map_err(|e| Error::Other(anyhow::anyhow!("photo processing aborted: {}", e)))??;

    let asset = state.photos.put(pass_id.as_str(), jpeg).await?;
    info!("Uploaded photo {} for {}", asset.name, pass_id);

    Ok(Json(UploadPhotoResponse {
        success: true,
        url: asset.url.clone(),
        photo: asset,
    }))
}

/// List photos for a pass, newest first
pub async fn list_photos_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PhotoQuery>, QueryRejection>,
) -> Result<Json<PhotosResponse>, ApiError> {
    let Query(query) = query?;
    let raw_id = present(query.pass_id).ok_or_else(|| ApiError::validation("Missing passId"))?;
    let pass_id = canonical_pass_id(&raw_id);

    let photos = state.photos.list(&pass_id).await?;
    Ok(Json(PhotosResponse {
        success: true,
        photos,
    }))
}

/// Resolve a photo reference from a render request.
async fn resolve_photo(state: &AppState, photo: Option<String>) -> Result<Option<PhotoRef>, ApiError> {
    let Some(photo) = present(photo) else {
        return Ok(None);
    };

    if photo.starts_with("data:") {
        return Ok(Some(PhotoRef::from_data_uri(&photo)?));
    }

    // Stored photo, by name or by its public URL
    let name = photo.rsplit('/').next().unwrap_or(&photo);
    let bytes = state
        .photos
        .read(name)
        .await?
        .ok_or_else(|| Error::not_found(format!("Photo not found: {}", name)))?;
    Ok(Some(PhotoRef::from_bytes("image/jpeg", &bytes)))
}

/// Render a pass for a preview or export request.
async fn render_requested(state: &AppState, request: RenderPassRequest) -> Result<RenderedPass, ApiError> {
    let mut data = request.data;
    let mut theme = request.color.as_deref().map(|c| Theme::from_key(Some(c)));

    // A bare pass id is completed from the stored record
    if data.first_name.is_none() && data.last_name.is_none() {
        if let Some(raw_id) = data.pass_id.clone() {
            if let Some(record) = state.attendees.get(&canonical_pass_id(&raw_id)).await? {
                data = PassData::from(&record);
                theme.get_or_insert(record.theme);
            }
        }
    }

    let photo = resolve_photo(state, request.photo).await?;
    let template = request
        .template
        .unwrap_or_else(|| TemplateKey::default().key().to_string());

    let mut render = RenderRequest::new(template, data, Utc::now().date_naive())
        .with_theme(theme.unwrap_or_default())
        .with_photo(photo);
    match (request.width, request.height) {
        (Some(width), Some(height)) => render = render.with_size(width, height),
        (None, None) => {}
        _ => return Err(ApiError::validation("width and height must be given together")),
    }

    Ok(render_pass(&render, &state.settings.site)?)
}

/// Render a pass and return the SVG
pub async fn preview_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RenderPassRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let Json(request) = payload?;
    let pass = render_requested(&state, request).await?;

    Ok(Json(PreviewResponse {
        success: true,
        pass_id: pass.pass_id,
        template: pass.template.key(),
        width: pass.width,
        height: pass.height,
        svg: pass.svg,
    }))
}

/// Render a pass and export it as a downloadable file
pub async fn export_pass_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RenderPassRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    let format: ExportFormat = request.format.as_deref().unwrap_or("png").parse()?;
    let scale = request.scale.unwrap_or(1.0);
    let pass = render_requested(&state, request).await?;

    info!(
        "Exporting {} as {} at {}x (template {})",
        pass.pass_id,
        format,
        scale,
        pass.template.key()
    );

    let artifact = state
        .exporter
        .export(ExportRequest {
            document: pass.svg,
            base_width: pass.width,
            base_height: pass.height,
            scale,
            format,
            file_stem: pass.pass_id,
        })
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

/// Email an attendee a link to their hosted pass
pub async fn send_pass_email_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = payload?;

    let (Some(raw_id), Some(email), Some(name)) = (
        present(request.pass_id),
        present(request.email),
        present(request.name),
    ) else {
        return Err(ApiError::validation("Missing passId, email or name"));
    };
    if !email.contains('@') {
        return Err(ApiError::validation(format!("Invalid email address: {}", email)));
    }

    let pass_id = canonical_pass_id(&raw_id);
    if state.attendees.get(&pass_id).await?.is_none() {
        return Err(Error::not_found(format!("Pass not found: {}", pass_id)).into());
    }

    let message = PassEmail::for_pass(
        &email,
        &name,
        &pass_id,
        &state.settings.site.pass_url(&pass_id),
        request.html,
    );
    state.mailer.send(&message).await?;

    info!("Sent pass {} to {}", pass_id, email);
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Pass link sent to {}", email)
    })))
}

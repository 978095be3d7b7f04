//! Export orchestration

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::backend::{RenderBackend, SessionGuard};
use crate::error::{ExportError, ExportResult};
use crate::format::ExportFormat;

/// Largest accepted scale multiplier.
pub const MAX_SCALE: f64 = 4.0;

/// Largest accepted output side, in pixels.
pub const MAX_DIMENSION: u32 = 16_384;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Products within this many ULPs of a whole pixel count as that pixel, so
/// binary float noise (e.g. `100 * 0.3`) does not push them up by one.
const ROUNDING_ULPS: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// SVG document text
    pub document: String,
    pub base_width: u32,
    pub base_height: u32,
    pub scale: f64,
    pub format: ExportFormat,
    /// File name without extension
    pub file_stem: String,
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

/// `ceil(base * scale)`.
pub fn scaled_dimension(base: u32, scale: f64) -> u32 {
    let exact = base as f64 * scale;
    let nearest = exact.round();
    let snapped = if (exact - nearest).abs() <= exact.abs() * f64::EPSILON * ROUNDING_ULPS {
        nearest
    } else {
        exact.ceil()
    };
    snapped.max(1.0) as u32
}

#[derive(Clone)]
pub struct Exporter {
    backend: Arc<dyn RenderBackend>,
    timeout: Duration,
    jpeg_quality: u8,
}

impl Exporter {
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Export on the blocking pool, bounded by the configured timeout.
    pub async fn export(&self, request: ExportRequest) -> ExportResult<ExportArtifact> {
        let exporter = self.clone();
        let task = tokio::task::spawn_blocking(move || exporter.export_blocking(&request));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                error!("Render task aborted: {}", join_error);
                Err(ExportError::failed(format!("render task aborted: {join_error}")))
            }
            Err(_) => {
                error!("Render engine timed out after {:?}", self.timeout);
                Err(ExportError::failed(format!(
                    "render engine timed out after {}s",
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }

    /// Export on the current thread.
    pub fn export_blocking(&self, request: &ExportRequest) -> ExportResult<ExportArtifact> {
        let file_name = format!("{}.{}", request.file_stem, request.format.extension());

        if request.format == ExportFormat::Svg {
            return Ok(ExportArtifact {
                bytes: request.document.clone().into_bytes(),
                content_type: ExportFormat::Svg.content_type(),
                file_name,
                width: request.base_width,
                height: request.base_height,
            });
        }

        let (width, height) = target_dimensions(request)?;

        let mut guard = SessionGuard::launch(self.backend.as_ref())?;
        let session = guard.session();
        session.load(&request.document)?;

        let bytes = match request.format {
            ExportFormat::Png => encode_png(session.screenshot(width, height)?)?,
            ExportFormat::Jpg => encode_jpeg(session.screenshot(width, height)?, self.jpeg_quality)?,
            ExportFormat::Pdf => session.print_pdf(request.base_width, request.base_height)?,
            ExportFormat::Svg => request.document.clone().into_bytes(),
        };

        info!(
            "Exported {} ({}x{}, {} bytes)",
            file_name,
            width,
            height,
            bytes.len()
        );

        Ok(ExportArtifact {
            bytes,
            content_type: request.format.content_type(),
            file_name,
            width,
            height,
        })
    }
}

/// Raster formats scale; PDF pages keep the base size.
fn target_dimensions(request: &ExportRequest) -> ExportResult<(u32, u32)> {
    if request.base_width == 0 || request.base_height == 0 {
        return Err(ExportError::InvalidDimensions(format!(
            "base size {}x{} must be positive",
            request.base_width, request.base_height
        )));
    }
    if !request.format.is_raster() {
        return Ok((request.base_width, request.base_height));
    }
    if !request.scale.is_finite() || request.scale <= 0.0 || request.scale > MAX_SCALE {
        return Err(ExportError::InvalidDimensions(format!(
            "scale {} must be in (0, {}]",
            request.scale, MAX_SCALE
        )));
    }

    let width = scaled_dimension(request.base_width, request.scale);
    let height = scaled_dimension(request.base_height, request.scale);
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ExportError::InvalidDimensions(format!(
            "output size {width}x{height} exceeds {MAX_DIMENSION}x{MAX_DIMENSION}"
        )));
    }

    Ok((width, height))
}

fn encode_png(image: RgbaImage) -> ExportResult<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ExportError::failed(format!("png encoding failed: {e}")))?;
    Ok(buf)
}

fn encode_jpeg(image: RgbaImage, quality: u8) -> ExportResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| ExportError::failed(format!("jpeg encoding failed: {e}")))?;
    Ok(buf)
}

//! Export pipeline tests: session lifecycle with a scripted engine, and real
//! output from the resvg engine.

use image::RgbaImage;
use raster_export::{
    fontdb, ExportError, ExportFormat, ExportRequest, ExportResult, Exporter, RenderBackend,
    RenderSession, ResvgBackend,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DOC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="500" viewBox="0 0 300 500"><rect width="300" height="500" fill="#1B2140"/><circle cx="150" cy="150" r="100" fill="#E8C872"/></svg>"##;

#[derive(Clone, Copy, PartialEq)]
enum Failure {
    None,
    Load,
    Screenshot,
    Hang,
}

#[derive(Default)]
struct Counters {
    launched: AtomicUsize,
    closed: AtomicUsize,
}

struct ScriptedBackend {
    failure: Failure,
    counters: Arc<Counters>,
}

struct ScriptedSession {
    failure: Failure,
    counters: Arc<Counters>,
}

impl RenderBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn launch(&self) -> ExportResult<Box<dyn RenderSession>> {
        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            failure: self.failure,
            counters: Arc::clone(&self.counters),
        }))
    }
}

impl RenderSession for ScriptedSession {
    fn load(&mut self, _document: &str) -> ExportResult<()> {
        if self.failure == Failure::Load {
            return Err(ExportError::failed("navigation failed: net::ERR_ABORTED"));
        }
        Ok(())
    }

    fn screenshot(&mut self, width: u32, height: u32) -> ExportResult<RgbaImage> {
        match self.failure {
            Failure::Screenshot => Err(ExportError::failed("target closed")),
            Failure::Hang => {
                std::thread::sleep(Duration::from_millis(300));
                Ok(RgbaImage::new(width, height))
            }
            _ => Ok(RgbaImage::new(width, height)),
        }
    }

    fn print_pdf(&mut self, _width: u32, _height: u32) -> ExportResult<Vec<u8>> {
        Ok(b"%PDF-1.7\n".to_vec())
    }

    fn close(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn scripted(failure: Failure) -> (Exporter, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let backend = ScriptedBackend {
        failure,
        counters: Arc::clone(&counters),
    };
    (Exporter::new(Arc::new(backend)), counters)
}

fn request(format: ExportFormat, scale: f64) -> ExportRequest {
    ExportRequest {
        document: DOC.to_string(),
        base_width: 300,
        base_height: 500,
        scale,
        format,
        file_stem: "KAIROS-1234".to_string(),
    }
}

fn resvg_exporter() -> Exporter {
    // An empty font database is enough for shape-only documents
    Exporter::new(Arc::new(ResvgBackend::with_fontdb(Arc::new(
        fontdb::Database::new(),
    ))))
}

#[tokio::test]
async fn test_session_closed_after_success() {
    let (exporter, counters) = scripted(Failure::None);
    let artifact = exporter.export(request(ExportFormat::Png, 2.0)).await.unwrap();

    assert_eq!((artifact.width, artifact.height), (600, 1000));
    assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_session_closed_after_load_failure() {
    let (exporter, counters) = scripted(Failure::Load);
    let err = exporter.export(request(ExportFormat::Jpg, 1.0)).await.unwrap_err();

    assert!(matches!(err, ExportError::Failed(ref m) if m.contains("net::ERR_ABORTED")));
    assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_session_closed_after_screenshot_failure() {
    let (exporter, counters) = scripted(Failure::Screenshot);
    let err = exporter.export(request(ExportFormat::Png, 1.0)).await.unwrap_err();

    assert_eq!(err.to_string(), "Export failed: target closed");
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timeout_reports_failure_and_session_still_closes() {
    let (exporter, counters) = scripted(Failure::Hang);
    let exporter = exporter.with_timeout(Duration::from_millis(50));

    let err = exporter.export(request(ExportFormat::Png, 1.0)).await.unwrap_err();
    assert!(matches!(err, ExportError::Failed(ref m) if m.contains("timed out")));

    // The blocking render finishes in the background and drops its guard
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_svg_is_passed_through_without_engine() {
    let (exporter, counters) = scripted(Failure::Load);
    let artifact = exporter.export(request(ExportFormat::Svg, 3.0)).await.unwrap();

    assert_eq!(artifact.bytes, DOC.as_bytes());
    assert_eq!(artifact.content_type, "image/svg+xml");
    assert_eq!(artifact.file_name, "KAIROS-1234.svg");
    assert_eq!(counters.launched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_scale_never_launches_engine() {
    let (exporter, counters) = scripted(Failure::None);
    let err = exporter.export(request(ExportFormat::Png, -1.0)).await.unwrap_err();

    assert!(matches!(err, ExportError::InvalidDimensions(_)));
    assert_eq!(counters.launched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_resvg_png_has_scaled_dimensions() {
    let exporter = resvg_exporter();

    for scale in [1.0, 1.5, 2.0, 0.3, 1.1] {
        let artifact = exporter.export(request(ExportFormat::Png, scale)).await.unwrap();
        let decoded = image::load_from_memory(&artifact.bytes).unwrap();

        let expected_w = (300.0 * scale - 1e-6).ceil() as u32;
        let expected_h = (500.0 * scale - 1e-6).ceil() as u32;
        assert_eq!(decoded.width(), expected_w, "scale {scale}");
        assert_eq!(decoded.height(), expected_h, "scale {scale}");
        assert_eq!(artifact.content_type, "image/png");
    }
}

#[tokio::test]
async fn test_resvg_png_draws_document() {
    let artifact = resvg_exporter()
        .export(request(ExportFormat::Png, 1.0))
        .await
        .unwrap();
    let decoded = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();

    // Circle center in accent, corner in background
    assert_eq!(decoded.get_pixel(150, 150).0, [0xE8, 0xC8, 0x72, 0xFF]);
    assert_eq!(decoded.get_pixel(5, 495).0, [0x1B, 0x21, 0x40, 0xFF]);
}

#[tokio::test]
async fn test_resvg_jpeg() {
    let artifact = resvg_exporter()
        .with_jpeg_quality(70)
        .export(request(ExportFormat::Jpg, 2.0))
        .await
        .unwrap();

    assert_eq!(&artifact.bytes[..3], &[0xFF, 0xD8, 0xFF]);
    assert_eq!(artifact.file_name, "KAIROS-1234.jpg");
    let decoded = image::load_from_memory(&artifact.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (600, 1000));
}

#[tokio::test]
async fn test_resvg_pdf() {
    let artifact = resvg_exporter()
        .export(request(ExportFormat::Pdf, 2.0))
        .await
        .unwrap();

    assert!(artifact.bytes.starts_with(b"%PDF"));
    assert_eq!(artifact.content_type, "application/pdf");
    assert_eq!((artifact.width, artifact.height), (300, 500));
}

#[tokio::test]
async fn test_resvg_rejects_malformed_document() {
    let mut req = request(ExportFormat::Png, 1.0);
    req.document = "<svg".to_string();

    let err = resvg_exporter().export(req).await.unwrap_err();
    assert!(matches!(err, ExportError::Failed(ref m) if m.starts_with("failed to load document")));
}

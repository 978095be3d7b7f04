//! In-process render engine: usvg parse, resvg raster, svg2pdf print

use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use std::sync::Arc;
use tracing::info;

use crate::backend::{RenderBackend, RenderSession};
use crate::error::{ExportError, ExportResult};

/// PDF points per CSS pixel at the default 72 dpi page mapping.
const PDF_BASE_DPI: f32 = 72.0;

/// Backend sharing one font database across sessions.
#[derive(Clone)]
pub struct ResvgBackend {
    fontdb: Arc<fontdb::Database>,
}

impl ResvgBackend {
    /// Backend with the host's system fonts loaded.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        info!("Loaded {} font faces for rendering", db.len());
        Self::with_fontdb(Arc::new(db))
    }

    pub fn with_fontdb(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb }
    }
}

impl Default for ResvgBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for ResvgBackend {
    fn name(&self) -> &'static str {
        "resvg"
    }

    fn launch(&self) -> ExportResult<Box<dyn RenderSession>> {
        Ok(Box::new(ResvgSession {
            fontdb: Arc::clone(&self.fontdb),
            tree: None,
        }))
    }
}

struct ResvgSession {
    fontdb: Arc<fontdb::Database>,
    tree: Option<usvg::Tree>,
}

impl ResvgSession {
    fn tree(&self) -> ExportResult<&usvg::Tree> {
        self.tree
            .as_ref()
            .ok_or_else(|| ExportError::failed("no document loaded"))
    }
}

impl RenderSession for ResvgSession {
    fn load(&mut self, document: &str) -> ExportResult<()> {
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);

        let tree = usvg::Tree::from_str(document, &options)
            .map_err(|e| ExportError::failed(format!("failed to load document: {e}")))?;
        self.tree = Some(tree);
        Ok(())
    }

    fn screenshot(&mut self, width: u32, height: u32) -> ExportResult<RgbaImage> {
        let tree = self.tree()?;

        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ExportError::failed(format!("failed to allocate {width}x{height} pixmap"))
        })?;

        let sx = width as f32 / tree.size().width();
        let sy = height as f32 / tree.size().height();
        resvg::render(tree, Transform::from_scale(sx, sy), &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha; image encoders expect straight
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| ExportError::failed("pixel buffer size mismatch"))
    }

    fn print_pdf(&mut self, width: u32, _height: u32) -> ExportResult<Vec<u8>> {
        let tree = self.tree()?;

        // Page size follows the document; dpi maps it onto the requested width
        let dpi = PDF_BASE_DPI * tree.size().width() / width.max(1) as f32;
        let page = svg2pdf::PageOptions {
            dpi,
            ..svg2pdf::PageOptions::default()
        };

        svg2pdf::to_pdf(tree, svg2pdf::ConversionOptions::default(), page)
            .map_err(|e| ExportError::failed(format!("pdf conversion failed: {e:?}")))
    }

    fn close(&mut self) {
        self.tree = None;
    }
}

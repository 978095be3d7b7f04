//! Render engine seam

use image::RgbaImage;
use tracing::debug;

use crate::error::ExportResult;

/// Something that can start render sessions (a headless browser, an
/// in-process rasterizer, ...).
pub trait RenderBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Start a session for a single export.
    fn launch(&self) -> ExportResult<Box<dyn RenderSession>>;
}

/// One engine instance. Callers go through [`SessionGuard`] so `close` runs
/// no matter how the export ends.
pub trait RenderSession: Send {
    /// Load an SVG document.
    fn load(&mut self, document: &str) -> ExportResult<()>;

    /// Rasterize the loaded document to exactly `width` x `height` pixels.
    fn screenshot(&mut self, width: u32, height: u32) -> ExportResult<RgbaImage>;

    /// Print the loaded document to a single-page PDF sized `width` x
    /// `height` CSS pixels.
    fn print_pdf(&mut self, width: u32, height: u32) -> ExportResult<Vec<u8>>;

    /// Release engine resources. Must be idempotent.
    fn close(&mut self);
}

/// Owns a launched session and closes it on drop.
pub struct SessionGuard {
    backend: &'static str,
    session: Box<dyn RenderSession>,
}

impl SessionGuard {
    pub fn launch(backend: &dyn RenderBackend) -> ExportResult<Self> {
        let session = backend.launch()?;
        debug!("Launched {} render session", backend.name());
        Ok(Self {
            backend: backend.name(),
            session,
        })
    }

    pub fn session(&mut self) -> &mut dyn RenderSession {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
        debug!("Closed {} render session", self.backend);
    }
}

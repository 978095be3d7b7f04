//! Raster Export Pipeline
//!
//! Converts a rendered pass document into a deliverable file. The render
//! engine sits behind [`RenderBackend`]; every export acquires one session,
//! uses it once and releases it on every exit path.

pub mod backend;
pub mod error;
pub mod exporter;
pub mod format;
pub mod resvg_backend;

pub use backend::{RenderBackend, RenderSession, SessionGuard};
pub use error::{ExportError, ExportResult};
pub use exporter::{scaled_dimension, ExportArtifact, ExportRequest, Exporter, MAX_DIMENSION, MAX_SCALE};
pub use format::ExportFormat;
pub use resvg_backend::ResvgBackend;

pub use resvg::usvg::fontdb;

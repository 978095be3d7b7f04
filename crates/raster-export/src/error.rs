use thiserror::Error;

/// Service name attached to render-engine failures.
pub const RENDER_ENGINE: &str = "render engine";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Any render-engine failure, with the engine's message attached
    #[error("Export failed: {0}")]
    Failed(String),
}

impl ExportError {
    pub fn failed(message: impl Into<String>) -> Self {
        ExportError::Failed(message.into())
    }
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

impl From<ExportError> for pass_common::Error {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnsupportedFormat(_) => pass_common::Error::unsupported(err.to_string()),
            ExportError::InvalidDimensions(_) => pass_common::Error::validation(err.to_string()),
            ExportError::Failed(message) => pass_common::Error::upstream(RENDER_ENGINE, message),
        }
    }
}

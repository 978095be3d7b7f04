use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Missing required data: {0}")]
    MissingData(&'static str),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid photo reference: {0}")]
    InvalidPhoto(String),

    #[error("Invalid target size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("QR encoding failed: {0}")]
    QrEncoding(String),

    #[error("Document composition failed")]
    Compose(#[from] std::fmt::Error),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for pass_common::Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::MissingData(_) | RenderError::InvalidSize { .. } => {
                pass_common::Error::validation(err.to_string())
            }
            RenderError::TemplateNotFound(_) | RenderError::InvalidPhoto(_) => {
                pass_common::Error::unsupported(err.to_string())
            }
            RenderError::QrEncoding(_) | RenderError::Compose(_) => {
                pass_common::Error::Other(anyhow::Error::new(err))
            }
        }
    }
}

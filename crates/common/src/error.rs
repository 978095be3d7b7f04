use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UnsupportedInput(String),

    #[error("{service} error: {message}")]
    Upstream { service: &'static str, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification used at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    UnsupportedInput,
    Upstream,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnsupportedInput => "unsupported_input",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedInput(message.into())
    }

    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Error::Upstream {
            service,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
            Error::Upstream { .. } => ErrorKind::Upstream,
            Error::Storage(_)
            | Error::Redis(_)
            | Error::JsonSerialization(_)
            | Error::Io(_)
            | Error::Other(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(Error::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(Error::unsupported("x").kind(), ErrorKind::UnsupportedInput);
        assert_eq!(Error::upstream("email", "x").kind(), ErrorKind::Upstream);
        assert_eq!(Error::Storage("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_upstream_message_keeps_cause() {
        let err = Error::upstream("email", "503 Service Unavailable");
        assert_eq!(err.to_string(), "email error: 503 Service Unavailable");
    }
}

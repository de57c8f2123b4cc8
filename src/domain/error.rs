// src/domain/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Content is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type DomainResult<T> = Result<T, ImportError>;

impl ImportError {
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        match self {
            ImportError::InvalidFormat(msg) => {
                ImportError::InvalidFormat(format!("{}: {}", context.into(), msg))
            }
            ImportError::InvalidRecord(msg) => {
                ImportError::InvalidRecord(format!("{}: {}", context.into(), msg))
            }
            ImportError::Other(msg) => ImportError::Other(format!("{}: {}", context.into(), msg)),
            err => ImportError::Other(format!("{}: {}", context.into(), err)),
        }
    }
}

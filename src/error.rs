use std::error::Error as E;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidImage(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("error processing image: {0}")]
    Processing(String),
    #[error("invalid configuration for {0}: {1}")]
    Config(String, String),
    #[error("server error: {0}")]
    Server(String),
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the exchange an error is blamed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientInput,
    Auth,
    Processing,
}

impl Error {
    pub fn invalid_image(message: &str) -> Self {
        Error::InvalidImage(message.to_string())
    }
    pub fn processing(error: &dyn E) -> Self {
        Error::Processing(error.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidImage(_) | Error::UnsupportedFormat(_) | Error::MalformedRequest(_) => {
                ErrorKind::ClientInput
            }
            Error::Unauthorized => ErrorKind::Auth,
            _ => ErrorKind::Processing,
        }
    }

    /// Message handed back to the caller. Processing failures always carry the
    /// "error processing image" prefix, whatever their source.
    pub fn detail(&self) -> String {
        match self {
            Error::ImageError(_) | Error::IoError(_) | Error::ShapeError(_) | Error::JsonError(_) => {
                Error::processing(self).to_string()
            }
            other => other.to_string(),
        }
    }
}

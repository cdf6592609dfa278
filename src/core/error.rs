use thiserror::Error;
use std::io;

/// Errors a reporter can return while rendering a result model.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write to output sink: {0}")]
    SinkWriteFailed(#[from] io::Error),

    #[error("Failed to encode report: {0}")]
    EncodingFailed(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            RenderError::SinkWriteFailed(err.into())
        } else {
            RenderError::EncodingFailed(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid result model: {0}")]
    InvalidModel(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, ReportError>;

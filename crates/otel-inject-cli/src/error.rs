//! Error types for the CLI

use std::path::PathBuf;

use otel_inject_common::telemetry::TelemetryError;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Inject(#[from] otel_inject_common::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("logging setup failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("container not found in pod: {name}")]
    ContainerNotFound { name: String },

    #[error("validation error: {message}")]
    Validation { message: String },
}

impl Error {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}

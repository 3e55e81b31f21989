//! Error types for the drawkit background pipeline.
//!
//! Errors are organized by stage so callers get an actionable message that
//! names the source image and what went wrong. Every pipeline failure also
//! maps onto one of four [`ErrorKind`]s, which is what callers match on when
//! deciding whether to retry (e.g. with a smaller bounding box).

use thiserror::Error;

/// Top-level error type for drawkit operations.
#[derive(Error, Debug)]
pub enum DrawkitError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, one variant per failure class.
///
/// `origin` is a human-readable description of the image source (a file path,
/// or a summary such as `<encoded bytes: 1024 B>`).
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Zero-sized image, missing file, or an otherwise unusable source reference
    #[error("Invalid image {origin}: {message}")]
    InvalidImage { origin: String, message: String },

    /// Malformed or unsupported encoded image data
    #[error("Decode error for {origin}: {message}")]
    Decode { origin: String, message: String },

    /// An allocation would exceed the memory ceiling, or failed outright
    #[error(
        "Out of memory in {stage} stage for {origin}: requested {requested_bytes} bytes (limit {limit_bytes})"
    )]
    OutOfMemory {
        origin: String,
        stage: &'static str,
        requested_bytes: u64,
        limit_bytes: u64,
    },

    /// Caller passed an argument outside its accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// The four failure classes a pipeline call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidImage,
    Decode,
    OutOfMemory,
    InvalidArgument,
}

impl PipelineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidImage { .. } => ErrorKind::InvalidImage,
            PipelineError::Decode { .. } => ErrorKind::Decode,
            PipelineError::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            PipelineError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn invalid_image(origin: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::InvalidImage {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub(crate) fn decode(origin: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Decode {
            origin: origin.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for drawkit results.
pub type Result<T> = std::result::Result<T, DrawkitError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

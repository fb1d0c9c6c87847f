//! Error types for the Pupline image pipeline.
//!
//! Errors are organized by stage so messages carry the context a batch
//! operator needs (file paths, sizes, formats, HTTP status).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Pupline operations.
#[derive(Error, Debug)]
pub enum PuplineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

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

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Encoding a derivative failed
    #[error("Encode error ({format} {size}): {message}")]
    Encode {
        format: String,
        size: String,
        message: String,
    },

    /// Writing an artifact or creating its directory failed
    #[error("Write error for {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Removing a previous output directory failed
    #[error("Cleanup failed for {path}: {message}")]
    Cleanup { path: PathBuf, message: String },

    /// Item slug is empty or not URL-safe
    #[error("Invalid item slug {slug:?}: {reason}")]
    InvalidSlug { slug: String, reason: String },

    /// The input root does not exist
    #[error("Source root not found: {0}")]
    SourceRootMissing(PathBuf),

    /// Processing stopped before every derivative was written
    #[error("Processing of {0} was cancelled")]
    Cancelled(PathBuf),

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },
}

/// Object storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage is disabled or missing required settings
    #[error("Storage not configured: {0}")]
    NotConfigured(String),

    /// Request to the storage backend failed
    #[error("Storage request failed: {message}")]
    Request {
        message: String,
        status_code: Option<u16>,
    },

    /// Reading a local artifact for upload failed
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },
}

/// Convenience type alias for Pupline results.
pub type Result<T> = std::result::Result<T, PuplineError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_converts_to_top_level() {
        let err: PuplineError = PipelineError::SourceRootMissing(PathBuf::from("raw")).into();
        assert!(err.to_string().contains("Source root not found: raw"));
    }

    #[test]
    fn test_encode_error_message_names_pair() {
        let err = PipelineError::Encode {
            format: "webp".into(),
            size: "card".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Encode error (webp card): boom");
    }
}

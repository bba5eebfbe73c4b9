//! Error types for the editor

use quire_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Editor is not mounted")]
    NotMounted,

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(#[from] UploadError),

    #[error("Invalid document: {0}")]
    Document(#[from] ModelError),

    #[error("Save failed: {0}")]
    Save(String),

    #[error("Command was not applicable")]
    NotApplicable,
}

/// Failure reported by an [`Uploader`](crate::Uploader)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Upload of '{name}' failed: {reason}")]
    Failed { name: String, reason: String },

    #[error("Unsupported media type '{0}'")]
    UnsupportedType(String),

    #[error("File is empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

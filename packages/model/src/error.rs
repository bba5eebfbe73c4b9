//! Error types for the document model

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Schema violation in {node}: {reason}")]
    SchemaViolation { node: String, reason: String },

    #[error("Position {pos} out of range (content size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Replace error: {0}")]
    Replace(String),

    #[error("Invalid document JSON: {0}")]
    InvalidJson(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    pub fn schema(node: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::SchemaViolation {
            node: node.into(),
            reason: reason.into(),
        }
    }

    pub fn replace(message: impl Into<String>) -> Self {
        ModelError::Replace(message.into())
    }
}

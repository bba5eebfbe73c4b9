//! Error types for steps and transforms

use quire_model::{ModelError, Node};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Structure replace would overwrite content")]
    StructureOverwrite,

    #[error("Gap is not a flat range")]
    GapNotFlat,

    #[error("Content does not fit in gap")]
    GapMismatch,

    #[error("No node at position {0}")]
    NoNodeAt(usize),

    #[error("Invalid transform: {0}")]
    Invalid(String),
}

impl StepError {
    pub fn invalid(message: impl Into<String>) -> Self {
        StepError::Invalid(message.into())
    }
}

/// Result of applying a step: the new document
pub type StepResult = Result<Node, StepError>;

//! # Persistence boundary
//!
//! The editor produces [`SavePayload`]s and hands them to a [`SaveHook`].
//! When saves happen (debounce, publish button) is decided by the caller.

use crate::errors::EditorError;
use quire_model::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub title: String,
    /// The document in its JSON shape
    pub content: Value,
}

impl SavePayload {
    pub fn new(title: impl Into<String>, doc: &Node) -> Self {
        Self {
            title: title.into(),
            content: doc.to_value(),
        }
    }
}

pub trait SaveHook {
    /// Called for autosaves and explicit flushes
    fn save(&mut self, payload: &SavePayload) -> Result<(), EditorError>;

    /// Called when the user publishes. Defaults to a save.
    fn publish(&mut self, payload: &SavePayload) -> Result<(), EditorError> {
        self.save(payload)
    }
}

impl<F> SaveHook for F
where
    F: FnMut(&SavePayload) -> Result<(), EditorError>,
{
    fn save(&mut self, payload: &SavePayload) -> Result<(), EditorError> {
        self(payload)
    }
}

//! # Quire Editor
//!
//! The container an application embeds: it owns the current state, runs
//! commands, notifies subscribers and talks to the persistence and upload
//! boundaries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model + transform: documents and steps      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ state + commands: transactions, plugins,    │
//! │ history, editing commands, key bindings     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: mount, dispatch, subscribers        │
//! │  - save hook (title + JSON content)         │
//! │  - uploader (bytes → src)                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_editor::{selectors, Editor, EditorConfig};
//! use quire_commands::toggle_bold;
//!
//! let mut editor = Editor::new(EditorConfig::load(".")?);
//! editor.mount(Some(&stored_json), "My article");
//!
//! let bold = editor.subscribe(|state| render_bold_button(selectors::active_marks(state)));
//! editor.execute(&toggle_bold);
//!
//! editor.set_save_hook(|payload: &SavePayload| -> Result<(), EditorError> { api.save(payload) });
//! editor.flush()?;
//! ```

mod config;
mod editor;
mod errors;
mod persistence;
pub mod selectors;
mod upload;

pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use editor::{Editor, ListenerId};
pub use errors::{ConfigError, EditorError, UploadError};
pub use persistence::{SaveHook, SavePayload};
pub use selectors::Derived;
pub use upload::{Blob, DataUrlUploader, MediaKind, Uploader};

// Re-export common types for convenience
pub use quire_state::{Command, EditorState, Selection, SelectionKind, Transaction};

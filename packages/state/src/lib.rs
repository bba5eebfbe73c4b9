//! # Quire State
//!
//! Editor state, transactions, selection, plugins and undo history.
//!
//! ## Transaction flow
//!
//! ```text
//! command ──▶ Transaction ──▶ filters ──▶ plugin values ──▶ appended trs
//!              (steps +          │                               │
//!               selection +      └── veto: Rejected { plugin }   ▼
//!               meta)                                      new EditorState
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_state::{article_plugins, EditorState, PluginOptions, StateConfig};
//!
//! let state = EditorState::create(StateConfig {
//!     doc,
//!     selection: None,
//!     plugins: article_plugins(&PluginOptions::default()),
//! });
//! let mut tr = state.transaction();
//! tr.insert_text("Hello")?;
//! let state = state.apply(tr)?;
//! ```

mod command;
mod error;
mod history;
mod plugin;
pub mod plugins;
mod selection;
mod state;
mod transaction;

pub use command::{first_of, sequence, Command, Dispatch, FirstOf, Sequence, Typing};
pub use error::{CommandError, TransactionError};
pub use history::{
    redo, redo_depth, undo, undo_depth, HistoryConfig, HistoryEvent, HistoryPlugin, HistoryState,
    HISTORY_KEY,
};
pub use plugin::{Decoration, Plugin, PluginValue, WidgetSide};
pub use plugins::{article_plugins, character_count, PluginOptions};
pub use selection::{Selection, SelectionKind};
pub use state::{Applied, EditorState, StateConfig};
pub use transaction::{meta, FollowUp, Transaction};

//! # Plugins
//!
//! Independent concerns hook into the state lifecycle through [`Plugin`].
//! Plugins form an explicit ordered list handed to
//! [`EditorState::create`](crate::EditorState::create); each one owns a
//! value that is re-derived on every transaction.
//!
//! ## Lifecycle
//!
//! ```text
//! dispatch(tr)
//!   │
//!   ├─ filter_transaction   any plugin may veto
//!   ├─ apply                plugin values re-derived, in list order
//!   └─ append_transaction   follow-up transactions, looped until quiet
//! ```

use crate::state::EditorState;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Type-erased plugin value
pub type PluginValue = Arc<dyn Any + Send + Sync>;

pub trait Plugin: Send + Sync {
    /// Unique name, used to look up the plugin's value
    fn key(&self) -> &'static str;

    /// Value for a freshly created state
    fn init(&self, _state: &EditorState) -> PluginValue {
        Arc::new(())
    }

    /// Value after `tr`. `new` is only partially built: values of plugins
    /// later in the list are not available yet.
    fn apply(
        &self,
        _tr: &Transaction,
        value: &PluginValue,
        _old: &EditorState,
        _new: &EditorState,
    ) -> PluginValue {
        value.clone()
    }

    /// Returning false rejects the transaction
    fn filter_transaction(&self, _tr: &Transaction, _state: &EditorState) -> bool {
        true
    }

    /// A transaction to run after `trs` were applied
    fn append_transaction(
        &self,
        _trs: &[Transaction],
        _old: &EditorState,
        _new: &EditorState,
    ) -> Option<Transaction> {
        None
    }

    fn decorations(&self, _state: &EditorState) -> Vec<Decoration> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetSide {
    Before,
    After,
}

/// Presentation hints for the rendering layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Decoration {
    /// Attributes added to the node spanning `from..to`
    Node {
        from: usize,
        to: usize,
        attrs: BTreeMap<String, String>,
    },
    /// A synthetic element at `pos`
    Widget {
        pos: usize,
        class: String,
        label: String,
        side: WidgetSide,
    },
}

impl Decoration {
    pub fn node(from: usize, to: usize, attrs: &[(&str, &str)]) -> Self {
        Decoration::Node {
            from,
            to,
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Decoration::Node { attrs, .. } => attrs.get(name).map(String::as_str),
            Decoration::Widget { .. } => None,
        }
    }
}

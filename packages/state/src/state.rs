//! # Editor State
//!
//! An immutable snapshot: document, selection, stored marks and one value
//! per plugin. Applying a transaction never changes a state, it produces the
//! next one.

use crate::error::TransactionError;
use crate::plugin::{Decoration, Plugin, PluginValue};
use crate::selection::Selection;
use crate::transaction::{meta, Transaction};
use quire_model::{Mark, Node};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Rounds of `append_transaction` before the loop is cut off
const MAX_APPEND_ROUNDS: usize = 32;

pub struct StateConfig {
    pub doc: Node,
    /// Defaults to the first valid position in `doc`
    pub selection: Option<Selection>,
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl StateConfig {
    pub fn new(doc: Node) -> Self {
        StateConfig {
            doc,
            selection: None,
            plugins: Vec::new(),
        }
    }
}

/// Result of [`EditorState::apply_transaction`]: the final state and every
/// transaction that went into it, appended ones included
pub struct Applied {
    pub state: EditorState,
    pub transactions: Vec<Transaction>,
}

#[derive(Clone)]
pub struct EditorState {
    doc: Node,
    selection: Selection,
    stored_marks: Option<Vec<Mark>>,
    plugins: Arc<Vec<Arc<dyn Plugin>>>,
    plugin_states: Vec<PluginValue>,
}

impl EditorState {
    pub fn create(config: StateConfig) -> Self {
        let selection = match config.selection {
            Some(selection) => selection.clamp(&config.doc),
            None => Selection::at_start(&config.doc),
        };
        let mut state = EditorState {
            doc: config.doc,
            selection,
            stored_marks: None,
            plugins: Arc::new(config.plugins),
            plugin_states: Vec::new(),
        };
        state.init_plugins();
        state
    }

    fn init_plugins(&mut self) {
        self.plugin_states.clear();
        let plugins = self.plugins.clone();
        for plugin in plugins.iter() {
            let value = plugin.init(self);
            self.plugin_states.push(value);
        }
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// Starts a transaction on this state
    pub fn transaction(&self) -> Transaction {
        Transaction::new(self.clone())
    }

    /// The value of the plugin registered under `key`
    pub fn plugin_state<T: 'static>(&self, key: &str) -> Option<&T> {
        let index = self.plugins.iter().position(|p| p.key() == key)?;
        self.plugin_states.get(index)?.downcast_ref::<T>()
    }

    /// Decorations from every plugin, in plugin order
    pub fn decorations(&self) -> Vec<Decoration> {
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.decorations(self))
            .collect()
    }

    /// A state holding `doc` in place of the current document, for content
    /// replaced outside of any transaction. The selection is clamped into
    /// the new document and plugin values are re-initialized.
    pub fn with_doc(&self, doc: Node) -> Self {
        let selection = self.selection.clamp(&doc);
        let mut state = EditorState {
            doc,
            selection,
            stored_marks: None,
            plugins: self.plugins.clone(),
            plugin_states: Vec::new(),
        };
        state.init_plugins();
        state
    }

    /// Applies `tr`, discarding the list of applied transactions
    pub fn apply(&self, tr: Transaction) -> Result<EditorState, TransactionError> {
        Ok(self.apply_transaction(tr)?.state)
    }

    /// Runs the full pipeline for `root`: filters, plugin values and then
    /// appended transactions until no plugin has anything more to add.
    ///
    /// A veto of the root transaction is an error; a vetoed appended
    /// transaction is dropped.
    pub fn apply_transaction(&self, root: Transaction) -> Result<Applied, TransactionError> {
        if let Some(error) = root.failed() {
            debug!(error = %error, "Transaction failed while building");
            return Err(TransactionError::Failed(error.clone()));
        }
        if let Some(plugin) = self.rejecting_plugin(&root, None) {
            debug!(plugin, "Transaction rejected");
            return Err(TransactionError::Rejected {
                plugin: plugin.to_string(),
            });
        }
        let mut new_state = self.apply_inner(&root)?;
        let mut trs = vec![root];
        // Per plugin: the state and transaction count it last saw
        let mut seen: Option<Vec<(EditorState, usize)>> = None;

        for round in 0.. {
            if round == MAX_APPEND_ROUNDS {
                warn!(rounds = round, "Appended transactions did not settle");
                break;
            }
            let mut have_new = false;
            for (i, plugin) in self.plugins.iter().enumerate() {
                let (old_state, n) = match &seen {
                    Some(seen) => (seen[i].0.clone(), seen[i].1),
                    None => (self.clone(), 0),
                };
                if n < trs.len() {
                    if let Some(mut tr) = plugin.append_transaction(&trs[n..], &old_state, &new_state)
                    {
                        if tr.failed().is_some() {
                            debug!(plugin = plugin.key(), "Appended transaction failed");
                        } else if new_state.rejecting_plugin(&tr, Some(i)).is_none() {
                            tr.set_meta(meta::APPENDED_TRANSACTION, true);
                            if seen.is_none() {
                                seen = Some(
                                    (0..self.plugins.len())
                                        .map(|j| {
                                            if j < i {
                                                (new_state.clone(), trs.len())
                                            } else {
                                                (self.clone(), 0)
                                            }
                                        })
                                        .collect(),
                                );
                            }
                            trace!(plugin = plugin.key(), "Appending transaction");
                            new_state = new_state.apply_inner(&tr)?;
                            trs.push(tr);
                            have_new = true;
                        } else {
                            debug!(plugin = plugin.key(), "Appended transaction rejected");
                        }
                    }
                }
                if let Some(seen) = seen.as_mut() {
                    seen[i] = (new_state.clone(), trs.len());
                }
            }
            if !have_new {
                break;
            }
        }

        Ok(Applied {
            state: new_state,
            transactions: trs,
        })
    }

    fn rejecting_plugin(&self, tr: &Transaction, ignore: Option<usize>) -> Option<&'static str> {
        self.plugins
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != ignore)
            .find(|(_, plugin)| !plugin.filter_transaction(tr, self))
            .map(|(_, plugin)| plugin.key())
    }

    fn apply_inner(&self, tr: &Transaction) -> Result<EditorState, TransactionError> {
        if !tr.before().ptr_eq(&self.doc) && tr.before() != &self.doc {
            return Err(TransactionError::Mismatched);
        }
        let selection = tr.selection();
        let stored_marks = match selection.cursor_pos() {
            Some(_) => tr.stored_marks().map(<[Mark]>::to_vec),
            None => None,
        };
        let mut new_state = EditorState {
            doc: tr.doc().clone(),
            selection,
            stored_marks,
            plugins: self.plugins.clone(),
            plugin_states: Vec::with_capacity(self.plugins.len()),
        };
        for (plugin, value) in self.plugins.iter().zip(&self.plugin_states) {
            let next = plugin.apply(tr, value, self, &new_state);
            new_state.plugin_states.push(next);
        }
        Ok(new_state)
    }
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorState")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("stored_marks", &self.stored_marks)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.key()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

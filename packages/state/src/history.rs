//! # History
//!
//! Undo and redo over inverse steps.
//!
//! Every recorded transaction contributes the inverses of its steps to the
//! newest undo group. A transaction starts a new group when:
//!
//! - it or the previous transaction is tagged `closeHistory`
//! - more than `new_group_delay_ms` passed since the previous one
//! - the selection before it differs from the one the previous left behind
//!
//! Transactions appended by plugins always join the group of the
//! transaction that triggered them.

use crate::error::CommandError;
use crate::plugin::{Plugin, PluginValue};
use crate::selection::Selection;
use crate::state::EditorState;
use crate::transaction::{meta, Transaction};
use quire_transform::Step;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{trace, warn};

pub const HISTORY_KEY: &str = "history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Undo groups kept before the oldest is dropped
    pub depth: usize,
    pub new_group_delay_ms: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            depth: 100,
            new_group_delay_ms: 500,
        }
    }
}

/// One undo unit
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEvent {
    /// Steps that revert the unit, in the order they are applied
    pub steps: Vec<Step>,
    /// Selection to restore after the steps
    pub selection_before: Selection,
    pub time: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    pub done: Vec<HistoryEvent>,
    pub undone: Vec<HistoryEvent>,
    /// Time of the last recorded transaction, 0 forces a new group
    prev_time: i64,
    prev_selection: Option<Selection>,
    prev_closed: bool,
}

impl HistoryState {
    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    fn cleared() -> Self {
        HistoryState::default()
    }
}

/// Inverse steps of `tr`, in the order that undoes it
fn invert_steps(tr: &Transaction) -> Option<Vec<Step>> {
    let mut inverted = Vec::with_capacity(tr.steps().len());
    for (step, doc) in tr.steps().iter().zip(tr.docs()).rev() {
        match step.invert(doc) {
            Ok(step) => inverted.push(step),
            Err(e) => {
                warn!(error = %e, step = step.name(), "Could not invert step, dropping history");
                return None;
            }
        }
    }
    Some(inverted)
}

pub struct HistoryPlugin {
    config: HistoryConfig,
}

impl HistoryPlugin {
    pub fn new(config: HistoryConfig) -> Self {
        HistoryPlugin { config }
    }

    fn record(&self, history: &HistoryState, tr: &Transaction, new: &EditorState) -> HistoryState {
        let Some(inverted) = invert_steps(tr) else {
            return HistoryState::cleared();
        };
        let appended = tr.meta_bool(meta::APPENDED_TRANSACTION);
        let closed = tr.meta_bool(meta::CLOSE_HISTORY);
        let mut next = history.clone();

        let new_group = history.prev_time == 0
            || next.done.is_empty()
            || (!appended
                && (closed
                    || history.prev_closed
                    || tr.time() - history.prev_time > self.config.new_group_delay_ms
                    || history.prev_selection.as_ref() != Some(tr.before_selection())));

        if new_group {
            next.done.push(HistoryEvent {
                steps: inverted,
                selection_before: *tr.before_selection(),
                time: tr.time(),
            });
            if next.done.len() > self.config.depth {
                let overflow = next.done.len() - self.config.depth;
                next.done.drain(..overflow);
            }
            trace!(depth = next.done.len(), "New undo group");
        } else if let Some(last) = next.done.last_mut() {
            let mut steps = inverted;
            steps.append(&mut last.steps);
            last.steps = steps;
            last.time = tr.time();
        }

        next.undone.clear();
        if !appended {
            next.prev_time = tr.time();
            next.prev_closed = closed;
        }
        next.prev_selection = Some(*new.selection());
        next
    }

    /// Moves the event an undo or redo just applied to the opposite stack
    fn swap(
        &self,
        history: &HistoryState,
        tr: &Transaction,
        new: &EditorState,
        redo: bool,
    ) -> HistoryState {
        let Some(inverted) = invert_steps(tr) else {
            return HistoryState::cleared();
        };
        let mut next = history.clone();
        let (from, to) = if redo {
            (&mut next.undone, &mut next.done)
        } else {
            (&mut next.done, &mut next.undone)
        };
        from.pop();
        to.push(HistoryEvent {
            steps: inverted,
            selection_before: *tr.before_selection(),
            time: tr.time(),
        });
        next.prev_time = 0;
        next.prev_closed = false;
        next.prev_selection = Some(*new.selection());
        next
    }
}

impl Plugin for HistoryPlugin {
    fn key(&self) -> &'static str {
        HISTORY_KEY
    }

    fn init(&self, _state: &EditorState) -> PluginValue {
        Arc::new(HistoryState::default())
    }

    fn apply(
        &self,
        tr: &Transaction,
        value: &PluginValue,
        _old: &EditorState,
        new: &EditorState,
    ) -> PluginValue {
        let Some(history) = value.downcast_ref::<HistoryState>() else {
            return value.clone();
        };
        match tr.get_meta(meta::HISTORY).and_then(|v| v.as_str()) {
            Some("undo") => return Arc::new(self.swap(history, tr, new, false)),
            Some("redo") => return Arc::new(self.swap(history, tr, new, true)),
            _ => {}
        }
        if !tr.doc_changed() {
            if tr.meta_bool(meta::CLOSE_HISTORY) && !history.prev_closed {
                let mut next = history.clone();
                next.prev_closed = true;
                return Arc::new(next);
            }
            return value.clone();
        }
        if tr.get_meta(meta::ADD_TO_HISTORY).and_then(|v| v.as_bool()) == Some(false) {
            return Arc::new(HistoryState::cleared());
        }
        Arc::new(self.record(history, tr, new))
    }
}

fn history_of(tr: &Transaction) -> Option<&HistoryState> {
    tr.state().plugin_state::<HistoryState>(HISTORY_KEY)
}

fn replay(tr: &mut Transaction, event: &HistoryEvent, kind: &str) -> Result<bool, CommandError> {
    for step in &event.steps {
        tr.step(step.clone())?;
    }
    let selection = event.selection_before.clamp(tr.doc());
    tr.set_selection(selection);
    tr.set_meta(meta::HISTORY, kind);
    tr.scroll_into_view();
    Ok(true)
}

/// Reverts the newest undo group
pub fn undo(tr: &mut Transaction) -> Result<bool, CommandError> {
    if tr.doc_changed() {
        return Ok(false);
    }
    let Some(event) = history_of(tr).and_then(|h| h.done.last()).cloned() else {
        return Ok(false);
    };
    replay(tr, &event, "undo")
}

/// Re-applies the newest undone group
pub fn redo(tr: &mut Transaction) -> Result<bool, CommandError> {
    if tr.doc_changed() {
        return Ok(false);
    }
    let Some(event) = history_of(tr).and_then(|h| h.undone.last()).cloned() else {
        return Ok(false);
    };
    replay(tr, &event, "redo")
}

pub fn undo_depth(state: &EditorState) -> usize {
    state
        .plugin_state::<HistoryState>(HISTORY_KEY)
        .map_or(0, HistoryState::undo_depth)
}

pub fn redo_depth(state: &EditorState) -> usize {
    state
        .plugin_state::<HistoryState>(HISTORY_KEY)
        .map_or(0, HistoryState::redo_depth)
}

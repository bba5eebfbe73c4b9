//! # Transaction
//!
//! A [`Transform`] that knows the state it started from. On top of the
//! steps it records:
//!
//! - the selection (explicitly set, or the old one mapped through the steps)
//! - stored marks for the next typed text
//! - metadata tags read by plugins and history
//! - a timestamp, a scroll request and follow-up transactions
//!
//! Every `Transform` helper is available through `Deref`.

use crate::selection::Selection;
use crate::state::EditorState;
use quire_model::Mark;
use quire_transform::{Assoc, Mappable, StepError, Transform};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Metadata keys understood by the built-in plugins
pub mod meta {
    /// `true` lets a transaction remove the main image
    pub const ALLOW_MAIN_IMAGE_DELETE: &str = "allowMainImageDelete";
    /// `"undo"` or `"redo"` on transactions built by the history commands
    pub const HISTORY: &str = "history";
    /// `false` keeps a transaction out of the undo history
    pub const ADD_TO_HISTORY: &str = "addToHistory";
    /// `true` starts a new undo group after this transaction
    pub const CLOSE_HISTORY: &str = "closeHistory";
    /// The kind of user input that produced the transaction
    pub const INPUT_TYPE: &str = "inputType";
    /// Set on transactions produced by a plugin's `append_transaction`
    pub const APPENDED_TRANSACTION: &str = "appendedTransaction";
}

/// Builds a transaction to run once the current one has been committed
pub type FollowUp = Arc<dyn Fn(&EditorState) -> Option<Transaction> + Send + Sync>;

#[derive(Clone)]
pub struct Transaction {
    base: EditorState,
    transform: Transform,
    selection: Selection,
    selection_for: usize,
    selection_set: bool,
    stored_marks: Option<Vec<Mark>>,
    stored_marks_for: usize,
    stored_marks_set: bool,
    meta: BTreeMap<String, Value>,
    time: i64,
    scroll: bool,
    follow_ups: Vec<FollowUp>,
}

impl Transaction {
    pub(crate) fn new(base: EditorState) -> Self {
        Transaction {
            transform: Transform::new(base.doc().clone()),
            selection: *base.selection(),
            selection_for: 0,
            selection_set: false,
            stored_marks: base.stored_marks().map(<[Mark]>::to_vec),
            stored_marks_for: 0,
            stored_marks_set: false,
            meta: BTreeMap::new(),
            time: chrono::Utc::now().timestamp_millis(),
            scroll: false,
            follow_ups: Vec::new(),
            base,
        }
    }

    /// The state this transaction was created from
    pub fn state(&self) -> &EditorState {
        &self.base
    }

    pub fn before_selection(&self) -> &Selection {
        self.base.selection()
    }

    /// The selection after all steps so far
    pub fn selection(&self) -> Selection {
        let steps = self.transform.steps().len();
        if self.selection_for == steps {
            return self.selection;
        }
        let mapping = self.transform.mapping().slice(self.selection_for);
        self.selection.map(self.transform.doc(), &mapping)
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self.selection_for = self.transform.steps().len();
        self.selection_set = true;
        self.stored_marks = None;
        self.stored_marks_set = false;
        self
    }

    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    /// Stored marks, valid only until the next step
    pub fn stored_marks(&self) -> Option<&[Mark]> {
        if self.stored_marks_for != self.transform.steps().len() {
            return None;
        }
        self.stored_marks.as_deref()
    }

    pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
        self.stored_marks = marks;
        self.stored_marks_for = self.transform.steps().len();
        self.stored_marks_set = true;
        self
    }

    pub fn add_stored_mark(&mut self, mark: Mark) -> &mut Self {
        let marks = self.current_marks();
        self.set_stored_marks(Some(mark.add_to_set(&marks)))
    }

    pub fn remove_stored_mark(&mut self, mark: &Mark) -> &mut Self {
        let marks = self.current_marks();
        self.set_stored_marks(Some(mark.remove_from_set(&marks)))
    }

    pub fn stored_marks_set(&self) -> bool {
        self.stored_marks_set
    }

    /// Stored marks if any, else the marks at the selection head
    fn current_marks(&self) -> Vec<Mark> {
        if let Some(marks) = self.stored_marks() {
            return marks.to_vec();
        }
        self.transform
            .doc()
            .resolve(self.selection().head())
            .map(|rpos| rpos.marks())
            .unwrap_or_default()
    }

    /// Replaces the selection with `text`, using the stored marks (or the
    /// marks at the selection start) and leaving a cursor after it
    pub fn insert_text(&mut self, text: &str) -> Result<&mut Self, StepError> {
        let sel = self.selection();
        let (from, to) = (sel.from(), sel.to());
        if text.is_empty() {
            if from != to {
                self.transform.delete(from, to)?;
            }
            return Ok(self);
        }
        let marks = match self.stored_marks() {
            Some(marks) => marks.to_vec(),
            None => {
                let rfrom = self.transform.doc().resolve(from)?;
                if from == to {
                    rfrom.marks()
                } else {
                    let rto = self.transform.doc().resolve(to)?;
                    let mut marks = rfrom.marks();
                    marks.retain(|m| m.is_in_set(&rto.marks()) || m.kind().spec().inclusive);
                    marks
                }
            }
        };
        let start = self.transform.steps().len();
        self.transform.insert_text(text, from, to, marks)?;
        let end = self.transform.mapping().slice(start).map(to, Assoc::After);
        self.set_selection(Selection::cursor(end));
        Ok(self)
    }

    /// Removes the selected content
    pub fn delete_selection(&mut self) -> Result<&mut Self, StepError> {
        let sel = self.selection();
        if !sel.empty() {
            let start = self.transform.steps().len();
            self.transform.delete_range(sel.from(), sel.to())?;
            let pos = self
                .transform
                .mapping()
                .slice(start)
                .map(sel.from(), Assoc::Before);
            if let Ok(rpos) = self.transform.doc().resolve(pos) {
                self.set_selection(Selection::near(&rpos, false));
            }
        }
        Ok(self)
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// A boolean tag, `false` when missing
    pub fn meta_bool(&self, key: &str) -> bool {
        self.meta.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn meta(&self) -> &BTreeMap<String, Value> {
        &self.meta
    }

    /// Milliseconds since the Unix epoch
    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn set_time(&mut self, time: i64) -> &mut Self {
        self.time = time;
        self
    }

    pub fn scroll_into_view(&mut self) -> &mut Self {
        self.scroll = true;
        self
    }

    pub fn scrolled_into_view(&self) -> bool {
        self.scroll
    }

    /// Queues a transaction to build and dispatch after this one commits
    pub fn after_commit<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&EditorState) -> Option<Transaction> + Send + Sync + 'static,
    {
        self.follow_ups.push(Arc::new(f));
        self
    }

    pub fn follow_ups(&self) -> &[FollowUp] {
        &self.follow_ups
    }

    pub(crate) fn into_parts(self) -> (Transform, Vec<FollowUp>) {
        (self.transform, self.follow_ups)
    }

    /// True when committing would change nothing
    pub fn is_noop(&self) -> bool {
        !self.transform.doc_changed() && !self.selection_set && !self.stored_marks_set
    }
}

impl Deref for Transaction {
    type Target = Transform;

    fn deref(&self) -> &Transform {
        &self.transform
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("steps", &self.transform.steps())
            .field("selection", &self.selection())
            .field("meta", &self.meta)
            .field("time", &self.time)
            .field("follow_ups", &self.follow_ups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EditorState, StateConfig};
    use quire_model::builders::*;
    use quire_model::{Fragment, MarkKind, Node};

    fn state_with(d: Node, selection: Selection) -> EditorState {
        EditorState::create(StateConfig {
            doc: d,
            selection: Some(selection),
            plugins: Vec::new(),
        })
    }

    #[test]
    fn test_selection_maps_through_steps() {
        let state = state_with(doc(vec![p(vec![txt("abc")])]), Selection::cursor(3));
        let mut tr = state.transaction();
        tr.insert(1, Fragment::from_node(Node::text("xy", Vec::new()))).unwrap();
        assert_eq!(tr.selection(), Selection::cursor(5));
        assert!(!tr.selection_set());
    }

    #[test]
    fn test_explicit_selection_is_mapped_by_later_steps() {
        let state = state_with(doc(vec![p(vec![txt("abc")])]), Selection::cursor(1));
        let mut tr = state.transaction();
        tr.set_selection(Selection::cursor(2));
        tr.insert(1, Fragment::from_node(Node::text("x", Vec::new()))).unwrap();
        assert_eq!(tr.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_insert_text_uses_stored_marks() {
        let state = state_with(doc(vec![p(vec![txt("ab")])]), Selection::cursor(2));
        let mut tr = state.transaction();
        tr.add_stored_mark(Mark::of(MarkKind::Bold));
        tr.insert_text("X").unwrap();
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("a"), bold("X"), txt("b")])]));
        assert_eq!(tr.selection(), Selection::cursor(3));
        assert!(tr.stored_marks().is_none());
    }

    #[test]
    fn test_insert_text_inherits_marks_at_cursor() {
        let state = state_with(doc(vec![p(vec![bold("ab")])]), Selection::cursor(3));
        let mut tr = state.transaction();
        tr.insert_text("c").unwrap();
        assert_eq!(tr.doc(), &doc(vec![p(vec![bold("abc")])]));
    }

    #[test]
    fn test_insert_text_replaces_range() {
        let state = state_with(doc(vec![p(vec![txt("abcd")])]), Selection::text(2, 4));
        let mut tr = state.transaction();
        tr.insert_text("X").unwrap();
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("aXd")])]));
        assert_eq!(tr.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_meta() {
        let state = state_with(doc(vec![p(vec![])]), Selection::cursor(1));
        let mut tr = state.transaction();
        assert!(!tr.meta_bool(meta::CLOSE_HISTORY));
        tr.set_meta(meta::CLOSE_HISTORY, true);
        assert!(tr.meta_bool(meta::CLOSE_HISTORY));
        tr.set_meta(meta::HISTORY, "undo");
        assert_eq!(tr.get_meta(meta::HISTORY), Some(&Value::from("undo")));
    }

    #[test]
    fn test_noop() {
        let state = state_with(doc(vec![p(vec![])]), Selection::cursor(1));
        let mut tr = state.transaction();
        assert!(tr.is_noop());
        tr.set_selection(Selection::cursor(1));
        assert!(!tr.is_noop());
    }
}

//! # Editor
//!
//! Owns the current [`EditorState`] and is the only place transactions are
//! committed. Everything that reads the editor (toolbars, counters, the
//! autosave timer) subscribes and is told after each commit.
//!
//! ## Lifecycle
//!
//! ```text
//! new ─▶ mount(json) ─▶ execute / dispatch ... ─▶ unmount
//!                          │
//!                          ├─ apply: filters, plugin values, appended trs
//!                          ├─ install new state, notify subscribers
//!                          └─ run follow-ups against the committed state
//! ```

use crate::config::EditorConfig;
use crate::errors::{EditorError, UploadError};
use crate::persistence::{SaveHook, SavePayload};
use crate::upload::{Blob, MediaKind, Uploader};
use quire_commands::{
    focus_or_append_paragraph, insert_audio, insert_custom_image, insert_video, set_indent,
    set_link_with_target, set_main_image, Keymap,
};
use quire_model::{doc_from_json_or_default, Attrs, Node, NodeKind};
use quire_state::{
    article_plugins, Command, EditorState, FollowUp, SelectionKind, StateConfig, Transaction,
    TransactionError,
};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, instrument, warn};

/// Follow-up transactions run per dispatch before the rest are dropped
const MAX_FOLLOW_UPS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&EditorState)>;

pub struct Editor {
    config: EditorConfig,
    keymap: Keymap,
    state: Option<EditorState>,
    title: String,

    /// Commits since mount
    version: u64,

    /// Set when the document or title changed since the last save
    dirty: bool,

    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    save_hook: Option<Box<dyn SaveHook>>,
}

impl Editor {
    /// Create an unmounted editor
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            keymap: Keymap::article(),
            state: None,
            title: String::new(),
            version: 0,
            dirty: false,
            listeners: Vec::new(),
            next_listener: 0,
            save_hook: None,
        }
    }

    /// Create the state from stored content. Missing or invalid content
    /// becomes a single empty paragraph.
    pub fn mount(&mut self, content: Option<&Value>, title: impl Into<String>) {
        let doc = doc_from_json_or_default(content);
        let plugins = article_plugins(&self.config.plugin_options());
        self.state = Some(EditorState::create(StateConfig {
            doc,
            selection: None,
            plugins,
        }));
        self.title = title.into();
        self.version = 0;
        self.dirty = false;
        debug!(title = %self.title, "Editor mounted");
        self.notify();
    }

    pub fn unmount(&mut self) {
        if self.state.take().is_some() {
            debug!(version = self.version, "Editor unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&EditorState> {
        self.state.as_ref()
    }

    pub fn doc(&self) -> Option<&Node> {
        self.state.as_ref().map(EditorState::doc)
    }

    pub fn selection_kind(&self) -> SelectionKind {
        self.state
            .as_ref()
            .map_or(SelectionKind::Detached, |state| state.selection().kind())
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if title != self.title {
            self.title = title;
            self.dirty = true;
        }
    }

    /// Runs a selector against the current state
    pub fn select<T>(&self, selector: impl Fn(&EditorState) -> T) -> Option<T> {
        self.state.as_ref().map(selector)
    }

    /// Runs `command` and dispatches what it built. Returns whether it
    /// applied and was committed.
    pub fn execute(&mut self, command: &dyn Command) -> bool {
        let Some(state) = self.state.as_ref() else {
            return false;
        };
        let mut built = None;
        if !command.run(state, Some(&mut |tr: Transaction| built = Some(tr))) {
            return false;
        }
        match built {
            Some(tr) => self.dispatch(tr),
            None => false,
        }
    }

    /// Dry run of `command`. False when nothing is mounted.
    pub fn can_execute(&self, command: &dyn Command) -> bool {
        self.state
            .as_ref()
            .map_or(false, |state| command.run(state, None))
    }

    /// Runs the command bound to `key`. Returns whether the key was handled.
    pub fn handle_key(&mut self, key: &str) -> bool {
        let Some(state) = self.state.as_ref() else {
            return false;
        };
        let mut built = None;
        if !self
            .keymap
            .handle(key, state, Some(&mut |tr: Transaction| built = Some(tr)))
        {
            return false;
        }
        if let Some(tr) = built {
            self.dispatch(tr);
        }
        true
    }

    /// Commits `tr`, then every follow-up it or its appended transactions
    /// queued. Returns false when `tr` itself was not committed.
    #[instrument(skip_all)]
    pub fn dispatch(&mut self, tr: Transaction) -> bool {
        let Some(follow_ups) = self.commit(tr) else {
            return false;
        };
        let mut pending: VecDeque<FollowUp> = follow_ups.into();
        let mut ran = 0;
        while let Some(follow_up) = pending.pop_front() {
            if ran == MAX_FOLLOW_UPS {
                warn!(dropped = pending.len() + 1, "Too many follow-up transactions");
                break;
            }
            ran += 1;
            let Some(state) = self.state.as_ref() else {
                break;
            };
            let Some(tr) = follow_up(state) else {
                continue;
            };
            if let Some(more) = self.commit(tr) {
                pending.extend(more);
            }
        }
        true
    }

    fn commit(&mut self, tr: Transaction) -> Option<Vec<FollowUp>> {
        let Some(state) = self.state.as_ref() else {
            debug!("Dispatch on unmounted editor");
            return None;
        };
        let applied = match state.apply_transaction(tr) {
            Ok(applied) => applied,
            Err(TransactionError::Rejected { plugin }) => {
                debug!(plugin = %plugin, "Transaction rejected");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Transaction failed");
                return None;
            }
        };
        let doc_changed = applied.transactions.iter().any(|tr| tr.doc_changed());
        let follow_ups = applied
            .transactions
            .iter()
            .flat_map(|tr| tr.follow_ups().iter().cloned())
            .collect();
        self.state = Some(applied.state);
        self.version += 1;
        self.dirty |= doc_changed;
        debug!(
            version = self.version,
            transactions = applied.transactions.len(),
            doc_changed,
            "Committed"
        );
        self.notify();
        Some(follow_ups)
    }

    /// Replaces the document from outside the editing flow. The selection
    /// is clamped into the new document.
    pub fn replace_doc(&mut self, content: &Value) -> Result<(), EditorError> {
        let Some(state) = self.state.as_ref() else {
            return Err(EditorError::NotMounted);
        };
        let doc = Node::from_value(content)?;
        if doc.kind() != NodeKind::Doc {
            return Err(EditorError::Document(quire_model::ModelError::InvalidJson(
                format!("expected a doc, found {}", doc.kind().name()),
            )));
        }
        self.state = Some(state.with_doc(doc));
        self.version += 1;
        self.notify();
        Ok(())
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorState) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the listener was subscribed
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(state);
        }
    }

    pub fn save_payload(&self) -> Option<SavePayload> {
        self.state
            .as_ref()
            .map(|state| SavePayload::new(self.title.clone(), state.doc()))
    }

    pub fn set_save_hook(&mut self, hook: impl SaveHook + 'static) {
        self.save_hook = Some(Box::new(hook));
    }

    /// Saves if anything changed since the last save. Returns whether the
    /// hook was called.
    pub fn flush(&mut self) -> Result<bool, EditorError> {
        if !self.dirty {
            return Ok(false);
        }
        let payload = self.save_payload().ok_or(EditorError::NotMounted)?;
        let Some(hook) = self.save_hook.as_mut() else {
            return Ok(false);
        };
        hook.save(&payload)?;
        self.dirty = false;
        debug!(version = self.version, "Saved");
        Ok(true)
    }

    pub fn publish(&mut self) -> Result<(), EditorError> {
        let payload = self.save_payload().ok_or(EditorError::NotMounted)?;
        let Some(hook) = self.save_hook.as_mut() else {
            return Err(EditorError::Save("no save hook installed".to_string()));
        };
        hook.publish(&payload)?;
        self.dirty = false;
        Ok(())
    }

    /// Uploads `blob` and inserts it as `kind` in one transaction. Upload
    /// failures are returned; the document is not touched.
    pub fn insert_uploaded_media(
        &mut self,
        uploader: &dyn Uploader,
        blob: &Blob,
        kind: MediaKind,
    ) -> Result<bool, EditorError> {
        if !self.is_mounted() {
            return Err(EditorError::NotMounted);
        }
        if !kind.accepts(&blob.mime_type) {
            return Err(UploadError::UnsupportedType(blob.mime_type.clone()).into());
        }
        let src = uploader.upload(blob).map_err(|e| {
            warn!(error = %e, name = %blob.name, "Upload failed");
            e
        })?;
        let attrs = Attrs::new().with("src", src);
        let command: Box<dyn Command> = match kind {
            MediaKind::MainImage => Box::new(set_main_image(attrs)),
            MediaKind::Image => Box::new(insert_custom_image(attrs)),
            MediaKind::Video => Box::new(insert_video(attrs)),
            MediaKind::Audio => Box::new(insert_audio(attrs)),
        };
        Ok(self.execute(command.as_ref()))
    }

    /// Links the selection using the configured target
    pub fn set_link(&mut self, href: impl Into<String>) -> bool {
        let target = self.config.link_target.clone();
        self.execute(&set_link_with_target(href.into(), target))
    }

    /// Indents with the configured amount
    pub fn indent(&mut self) -> bool {
        let amount = self.config.indent.clone();
        self.execute(&set_indent(amount))
    }

    /// Clicking below the last block
    pub fn click_tail(&mut self) -> bool {
        self.execute(&focus_or_append_paragraph)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_commands::{insert_text, toggle_bold};
    use quire_model::builders::*;
    use quire_state::Selection;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mounted(d: Node) -> Editor {
        let mut editor = Editor::default();
        editor.mount(Some(&d.to_value()), "Title");
        editor
    }

    #[test]
    fn test_unmounted_editor() {
        let mut editor = Editor::default();
        assert_eq!(editor.selection_kind(), SelectionKind::Detached);
        assert!(!editor.can_execute(&toggle_bold));
        assert!(!editor.execute(&insert_text("x")));
        assert!(editor.save_payload().is_none());
        assert!(matches!(editor.publish(), Err(EditorError::NotMounted)));
    }

    #[test]
    fn test_mount_invalid_content_uses_default() {
        let mut editor = Editor::default();
        editor.mount(Some(&json!({ "type": "nope" })), "");
        assert_eq!(editor.doc(), Some(&doc(vec![p(vec![])])));
        assert_eq!(editor.selection_kind(), SelectionKind::Collapsed);
    }

    #[test]
    fn test_execute_commits_and_marks_dirty() {
        let mut editor = mounted(doc(vec![p(vec![])]));
        assert!(!editor.is_dirty());
        assert!(editor.execute(&insert_text("Hi")));
        assert_eq!(editor.doc(), Some(&doc(vec![p(vec![txt("Hi")])])));
        assert_eq!(editor.version(), 1);
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_selection_only_commit_is_not_dirty() {
        let mut editor = mounted(doc(vec![p(vec![txt("ab")])]));
        let select = |tr: &mut Transaction| -> Result<bool, quire_state::CommandError> {
            tr.set_selection(Selection::text(1, 3));
            Ok(true)
        };
        assert!(editor.execute(&select));
        assert_eq!(editor.selection_kind(), SelectionKind::Range);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_listeners_see_committed_state() {
        let mut editor = mounted(doc(vec![p(vec![])]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = editor.subscribe(move |state| sink.borrow_mut().push(state.doc().clone()));

        editor.execute(&insert_text("a"));
        assert_eq!(*seen.borrow(), vec![doc(vec![p(vec![txt("a")])])]);

        assert!(editor.unsubscribe(id));
        assert!(!editor.unsubscribe(id));
        editor.execute(&insert_text("b"));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_replace_doc_clamps_selection() {
        let mut editor = mounted(doc(vec![p(vec![txt("a long line")])]));
        let to_end = |tr: &mut Transaction| -> Result<bool, quire_state::CommandError> {
            tr.set_selection(Selection::cursor(12));
            Ok(true)
        };
        editor.execute(&to_end);
        editor
            .replace_doc(&doc(vec![p(vec![txt("ab")])]).to_value())
            .unwrap();
        let state = editor.state().unwrap();
        assert!(state.selection().is_valid(state.doc()));
        assert!(editor.replace_doc(&json!({ "type": "paragraph" })).is_err());
    }

    #[test]
    fn test_flush_only_when_dirty() {
        let mut editor = mounted(doc(vec![p(vec![])]));
        let saved = Rc::new(RefCell::new(Vec::new()));
        let sink = saved.clone();
        editor.set_save_hook(move |payload: &SavePayload| -> Result<(), EditorError> {
            sink.borrow_mut().push(payload.clone());
            Ok(())
        });

        assert!(!editor.flush().unwrap());
        editor.execute(&insert_text("x"));
        assert!(editor.flush().unwrap());
        assert!(!editor.flush().unwrap());

        editor.set_title("New title");
        assert!(editor.flush().unwrap());
        let saved = saved.borrow();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].title, "New title");
        assert_eq!(saved[1].content, doc(vec![p(vec![txt("x")])]).to_value());
    }

    #[test]
    fn test_failed_upload_leaves_doc() {
        let mut editor = mounted(doc(vec![p(vec![])]));
        let offline = |blob: &Blob| -> Result<String, UploadError> {
            Err(UploadError::Failed {
                name: blob.name.clone(),
                reason: "offline".to_string(),
            })
        };
        let blob = Blob::new("a.png", "image/png", vec![1]);
        let err = editor
            .insert_uploaded_media(&offline, &blob, MediaKind::Image)
            .unwrap_err();
        assert!(matches!(err, EditorError::ResourceUnavailable(_)));
        assert_eq!(editor.version(), 0);

        let err = editor
            .insert_uploaded_media(&offline, &blob, MediaKind::Video)
            .unwrap_err();
        assert!(matches!(
            err,
            EditorError::ResourceUnavailable(UploadError::UnsupportedType(_))
        ));
    }
}

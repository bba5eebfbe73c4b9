//! Integration tests for the editor container
//!
//! This tests:
//! - Key handling with follow-up transactions committed after the key's own
//! - Upload then insert as one transaction
//! - Save and publish payloads
//! - Derived selector values driven by subscriptions

use quire_commands::{insert_text, toggle_bold};
use quire_editor::{
    selectors, Blob, DataUrlUploader, Derived, Editor, EditorConfig, EditorError, MediaKind,
    SaveHook, SavePayload, Selection, Transaction,
};
use quire_model::builders::*;
use quire_model::{Attrs, Node, NodeKind};
use quire_state::CommandError;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn mounted(d: &Node) -> Editor {
    let mut editor = Editor::new(EditorConfig::default());
    editor.mount(Some(&d.to_value()), "Draft");
    editor
}

fn move_cursor(editor: &mut Editor, pos: usize) {
    let command = move |tr: &mut Transaction| -> Result<bool, CommandError> {
        tr.set_selection(Selection::cursor(pos));
        Ok(true)
    };
    assert!(editor.execute(&command));
}

#[derive(Default, Clone)]
struct Recorder {
    saved: Rc<RefCell<Vec<SavePayload>>>,
    published: Rc<RefCell<Vec<SavePayload>>>,
}

impl SaveHook for Recorder {
    fn save(&mut self, payload: &SavePayload) -> Result<(), EditorError> {
        self.saved.borrow_mut().push(payload.clone());
        Ok(())
    }

    fn publish(&mut self, payload: &SavePayload) -> Result<(), EditorError> {
        self.published.borrow_mut().push(payload.clone());
        Ok(())
    }
}

#[test]
fn test_enter_resets_indent_and_undoes_in_one_step() {
    // 0 <p> 1 a 2 b 3 </p> 4
    let indented = Attrs::new().with("textIndent", "2em");
    let original = doc(vec![p_with(indented.clone(), vec![txt("ab")])]);
    let mut editor = mounted(&original);
    move_cursor(&mut editor, 3);

    let commits = Rc::new(RefCell::new(0));
    let counter = commits.clone();
    editor.subscribe(move |_| *counter.borrow_mut() += 1);

    assert!(editor.handle_key("Enter"));
    assert_eq!(
        editor.doc(),
        Some(&doc(vec![p_with(indented, vec![txt("ab")]), p(vec![])]))
    );
    assert_eq!(*commits.borrow(), 2);

    assert!(editor.handle_key("Ctrl-z"));
    assert_eq!(editor.doc(), Some(&original));
    assert_eq!(*editor.state().unwrap().selection(), Selection::cursor(3));
}

#[test]
fn test_uploaded_main_image_is_inserted_and_protected() {
    let mut editor = mounted(&doc(vec![p(vec![txt("Body")])]));
    let blob = Blob::new("cover.png", "image/png", vec![1, 2, 3]);

    let inserted = editor
        .insert_uploaded_media(&DataUrlUploader, &blob, MediaKind::MainImage)
        .unwrap();
    assert!(inserted);
    let doc_after = editor.doc().unwrap().clone();
    assert_eq!(doc_after.child(0).kind(), NodeKind::MainImage);
    assert_eq!(
        doc_after.child(0).attr("src"),
        Some(&json!("data:image/png;base64,AQID"))
    );
    assert_eq!(editor.select(selectors::has_main_image), Some(true));

    // 0 <img> 1 <p> 2 Body
    move_cursor(&mut editor, 2);
    assert!(editor.handle_key("Backspace"));
    assert_eq!(editor.doc(), Some(&doc_after));
}

#[test]
fn test_save_and_publish_payloads() {
    let original = doc(vec![heading(2, vec![txt("Intro")]), p(vec![txt("Text")])]);
    let mut editor = mounted(&original);
    let recorder = Recorder::default();
    editor.set_save_hook(recorder.clone());

    assert!(!editor.flush().unwrap());
    editor.set_title("Final title");
    assert!(editor.flush().unwrap());

    editor.publish().unwrap();
    let published = recorder.published.borrow();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].title, "Final title");
    assert_eq!(Node::from_value(&published[0].content).unwrap(), original);
    assert_eq!(recorder.saved.borrow().len(), 1);
    assert!(!editor.is_dirty());
}

#[test]
fn test_derived_values_follow_commits() {
    let mut editor = mounted(&doc(vec![p(vec![])]));
    let count = Rc::new(RefCell::new(Derived::new(selectors::character_count)));
    let changes = Rc::new(RefCell::new(Vec::new()));
    let (derived, log) = (count.clone(), changes.clone());
    editor.subscribe(move |state| {
        let mut derived = derived.borrow_mut();
        if derived.update(state) {
            log.borrow_mut().push(*derived.value().unwrap());
        }
    });

    editor.execute(&insert_text("ab"));
    move_cursor(&mut editor, 1);
    editor.execute(&insert_text("c"));
    assert_eq!(*changes.borrow(), vec![2, 3]);

    assert_eq!(editor.select(selectors::has_content), Some(true));
    assert_eq!(editor.select(selectors::can_undo), Some(true));
}

#[test]
fn test_invalid_content_and_detached_commands() {
    let mut editor = Editor::default();
    assert!(!editor.can_execute(&toggle_bold));

    editor.mount(Some(&json!({ "type": "doc", "content": [{ "type": "bogus" }] })), "");
    assert_eq!(editor.doc(), Some(&doc(vec![p(vec![])])));
    assert_eq!(editor.select(selectors::has_content), Some(false));

    editor.unmount();
    assert!(!editor.handle_key("Enter"));
}

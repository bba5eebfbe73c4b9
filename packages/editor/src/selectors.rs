//! # Selectors
//!
//! Pure functions from a state to a value a UI widget needs. [`Derived`]
//! remembers the last value so a subscriber can tell whether it changed.

use quire_commands::{has_main_image as doc_has_main_image, is_block_active, is_mark_active};
use quire_model::{MarkKind, NodeKind};
use quire_state::{character_count as counted, redo_depth, undo_depth, EditorState, Selection};

pub use quire_commands::active_marks;

/// Caches the last value of a selector
pub struct Derived<T> {
    selector: Box<dyn Fn(&EditorState) -> T>,
    last: Option<T>,
}

impl<T: PartialEq> Derived<T> {
    pub fn new(selector: impl Fn(&EditorState) -> T + 'static) -> Self {
        Self {
            selector: Box::new(selector),
            last: None,
        }
    }

    /// Re-runs the selector. Returns whether the value changed.
    pub fn update(&mut self, state: &EditorState) -> bool {
        let next = (self.selector)(state);
        if self.last.as_ref() == Some(&next) {
            return false;
        }
        self.last = Some(next);
        true
    }

    pub fn get(&mut self, state: &EditorState) -> &T {
        let next = (self.selector)(state);
        self.last.insert(next)
    }

    /// The value from the last `update`, if any
    pub fn value(&self) -> Option<&T> {
        self.last.as_ref()
    }
}

/// A non-empty text selection inside textblocks covering visible text
pub fn is_text_selected(state: &EditorState) -> bool {
    let selection = state.selection();
    if !matches!(selection, Selection::Text { .. }) || selection.empty() {
        return false;
    }
    let doc = state.doc();
    let in_textblock = |pos| {
        doc.resolve(pos)
            .map_or(false, |rpos| rpos.parent().is_textblock())
    };
    in_textblock(selection.from())
        && in_textblock(selection.to())
        && !doc
            .text_between(selection.from(), selection.to(), " ", None)
            .trim()
            .is_empty()
}

/// Whether the document has any visible text
pub fn has_content(state: &EditorState) -> bool {
    !state.doc().text_content().trim().is_empty()
}

pub fn has_main_image(state: &EditorState) -> bool {
    doc_has_main_image(state.doc())
}

pub fn character_count(state: &EditorState) -> usize {
    counted(state)
}

pub fn can_undo(state: &EditorState) -> bool {
    undo_depth(state) > 0
}

pub fn can_redo(state: &EditorState) -> bool {
    redo_depth(state) > 0
}

pub fn is_inside_link(state: &EditorState) -> bool {
    is_mark_active(state, MarkKind::Link)
}

/// Block type shown in the toolbar's text-style dropdown
pub fn current_block(state: &EditorState) -> NodeKind {
    [
        NodeKind::Heading,
        NodeKind::CodeBlock,
        NodeKind::Blockquote,
        NodeKind::BulletList,
        NodeKind::OrderedList,
    ]
    .into_iter()
    .find(|kind| is_block_active(state, *kind, None))
    .unwrap_or(NodeKind::Paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use quire_model::Node;
    use quire_state::StateConfig;

    fn state(d: Node, selection: Selection) -> EditorState {
        EditorState::create(StateConfig {
            doc: d,
            selection: Some(selection),
            plugins: Vec::new(),
        })
    }

    #[test]
    fn test_is_text_selected() {
        let d = doc(vec![p(vec![txt("a  b")])]);
        assert!(is_text_selected(&state(d.clone(), Selection::text(1, 3))));
        assert!(!is_text_selected(&state(d.clone(), Selection::text(2, 4))));
        assert!(!is_text_selected(&state(d, Selection::cursor(2))));

        let d = doc(vec![image("i.png"), p(vec![])]);
        assert!(!is_text_selected(&state(d, Selection::Node { anchor: 0, head: 1 })));
    }

    #[test]
    fn test_has_content() {
        assert!(!has_content(&state(doc(vec![p(vec![txt("  ")])]), Selection::cursor(1))));
        assert!(has_content(&state(doc(vec![p(vec![txt(" x ")])]), Selection::cursor(1))));
    }

    #[test]
    fn test_current_block() {
        let s = state(doc(vec![heading(2, vec![txt("T")])]), Selection::cursor(1));
        assert_eq!(current_block(&s), NodeKind::Heading);
        let s = state(doc(vec![ul(vec![li(vec![p(vec![txt("a")])])])]), Selection::cursor(3));
        assert_eq!(current_block(&s), NodeKind::BulletList);
        let s = state(doc(vec![p(vec![txt("a")])]), Selection::cursor(1));
        assert_eq!(current_block(&s), NodeKind::Paragraph);
    }

    #[test]
    fn test_derived_reports_changes() {
        let mut derived = Derived::new(has_content);
        let empty = state(doc(vec![p(vec![])]), Selection::cursor(1));
        assert!(derived.update(&empty));
        assert!(!derived.update(&empty));
        assert_eq!(derived.value(), Some(&false));

        let full = state(doc(vec![p(vec![txt("x")])]), Selection::cursor(1));
        assert!(derived.update(&full));
        assert_eq!(*derived.get(&full), true);
    }
}

//! Mark toggles

use quire_model::{Mark, MarkKind, Node};
use quire_state::{Command, CommandError, EditorState, Selection, Transaction};
use quire_transform::MarkMatch;

/// Whether `mark` can be applied somewhere in `from..to`
fn mark_applies(doc: &Node, from: usize, to: usize) -> bool {
    let mut applies = false;
    doc.nodes_between(from, to, &mut |node, _, _, _| {
        if applies {
            return false;
        }
        applies = node.inline_content() && node.kind().allows_marks();
        true
    });
    applies
}

/// Whether `kind` is active for `selection`: in the stored marks or the
/// marks at a cursor, anywhere in a range
fn mark_active(
    doc: &Node,
    selection: &Selection,
    stored: Option<&[Mark]>,
    kind: MarkKind,
) -> bool {
    if let Some(pos) = selection.cursor_pos() {
        let marks = match stored {
            Some(marks) => marks.to_vec(),
            None => doc.resolve(pos).map(|rpos| rpos.marks()).unwrap_or_default(),
        };
        return marks.iter().any(|mark| mark.kind() == kind);
    }
    doc.range_has_mark(selection.from(), selection.to(), kind)
}

pub fn is_mark_active(state: &EditorState, kind: MarkKind) -> bool {
    mark_active(state.doc(), state.selection(), state.stored_marks(), kind)
}

/// Marks active at the current selection, in canonical order
pub fn active_marks(state: &EditorState) -> Vec<MarkKind> {
    MarkKind::ALL
        .iter()
        .copied()
        .filter(|kind| is_mark_active(state, *kind))
        .collect()
}

/// Adds `mark` to the selection, or removes its kind when any selected
/// text already has it. A cursor toggles the stored marks instead.
pub fn toggle_mark_with(mark: Mark) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let selection = tr.selection();
        let kind = mark.kind();
        match selection {
            Selection::Node { .. } => Ok(false),
            Selection::Text { .. } if selection.empty() => {
                let rpos = tr.doc().resolve(selection.head())?;
                if !rpos.parent().inline_content() || !rpos.parent().kind().allows_marks() {
                    return Ok(false);
                }
                let current = match tr.stored_marks() {
                    Some(marks) => marks.to_vec(),
                    None => rpos.marks(),
                };
                match current.iter().find(|m| m.kind() == kind).cloned() {
                    Some(existing) => tr.remove_stored_mark(&existing),
                    None => tr.add_stored_mark(mark.clone()),
                };
                Ok(true)
            }
            Selection::Text { .. } => {
                let (from, to) = (selection.from(), selection.to());
                if !mark_applies(tr.doc(), from, to) {
                    return Ok(false);
                }
                if tr.doc().range_has_mark(from, to, kind) {
                    tr.remove_mark(from, to, MarkMatch::Kind(kind))?;
                } else {
                    tr.add_mark(from, to, mark.clone())?;
                }
                Ok(true)
            }
        }
    }
}

pub fn toggle_mark(kind: MarkKind) -> impl Command {
    toggle_mark_with(Mark::of(kind))
}

pub fn toggle_bold(tr: &mut Transaction) -> Result<bool, CommandError> {
    toggle_mark(MarkKind::Bold).apply(tr)
}

pub fn toggle_italic(tr: &mut Transaction) -> Result<bool, CommandError> {
    toggle_mark(MarkKind::Italic).apply(tr)
}

pub fn toggle_underline(tr: &mut Transaction) -> Result<bool, CommandError> {
    toggle_mark(MarkKind::Underline).apply(tr)
}

pub fn toggle_strike(tr: &mut Transaction) -> Result<bool, CommandError> {
    toggle_mark(MarkKind::Strike).apply(tr)
}

pub fn toggle_code(tr: &mut Transaction) -> Result<bool, CommandError> {
    toggle_mark(MarkKind::Code).apply(tr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use quire_state::StateConfig;

    fn state(d: Node, selection: Selection) -> EditorState {
        EditorState::create(StateConfig {
            doc: d,
            selection: Some(selection),
            plugins: Vec::new(),
        })
    }

    fn apply(state: &EditorState, command: impl Command) -> EditorState {
        let mut out = None;
        assert!(command.run(state, Some(&mut |tr: Transaction| out = Some(tr))));
        state.apply(out.unwrap()).unwrap()
    }

    #[test]
    fn test_toggle_bold_range_twice_restores() {
        let s = state(doc(vec![p(vec![txt("hello")])]), Selection::text(1, 4));
        let bolded = apply(&s, toggle_bold);
        assert_eq!(bolded.doc(), &doc(vec![p(vec![bold("hel"), txt("lo")])]));
        assert!(is_mark_active(&bolded, MarkKind::Bold));

        let restored = apply(&bolded, toggle_bold);
        assert_eq!(restored.doc(), s.doc());
    }

    #[test]
    fn test_partial_mark_is_removed() {
        let s = state(doc(vec![p(vec![bold("ab"), txt("cd")])]), Selection::text(2, 4));
        let next = apply(&s, toggle_bold);
        assert_eq!(next.doc(), &doc(vec![p(vec![bold("a"), txt("bcd")])]));
    }

    #[test]
    fn test_cursor_toggles_stored_marks() {
        let s = state(doc(vec![p(vec![txt("ab")])]), Selection::cursor(2));
        let next = apply(&s, toggle_italic);
        assert_eq!(next.doc(), s.doc());
        assert_eq!(next.stored_marks(), Some(&[Mark::of(MarkKind::Italic)][..]));
        assert!(is_mark_active(&next, MarkKind::Italic));

        let back = apply(&next, toggle_italic);
        assert_eq!(back.stored_marks(), Some(&[][..]));
    }

    #[test]
    fn test_not_applicable_in_code_block_or_node_selection() {
        let s = state(doc(vec![code_block("let x")]), Selection::text(1, 4));
        assert!(!toggle_bold.run(&s, None));

        let s = state(
            doc(vec![hr(), p(vec![txt("a")])]),
            Selection::Node { anchor: 0, head: 1 },
        );
        assert!(!toggle_bold.run(&s, None));
    }

    #[test]
    fn test_active_marks() {
        let s = state(
            doc(vec![p(vec![marked(
                "ab",
                vec![Mark::of(MarkKind::Bold), Mark::of(MarkKind::Underline)],
            )])]),
            Selection::text(1, 3),
        );
        assert_eq!(active_marks(&s), vec![MarkKind::Bold, MarkKind::Underline]);
    }
}

//! Colors, alignment, indentation and clearing formatting

use crate::lists::{lift_list_item, sink_list_item};
use quire_model::{Mark, MarkKind, Node, NodeKind};
use quire_state::{Command, CommandError, Selection, Transaction};
use quire_transform::{can_change_type, MarkMatch};
use serde_json::Value;

pub const TEXT_ALIGNMENTS: [&str; 4] = ["left", "center", "right", "justify"];

/// Marks the cleared highlight color
pub const TRANSPARENT: &str = "transparent";

fn text_range(tr: &Transaction) -> Option<(usize, usize)> {
    let selection = tr.selection();
    match selection {
        Selection::Text { .. } if !selection.empty() => Some((selection.from(), selection.to())),
        _ => None,
    }
}

/// Positions of the nodes in `from..to` that `want` accepts, outermost first
fn matching_nodes(doc: &Node, from: usize, to: usize, want: impl Fn(&Node) -> bool) -> Vec<usize> {
    let mut found = Vec::new();
    doc.nodes_between(from, to, &mut |node, pos, _, _| {
        if want(node) {
            found.push(pos);
        }
        !node.is_textblock()
    });
    found
}

/// Colors the selected text
pub fn set_color(color: impl Into<String>) -> impl Command {
    let color = color.into();
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let Some((from, to)) = text_range(tr) else {
            return Ok(false);
        };
        tr.add_mark(from, to, Mark::colored(MarkKind::TextStyle, color.as_str()))?;
        Ok(true)
    }
}

pub fn unset_color(tr: &mut Transaction) -> Result<bool, CommandError> {
    let Some((from, to)) = text_range(tr) else {
        return Ok(false);
    };
    if !tr.doc().range_has_mark(from, to, MarkKind::TextStyle) {
        return Ok(false);
    }
    tr.remove_mark(from, to, MarkMatch::Kind(MarkKind::TextStyle))?;
    Ok(true)
}

/// Highlights the selected text in `color`. Transparent, or the color
/// already applied, removes the highlight.
pub fn toggle_highlight(color: impl Into<String>) -> impl Command {
    let color = color.into();
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let Some((from, to)) = text_range(tr) else {
            return Ok(false);
        };
        let mark = Mark::colored(MarkKind::Highlight, color.as_str());
        let mut already = false;
        tr.doc().nodes_between(from, to, &mut |node, _, _, _| {
            already |= node.is_text() && mark.is_in_set(node.marks());
            true
        });
        if color == TRANSPARENT || already {
            if !tr.doc().range_has_mark(from, to, MarkKind::Highlight) {
                return Ok(false);
            }
            tr.remove_mark(from, to, MarkMatch::Kind(MarkKind::Highlight))?;
        } else {
            tr.add_mark(from, to, mark.clone())?;
        }
        Ok(true)
    }
}

/// Aligns every selected block that supports alignment
pub fn set_text_align(align: impl Into<String>) -> impl Command {
    let align = align.into();
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        if !TEXT_ALIGNMENTS.contains(&align.as_str()) {
            return Err(CommandError::InvalidArgument(format!(
                "unknown alignment '{align}'"
            )));
        }
        let selection = tr.selection();
        let targets = matching_nodes(tr.doc(), selection.from(), selection.to(), |node| {
            node.kind().has_attr("textAlign")
                && node.attr("textAlign").and_then(Value::as_str) != Some(align.as_str())
        });
        if targets.is_empty() {
            return Ok(false);
        }
        for pos in targets {
            tr.set_node_attr(pos, "textAlign", align.as_str())?;
        }
        Ok(true)
    }
}

fn in_list_item(tr: &Transaction) -> Result<bool, CommandError> {
    let rpos = tr.doc().resolve(tr.selection().from())?;
    Ok((1..=rpos.depth()).any(|d| rpos.node(d).kind() == NodeKind::ListItem))
}

fn set_paragraph_indent(tr: &mut Transaction, value: Value) -> Result<bool, CommandError> {
    let selection = tr.selection();
    let targets = matching_nodes(tr.doc(), selection.from(), selection.to(), |node| {
        node.kind() == NodeKind::Paragraph && node.attr("textIndent") != Some(&value)
    });
    if targets.is_empty() {
        return Ok(false);
    }
    for pos in targets {
        tr.set_node_attr(pos, "textIndent", value.clone())?;
    }
    Ok(true)
}

/// Indents the selection: list items nest one level, paragraphs get a
/// first-line indent of `value`
pub fn set_indent(value: impl Into<String>) -> impl Command {
    let value = value.into();
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        if in_list_item(tr)? {
            return sink_list_item(tr);
        }
        set_paragraph_indent(tr, Value::String(value.clone()))
    }
}

pub fn unset_indent(tr: &mut Transaction) -> Result<bool, CommandError> {
    if in_list_item(tr)? {
        return lift_list_item(tr);
    }
    set_paragraph_indent(tr, Value::Null)
}

/// Strips every mark from the selection and turns its textblocks into
/// plain paragraphs
pub fn clear_formatting(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    let (from, to) = (selection.from(), selection.to());
    let mut has_marks = false;
    tr.doc().nodes_between(from, to, &mut |node, _, _, _| {
        has_marks |= node.is_text() && !node.marks().is_empty();
        true
    });
    let blocks = matching_nodes(tr.doc(), from, to, |node| {
        node.is_textblock() && node.kind() != NodeKind::Paragraph
    });
    let blocks: Vec<usize> = blocks
        .into_iter()
        .filter(|pos| can_change_type(tr.doc(), *pos, NodeKind::Paragraph))
        .collect();
    if !has_marks && blocks.is_empty() {
        return Ok(false);
    }
    if has_marks {
        tr.remove_mark(from, to, MarkMatch::All)?;
    }
    for pos in blocks {
        // mark removal keeps positions stable
        tr.set_node_markup(pos, NodeKind::Paragraph, None)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use quire_model::Attrs;
    use quire_state::{EditorState, StateConfig};

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
    fn test_set_color_needs_range() {
        let s = state(doc(vec![p(vec![txt("ab")])]), Selection::cursor(1));
        assert!(!set_color("#f00").run(&s, None));

        let s = state(doc(vec![p(vec![txt("ab")])]), Selection::text(1, 3));
        let next = apply(&s, set_color("#f00"));
        assert_eq!(
            next.doc(),
            &doc(vec![p(vec![marked("ab", vec![Mark::colored(MarkKind::TextStyle, "#f00")])])])
        );
        let cleared = apply(&next, unset_color);
        assert_eq!(cleared.doc(), s.doc());
    }

    #[test]
    fn test_highlight_transparent_clears() {
        let s = state(doc(vec![p(vec![txt("ab")])]), Selection::text(1, 3));
        let lit = apply(&s, toggle_highlight("#ff0"));
        assert!(lit.doc().range_has_mark(1, 3, MarkKind::Highlight));
        let cleared = apply(&lit, toggle_highlight(TRANSPARENT));
        assert_eq!(cleared.doc(), s.doc());
        assert!(!toggle_highlight(TRANSPARENT).run(&cleared, None));
    }

    #[test]
    fn test_text_align_applies_to_all_selected_blocks() {
        let s = state(
            doc(vec![p(vec![txt("a")]), heading(2, vec![txt("b")])]),
            Selection::text(1, 5),
        );
        let next = apply(&s, set_text_align("center"));
        next.doc().descendants(&mut |node, _, _, _| {
            if node.is_textblock() && node.kind().has_attr("textAlign") {
                assert_eq!(node.attr("textAlign").and_then(Value::as_str), Some("center"));
            }
            true
        });
        assert!(!set_text_align("diagonal").run(&s, None));
    }

    #[test]
    fn test_indent_paragraph_and_back() {
        let s = state(doc(vec![p(vec![txt("a")])]), Selection::cursor(1));
        let indented = apply(&s, set_indent("2em"));
        assert_eq!(
            indented.doc(),
            &doc(vec![p_with(
                Attrs::new().with("textIndent", "2em"),
                vec![txt("a")]
            )])
        );
        let back = apply(&indented, unset_indent);
        assert_eq!(back.doc(), s.doc());
        assert!(!unset_indent.run(&back, None));
    }

    #[test]
    fn test_clear_formatting() {
        let s = state(
            doc(vec![heading(2, vec![bold("a")]), p(vec![italic("b")])]),
            Selection::text(1, 5),
        );
        let next = apply(&s, clear_formatting);
        assert_eq!(
            next.doc(),
            &doc(vec![p(vec![txt("a")]), p(vec![txt("b")])])
        );
    }
}

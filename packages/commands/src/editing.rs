//! # Text editing commands
//!
//! Typing, deleting, splitting and joining blocks, and selection helpers.
//!
//! ## Joining
//!
//! Backspace at the start of a block (or Delete at its end) looks for the
//! "cut": the closest position between the block's ancestor and the
//! sibling before (after) it. Then, in order:
//!
//! 1. compatible neighbours are joined, or an empty one is dropped
//! 2. a textblock is merged into the deepest textblock on the other side
//! 3. an empty block next to a selectable node is deleted
//! 4. an atom on the other side is deleted
//!
//! Without a cut the block is lifted out of its parent.

use quire_model::{Fragment, Node, NodeKind, ResolvedPos, Slice};
use quire_state::{meta, Command, CommandError, Selection, Transaction, Typing};
use quire_transform::{can_join, can_split, lift_target, Assoc, Mappable, ReplaceAroundStep, Step, Wrapper};
use serde_json::Value;
use tracing::trace;

/// Types `text` over the selection
pub fn insert_text(text: impl Into<String>) -> impl Command {
    let text = text.into();
    Typing(move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let selection = tr.selection();
        if text.is_empty() || matches!(selection, Selection::Node { .. }) {
            return Ok(false);
        }
        let rpos = tr.doc().resolve(selection.from())?;
        if !rpos.parent().inline_content() {
            return Ok(false);
        }
        tr.insert_text(&text)?;
        tr.set_meta(meta::INPUT_TYPE, "insertText");
        Ok(true)
    })
}

pub fn delete_selection(tr: &mut Transaction) -> Result<bool, CommandError> {
    if tr.selection().empty() {
        return Ok(false);
    }
    tr.delete_selection()?;
    tr.scroll_into_view();
    Ok(true)
}

/// Deletes the character (or inline node) before the cursor
pub fn delete_char_backward(tr: &mut Transaction) -> Result<bool, CommandError> {
    let Some(pos) = tr.selection().cursor_pos() else {
        return Ok(false);
    };
    let rpos = tr.doc().resolve(pos)?;
    if !rpos.parent().inline_content() || rpos.parent_offset() == 0 {
        return Ok(false);
    }
    tr.delete(pos - 1, pos)?;
    tr.set_selection(Selection::cursor(pos - 1));
    tr.set_meta(meta::INPUT_TYPE, "deleteContentBackward");
    Ok(true)
}

/// Deletes the character (or inline node) after the cursor
pub fn delete_char_forward(tr: &mut Transaction) -> Result<bool, CommandError> {
    let Some(pos) = tr.selection().cursor_pos() else {
        return Ok(false);
    };
    let rpos = tr.doc().resolve(pos)?;
    if !rpos.parent().inline_content() || rpos.parent_offset() == rpos.parent().content().size() {
        return Ok(false);
    }
    tr.delete(pos, pos + 1)?;
    tr.set_selection(Selection::cursor(pos));
    tr.set_meta(meta::INPUT_TYPE, "deleteContentForward");
    Ok(true)
}

fn default_block(parent: &Node) -> Option<NodeKind> {
    parent
        .kind()
        .content()
        .accepts(NodeKind::Paragraph)
        .then_some(NodeKind::Paragraph)
}

/// Splits the textblock at the selection. At the end of a block the new
/// block is a paragraph.
pub fn split_block(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    let rfrom = tr.doc().resolve(selection.from())?;
    let rto = tr.doc().resolve(selection.to())?;

    if let Some(node) = selection.selected_node(tr.doc()) {
        if !node.is_block() || rfrom.parent_offset() == 0 || !can_split(tr.doc(), rfrom.pos(), 1, None) {
            return Ok(false);
        }
        tr.split(rfrom.pos(), 1, None)?;
        tr.scroll_into_view();
        return Ok(true);
    }
    let depth = rfrom.depth();
    if depth == 0 || !rfrom.parent().is_textblock() {
        return Ok(false);
    }

    let base = tr.steps().len();
    let at_end = rto.parent_offset() == rto.parent().content().size();
    let default = default_block(rfrom.node(depth - 1));
    tr.delete_selection()?;
    let pos = tr.mapping().slice(base).map(rfrom.pos(), Assoc::After);
    let default_type = default.map(|kind| vec![Some(Wrapper::new(kind, None))]);
    let mut types = if at_end { default_type.clone() } else { None };
    let mut can = can_split(tr.doc(), pos, 1, types.as_deref());
    if types.is_none() && !can && can_split(tr.doc(), pos, 1, default_type.as_deref()) {
        types = default_type;
        can = true;
    }
    if !can {
        return Err(CommandError::NotApplicable("block cannot be split here"));
    }
    tr.split(pos, 1, types.as_deref())?;

    // a split at the very start leaves an empty block behind, which
    // becomes the default type
    if !at_end && rfrom.parent_offset() == 0 && Some(rfrom.parent().kind()) != default {
        if let Some(kind) = default {
            let first = tr.mapping().slice(base).map(rfrom.before(depth), Assoc::After);
            let rfirst = tr.doc().resolve(first)?;
            let index = rfirst.index(rfirst.depth());
            if rfrom.node(depth - 1).can_replace_with(index, index + 1, kind) {
                tr.set_node_markup(first, kind, None)?;
            }
        }
    }
    tr.scroll_into_view();
    Ok(true)
}

/// Which attribute a follow-up resets on the paragraph holding the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reset {
    /// The indent when there is one, the alignment otherwise
    IndentOrAlign,
    Align,
}

/// Queues a follow-up that resets an attribute the new paragraph inherited
/// from the block it was split from or joined into
fn reset_paragraph_attrs(tr: &mut Transaction, reset: Reset) {
    tr.after_commit(move |state| {
        let pos = state.selection().cursor_pos()?;
        let rpos = state.doc().resolve(pos).ok()?;
        let parent = rpos.parent();
        if parent.kind() != NodeKind::Paragraph || rpos.depth() == 0 {
            return None;
        }
        let indented = parent.attr("textIndent").map_or(false, |v| !v.is_null());
        let attrs = if reset == Reset::IndentOrAlign && indented {
            parent.attrs().clone().with("textIndent", Value::Null)
        } else if parent.attr("textAlign").and_then(Value::as_str) != Some("left") {
            parent.attrs().clone().with("textAlign", "left")
        } else {
            return None;
        };
        let mut follow_up = state.transaction();
        follow_up.set_node_attrs(rpos.before(rpos.depth()), attrs).ok()?;
        follow_up.set_meta(meta::APPENDED_TRANSACTION, true);
        Some(follow_up)
    });
}

/// [`split_block`] for paragraphs, then drops the indent (or alignment)
/// the new paragraph inherited
pub fn split_paragraph(tr: &mut Transaction) -> Result<bool, CommandError> {
    let rpos = tr.doc().resolve(tr.selection().from())?;
    if rpos.parent().kind() != NodeKind::Paragraph {
        return Ok(false);
    }
    if !split_block(tr)? {
        return Ok(false);
    }
    reset_paragraph_attrs(tr, Reset::IndentOrAlign);
    Ok(true)
}

/// [`join_backward`] from the start of a paragraph, resetting the joined
/// paragraph's alignment. Always handles the key there, even when nothing
/// can be joined.
pub fn join_paragraph_backward(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    let Some(pos) = selection.cursor_pos() else {
        return Ok(false);
    };
    let rpos = tr.doc().resolve(pos)?;
    if rpos.parent().kind() != NodeKind::Paragraph || rpos.parent_offset() > 0 {
        return Ok(false);
    }
    if join_backward(tr)? {
        reset_paragraph_attrs(tr, Reset::Align);
    }
    Ok(true)
}

/// Inserts a newline in a code block
pub fn newline_in_code(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    let rfrom = tr.doc().resolve(selection.from())?;
    let rto = tr.doc().resolve(selection.to())?;
    if !rfrom.parent().kind().spec().code || !rfrom.same_parent(&rto) {
        return Ok(false);
    }
    tr.insert_text("\n")?;
    tr.scroll_into_view();
    Ok(true)
}

/// Replaces the selection with a hard break, or a newline in code
pub fn insert_hard_break(tr: &mut Transaction) -> Result<bool, CommandError> {
    if newline_in_code(tr)? {
        return Ok(true);
    }
    let selection = tr.selection();
    if matches!(selection, Selection::Node { .. }) {
        return Ok(false);
    }
    let rfrom = tr.doc().resolve(selection.from())?;
    if !rfrom.parent().kind().content().accepts(NodeKind::HardBreak) {
        return Ok(false);
    }
    let (from, to) = (selection.from(), selection.to());
    let marks = rfrom.marks();
    let hard_break = Node::new(NodeKind::HardBreak, None, Fragment::empty(), marks);
    tr.replace_with(from, to, Fragment::from_node(hard_break))?;
    tr.set_selection(Selection::cursor(from + 1));
    tr.scroll_into_view();
    Ok(true)
}

/// Selects all text in the document
pub fn select_all(tr: &mut Transaction) -> Result<bool, CommandError> {
    let doc = tr.doc().clone();
    let size = doc.content().size();
    let start = Selection::find_from(&doc.resolve(0)?, true, true);
    let end = Selection::find_from(&doc.resolve(size)?, false, true);
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(false);
    };
    let selection = Selection::text(start.from(), end.to());
    if selection == tr.selection() {
        return Ok(false);
    }
    tr.set_selection(selection);
    Ok(true)
}

/// Selects the node starting at `pos`
pub fn select_node(pos: usize) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let Some(selection) = Selection::node(tr.doc(), pos) else {
            return Ok(false);
        };
        tr.set_selection(selection);
        Ok(true)
    }
}

/// Puts the cursor in the trailing empty paragraph, appending one when the
/// article does not end with one
pub fn focus_or_append_paragraph(tr: &mut Transaction) -> Result<bool, CommandError> {
    let size = tr.doc().content().size();
    let trailing_empty = tr
        .doc()
        .last_child()
        .map_or(false, |last| last.kind() == NodeKind::Paragraph && last.content().size() == 0);
    if trailing_empty {
        tr.set_selection(Selection::cursor(size - 1));
    } else {
        tr.insert(size, Fragment::from_node(Node::fill(NodeKind::Paragraph, None)))?;
        tr.set_selection(Selection::cursor(size + 1));
    }
    tr.scroll_into_view();
    Ok(true)
}

fn textblock_at(node: &Node, start: bool, only: bool) -> bool {
    let mut current = Some(node);
    while let Some(node) = current {
        if node.is_textblock() {
            return true;
        }
        if only && node.child_count() != 1 {
            return false;
        }
        current = if start { node.first_child() } else { node.last_child() };
    }
    false
}

fn is_selectable(node: &Node) -> bool {
    node.kind().spec().selectable && !node.is_text()
}

fn cut_before(rpos: &ResolvedPos) -> Option<ResolvedPos> {
    if rpos.parent().kind().spec().isolating {
        return None;
    }
    for i in (0..rpos.depth()).rev() {
        if rpos.index(i) > 0 {
            return rpos.doc().resolve(rpos.before(i + 1)).ok();
        }
        if rpos.node(i).kind().spec().isolating {
            break;
        }
    }
    None
}

fn cut_after(rpos: &ResolvedPos) -> Option<ResolvedPos> {
    if rpos.parent().kind().spec().isolating {
        return None;
    }
    for i in (0..rpos.depth()).rev() {
        let parent = rpos.node(i);
        if rpos.index(i) + 1 < parent.child_count() {
            return rpos.doc().resolve(rpos.after(i + 1)).ok();
        }
        if parent.kind().spec().isolating {
            break;
        }
    }
    None
}

/// Joins the nodes around `cut`, or drops the one before when it is empty
fn join_maybe_clear(tr: &mut Transaction, cut: &ResolvedPos) -> Result<bool, CommandError> {
    let (Some(before), Some(after)) = (cut.node_before(), cut.node_after()) else {
        return Ok(false);
    };
    let index = cut.index(cut.depth());
    let parent = cut.parent();
    if !before.kind().compatible_content(after.kind()) {
        return Ok(false);
    }
    if before.content().size() == 0 && parent.can_replace(index - 1, index, &Fragment::empty()) {
        tr.delete(cut.pos() - before.node_size(), cut.pos())?;
        return Ok(true);
    }
    if !parent.can_replace(index, index + 1, &Fragment::empty())
        || !(after.is_textblock() || can_join(tr.doc(), cut.pos()))
    {
        return Ok(false);
    }
    tr.join(cut.pos(), 1)?;
    Ok(true)
}

/// The joining steps shared by both directions
fn delete_barrier(tr: &mut Transaction, cut: &ResolvedPos, forward: bool) -> Result<bool, CommandError> {
    let (Some(before), Some(after)) = (cut.node_before(), cut.node_after()) else {
        return Ok(false);
    };
    let isolated = before.kind().spec().isolating || after.kind().spec().isolating;
    if !isolated && join_maybe_clear(tr, cut)? {
        return Ok(true);
    }
    let index = cut.index(cut.depth());
    let can_del_after = !isolated && cut.parent().can_replace(index, index + 1, &Fragment::empty());

    if !(after.kind().spec().isolating || (forward && isolated)) {
        if let Some(sel_after) = Selection::find_from(cut, true, false) {
            let rfrom = tr.doc().resolve(sel_after.from())?;
            let rto = tr.doc().resolve(sel_after.to())?;
            if let Some(range) = rfrom.block_range(&rto, None) {
                if let Some(target) = lift_target(&range) {
                    if target >= cut.depth() {
                        tr.lift(&range, target)?;
                        return Ok(true);
                    }
                }
            }
        }
    }

    if can_del_after && textblock_at(&after, true, true) && textblock_at(&before, false, false) {
        let mut wrap = vec![before.clone()];
        while let Some(last) = wrap.last().filter(|n| !n.is_textblock()).and_then(|n| n.last_child()) {
            let last = last.clone();
            wrap.push(last);
        }
        let mut after_text = after.clone();
        let mut after_depth = 1;
        while !after_text.is_textblock() {
            let Some(first) = after_text.first_child().cloned() else {
                return Ok(false);
            };
            after_text = first;
            after_depth += 1;
        }
        let Some(at) = wrap.last() else {
            return Ok(false);
        };
        if at.can_replace(at.child_count(), at.child_count(), after_text.content()) {
            let mut end = Fragment::empty();
            for node in wrap.iter().rev() {
                end = Fragment::from_node(node.copy(end));
            }
            let pos = cut.pos();
            trace!(depth = wrap.len(), "Merging textblock across the cut");
            tr.step(Step::ReplaceAround(ReplaceAroundStep::new(
                pos - wrap.len(),
                pos + after.node_size(),
                pos + after_depth,
                pos + after.node_size() - after_depth,
                Slice::new(end, wrap.len(), 0),
                0,
                true,
            )))?;
            return Ok(true);
        }
    }
    Ok(false)
}

fn lift_block(tr: &mut Transaction, rpos: &ResolvedPos) -> Result<bool, CommandError> {
    let Some(range) = rpos.block_range(rpos, None) else {
        return Ok(false);
    };
    let Some(target) = lift_target(&range) else {
        return Ok(false);
    };
    tr.lift(&range, target)?;
    Ok(true)
}

/// Backspace at the start of a textblock
pub fn join_backward(tr: &mut Transaction) -> Result<bool, CommandError> {
    let Some(pos) = tr.selection().cursor_pos() else {
        return Ok(false);
    };
    let cursor = tr.doc().resolve(pos)?;
    if cursor.parent_offset() > 0 || !cursor.parent().is_textblock() {
        return Ok(false);
    }
    let Some(cut) = cut_before(&cursor) else {
        let lifted = lift_block(tr, &cursor)?;
        if lifted {
            tr.scroll_into_view();
        }
        return Ok(lifted);
    };
    let Some(before) = cut.node_before() else {
        return Ok(false);
    };
    if delete_barrier(tr, &cut, false)? {
        tr.scroll_into_view();
        return Ok(true);
    }

    if cursor.parent().content().size() == 0
        && (textblock_at(&before, false, false) || is_selectable(&before))
    {
        let mut depth = cursor.depth();
        loop {
            let parent = cursor.node(depth - 1);
            let index = cursor.index(depth - 1);
            if parent.can_replace(index, index + 1, &Fragment::empty()) {
                let base = tr.steps().len();
                tr.delete(cursor.before(depth), cursor.after(depth))?;
                let selection = if textblock_at(&before, false, false) {
                    let mapped = tr.mapping().slice(base).map(cut.pos(), Assoc::Before);
                    Selection::find_from(&tr.doc().resolve(mapped)?, false, false)
                } else {
                    Selection::node(tr.doc(), cut.pos() - before.node_size())
                };
                if let Some(selection) = selection {
                    tr.set_selection(selection);
                }
                tr.scroll_into_view();
                return Ok(true);
            }
            if depth == 1 || cursor.node(depth - 1).child_count() > 1 {
                break;
            }
            depth -= 1;
        }
    }

    if before.is_atom() && cut.depth() + 1 == cursor.depth() {
        tr.delete(cut.pos() - before.node_size(), cut.pos())?;
        tr.scroll_into_view();
        return Ok(true);
    }
    Ok(false)
}

/// Delete at the end of a textblock
pub fn join_forward(tr: &mut Transaction) -> Result<bool, CommandError> {
    let Some(pos) = tr.selection().cursor_pos() else {
        return Ok(false);
    };
    let cursor = tr.doc().resolve(pos)?;
    if !cursor.parent().is_textblock() || cursor.parent_offset() < cursor.parent().content().size() {
        return Ok(false);
    }
    let Some(cut) = cut_after(&cursor) else {
        return Ok(false);
    };
    let Some(after) = cut.node_after() else {
        return Ok(false);
    };
    if delete_barrier(tr, &cut, true)? {
        tr.scroll_into_view();
        return Ok(true);
    }

    if cursor.parent().content().size() == 0
        && (textblock_at(&after, true, false) || is_selectable(&after))
    {
        let depth = cursor.depth();
        let parent = cursor.node(depth - 1);
        let index = cursor.index(depth - 1);
        if parent.can_replace(index, index + 1, &Fragment::empty()) {
            let base = tr.steps().len();
            tr.delete(cursor.before(depth), cursor.after(depth))?;
            let mapped = tr.mapping().slice(base).map(cut.pos(), Assoc::After);
            let selection = if textblock_at(&after, true, false) {
                Selection::find_from(&tr.doc().resolve(mapped)?, true, false)
            } else {
                Selection::node(tr.doc(), mapped)
            };
            if let Some(selection) = selection {
                tr.set_selection(selection);
            }
            tr.scroll_into_view();
            return Ok(true);
        }
    }

    if after.is_atom() && cut.depth() + 1 == cursor.depth() {
        tr.delete(cut.pos(), cut.pos() + after.node_size())?;
        tr.scroll_into_view();
        return Ok(true);
    }
    Ok(false)
}

/// Backspace and Delete must not remove the main image through a join
pub(crate) fn guards_main_image(tr: &Transaction, forward: bool) -> Result<bool, CommandError> {
    let Some(pos) = tr.selection().cursor_pos() else {
        return Ok(false);
    };
    let cursor = tr.doc().resolve(pos)?;
    let cut = if forward {
        if cursor.parent_offset() < cursor.parent().content().size() {
            return Ok(false);
        }
        cut_after(&cursor).and_then(|cut| cut.node_after())
    } else {
        if cursor.parent_offset() > 0 {
            return Ok(false);
        }
        cut_before(&cursor).and_then(|cut| cut.node_before())
    };
    Ok(cut.map_or(false, |node| node.kind() == NodeKind::MainImage))
}

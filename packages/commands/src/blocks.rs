//! Block type commands: headings, quotes, code blocks, wrapping and lifting

use quire_model::{Attrs, Node, NodeKind, HEADING_LEVELS};
use quire_state::{Command, CommandError, EditorState, Selection, Transaction};
use quire_transform::{can_change_type, find_wrapping, lift_target};

fn attrs_match(node: &Node, attrs: Option<&Attrs>) -> bool {
    attrs.map_or(true, |attrs| {
        attrs.iter().all(|(name, value)| node.attr(name) == Some(value))
    })
}

/// Whether a `kind` ancestor of the selection start carries `attrs`
pub fn block_active(doc: &Node, selection: &Selection, kind: NodeKind, attrs: Option<&Attrs>) -> bool {
    let Ok(rpos) = doc.resolve(selection.from()) else {
        return false;
    };
    if let Some(node) = selection.selected_node(doc) {
        if node.kind() == kind && attrs_match(&node, attrs) {
            return true;
        }
    }
    (1..=rpos.depth())
        .rev()
        .map(|d| rpos.node(d))
        .any(|node| node.kind() == kind && attrs_match(node, attrs))
}

pub fn is_block_active(state: &EditorState, kind: NodeKind, attrs: Option<&Attrs>) -> bool {
    block_active(state.doc(), state.selection(), kind, attrs)
}

/// Turns the selected textblocks into `kind`
pub fn set_block_type(kind: NodeKind, attrs: Option<Attrs>) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let selection = tr.selection();
        let (from, to) = (selection.from(), selection.to());
        let mut applicable = false;
        {
            let doc = tr.doc();
            doc.nodes_between(from, to, &mut |node, pos, _, _| {
                if applicable {
                    return false;
                }
                if !node.is_textblock() {
                    return true;
                }
                applicable =
                    !node.has_markup(kind, attrs.as_ref()) && can_change_type(doc, pos, kind);
                false
            });
        }
        if !applicable {
            return Ok(false);
        }
        tr.set_block_type(from, to, kind, attrs.as_ref())?;
        Ok(true)
    }
}

/// Heading of `level`, or back to a paragraph when it already is one
pub fn toggle_heading(level: i64) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        if !HEADING_LEVELS.contains(&level) {
            return Err(CommandError::InvalidArgument(format!(
                "heading level {level} out of range"
            )));
        }
        let attrs = Attrs::new().with("level", level);
        let selection = tr.selection();
        if block_active(tr.doc(), &selection, NodeKind::Heading, Some(&attrs)) {
            set_block_type(NodeKind::Paragraph, None).apply(tr)
        } else {
            set_block_type(NodeKind::Heading, Some(attrs)).apply(tr)
        }
    }
}

pub fn toggle_code_block(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    if block_active(tr.doc(), &selection, NodeKind::CodeBlock, None) {
        set_block_type(NodeKind::Paragraph, None).apply(tr)
    } else {
        set_block_type(NodeKind::CodeBlock, None).apply(tr)
    }
}

pub fn toggle_blockquote(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    if block_active(tr.doc(), &selection, NodeKind::Blockquote, None) {
        lift(tr)
    } else {
        wrap_in(NodeKind::Blockquote, None).apply(tr)
    }
}

/// Wraps the selected blocks in a `kind` node
pub fn wrap_in(kind: NodeKind, attrs: Option<Attrs>) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let selection = tr.selection();
        let rfrom = tr.doc().resolve(selection.from())?;
        let rto = tr.doc().resolve(selection.to())?;
        let Some(range) = rfrom.block_range(&rto, None) else {
            return Ok(false);
        };
        let Some(wrappers) = find_wrapping(&range, kind, attrs.as_ref()) else {
            return Ok(false);
        };
        tr.wrap(&range, &wrappers)?;
        tr.scroll_into_view();
        Ok(true)
    }
}

/// Lifts the selected blocks out of their parent
pub fn lift(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    let rfrom = tr.doc().resolve(selection.from())?;
    let rto = tr.doc().resolve(selection.to())?;
    let Some(range) = rfrom.block_range(&rto, None) else {
        return Ok(false);
    };
    let Some(target) = lift_target(&range) else {
        return Ok(false);
    };
    tr.lift(&range, target)?;
    tr.scroll_into_view();
    Ok(true)
}

//! Placing new blocks relative to the selection

use quire_model::{Fragment, Node, NodeKind, ResolvedPos};
use quire_state::{CommandError, Transaction};

/// Deepest ancestor of `rpos` that may hold a `kind` child
pub(crate) fn accepting_depth(rpos: &ResolvedPos, kind: NodeKind) -> Option<usize> {
    (0..=rpos.depth())
        .rev()
        .find(|d| rpos.node(*d).kind().content().accepts(kind))
}

/// Position right after the block around `rpos` where `content` fits,
/// climbing out of ancestors that cannot hold it
pub(crate) fn after_block(rpos: &ResolvedPos, content: &Fragment) -> Option<usize> {
    let top = if rpos.parent().is_textblock() {
        rpos.depth().checked_sub(1)?
    } else {
        rpos.depth()
    };
    (0..=top).rev().find_map(|d| {
        let (index, pos) = if d == rpos.depth() {
            (rpos.index(d), rpos.pos())
        } else {
            (rpos.index(d) + 1, rpos.after(d + 1))
        };
        rpos.node(d)
            .can_replace(index, index, content)
            .then_some(pos)
    })
}

/// Inserts `node` as a sibling of the textblock at `pos`. An empty
/// paragraph is replaced, a cursor at either edge inserts before or after
/// and a cursor inside the text splits the block. Returns where the node
/// starts.
pub(crate) fn place_block(tr: &mut Transaction, pos: usize, node: Node) -> Result<usize, CommandError> {
    let rpos = tr.doc().resolve(pos)?;
    let Some(container) = accepting_depth(&rpos, node.kind()) else {
        return Err(CommandError::NotApplicable("no ancestor accepts the block"));
    };
    let content = Fragment::from_node(node);
    if container == rpos.depth() {
        tr.insert(pos, content)?;
        return Ok(pos);
    }
    let depth = container + 1;
    if depth < rpos.depth() || !rpos.parent().is_textblock() {
        let at = rpos.after(depth);
        tr.insert(at, content)?;
        return Ok(at);
    }
    let parent = rpos.parent();
    if parent.kind() == NodeKind::Paragraph && parent.content().size() == 0 {
        let at = rpos.before(depth);
        tr.replace_with(at, rpos.after(depth), content)?;
        return Ok(at);
    }
    if rpos.parent_offset() == 0 {
        let at = rpos.before(depth);
        tr.insert(at, content)?;
        return Ok(at);
    }
    if rpos.parent_offset() == parent.content().size() {
        let at = rpos.after(depth);
        tr.insert(at, content)?;
        return Ok(at);
    }
    tr.split(pos, 1, None)?;
    tr.insert(pos + 1, content)?;
    Ok(pos + 1)
}

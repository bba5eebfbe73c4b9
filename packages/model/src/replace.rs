//! The structural replace algorithm.
//!
//! Replacing `from..to` with a slice walks down the shared ancestors of both
//! ends, then rebuilds every level below: content before `from`, the slice
//! (its open sides joined with the surrounding nodes) and content after `to`.
//! Every rebuilt node is validated against its content expression, so a
//! replace either yields a schema-valid document or fails.

use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::node::{content_valid, Node};
use crate::resolved::ResolvedPos;
use crate::slice::Slice;

pub(crate) fn replace(from: &ResolvedPos, to: &ResolvedPos, slice: &Slice) -> ModelResult<Node> {
    slice.check_open_depths()?;
    if slice.open_start > from.depth() {
        return Err(ModelError::replace(
            "Inserted content deeper than insertion position",
        ));
    }
    if from.depth() + slice.open_end != to.depth() + slice.open_start {
        return Err(ModelError::replace("Inconsistent open depths"));
    }
    replace_outer(from, to, slice, 0)
}

fn replace_outer(
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> ModelResult<Node> {
    let index = from.index(depth);
    let node = from.node(depth);
    if index == to.index(depth) && depth < from.depth() - slice.open_start {
        let inner = replace_outer(from, to, slice, depth + 1)?;
        Ok(node.copy(node.content().replace_child(index, inner)))
    } else if slice.content.size() == 0 {
        close(node, replace_two_way(from, to, depth)?)
    } else if slice.open_start == 0
        && slice.open_end == 0
        && from.depth() == depth
        && to.depth() == depth
    {
        let parent = from.parent();
        let content = parent.content();
        close(
            parent,
            content
                .cut(0, from.parent_offset())
                .append(&slice.content)
                .append(&content.cut(to.parent_offset(), content.size())),
        )
    } else {
        let (start, end) = prepare_slice_for_replace(slice, from)?;
        close(node, replace_three_way(from, &start, &end, to, depth)?)
    }
}

fn check_join(main: &Node, sub: &Node) -> ModelResult<()> {
    if !sub.kind().compatible_content(main.kind()) {
        return Err(ModelError::replace(format!(
            "Cannot join {} onto {}",
            sub.kind().name(),
            main.kind().name()
        )));
    }
    Ok(())
}

fn joinable(before: &ResolvedPos, after: &ResolvedPos, depth: usize) -> ModelResult<Node> {
    let node = before.node(depth);
    check_join(node, after.node(depth))?;
    Ok(node.clone())
}

fn add_node(child: Node, target: &mut Vec<Node>) {
    if let Some(last) = target.last_mut() {
        if let (Some(a), Some(b)) = (last.as_text(), child.as_text()) {
            if child.same_markup(last) {
                let joined = last.with_text(format!("{}{}", a, b));
                *last = joined;
                return;
            }
        }
    }
    target.push(child);
}

fn add_range(
    node: &Node,
    start: Option<&ResolvedPos>,
    end: Option<&ResolvedPos>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let end_index = end.map_or(node.child_count(), |end| end.index(depth));
    let mut start_index = 0;
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            if let Some(after) = start.node_after() {
                add_node(after, target);
            }
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        add_node(node.child(i).clone(), target);
    }
    if let Some(end) = end {
        if end.depth() == depth && end.text_offset() > 0 {
            if let Some(before) = end.node_before() {
                add_node(before, target);
            }
        }
    }
}

fn close(node: &Node, content: Fragment) -> ModelResult<Node> {
    if !content_valid(node.kind(), &content) {
        return Err(ModelError::schema(
            node.kind().name(),
            format!("invalid content {:?}", content),
        ));
    }
    Ok(node.copy(content))
}

fn replace_three_way(
    from: &ResolvedPos,
    start: &ResolvedPos,
    end: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> ModelResult<Fragment> {
    let open_start = if from.depth() > depth {
        Some(joinable(from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(from.node(depth), None, Some(from), depth, &mut content);
    match (&open_start, &open_end) {
        (Some(os), Some(oe)) if start.index(depth) == end.index(depth) => {
            check_join(os, oe)?;
            let inner = replace_three_way(from, start, end, to, depth + 1)?;
            add_node(close(os, inner)?, &mut content);
        }
        _ => {
            if let Some(os) = &open_start {
                let inner = replace_two_way(from, start, depth + 1)?;
                add_node(close(os, inner)?, &mut content);
            }
            add_range(end.node(depth), Some(start), Some(end), depth, &mut content);
            if let Some(oe) = &open_end {
                let inner = replace_two_way(end, to, depth + 1)?;
                add_node(close(oe, inner)?, &mut content);
            }
        }
    }
    add_range(to.node(depth), Some(to), None, depth, &mut content);
    Ok(Fragment::from_vec(content))
}

fn replace_two_way(from: &ResolvedPos, to: &ResolvedPos, depth: usize) -> ModelResult<Fragment> {
    let mut content = Vec::new();
    add_range(from.node(depth), None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let kind = joinable(from, to, depth + 1)?;
        let inner = replace_two_way(from, to, depth + 1)?;
        add_node(close(&kind, inner)?, &mut content);
    }
    add_range(to.node(depth), Some(to), None, depth, &mut content);
    Ok(Fragment::from_vec(content))
}

/// Wraps the slice in copies of `along`'s ancestors so both of its open
/// sides can be resolved like positions in a document
fn prepare_slice_for_replace(
    slice: &Slice,
    along: &ResolvedPos,
) -> ModelResult<(ResolvedPos, ResolvedPos)> {
    let extra = along.depth() - slice.open_start;
    let parent = along.node(extra);
    let mut node = parent.copy(slice.content.clone());
    for i in (0..extra).rev() {
        node = along.node(i).copy(Fragment::from_node(node));
    }
    let start = node.resolve(slice.open_start + extra)?;
    let end = node.resolve(node.content().size() - slice.open_end - extra)?;
    Ok((start, end))
}

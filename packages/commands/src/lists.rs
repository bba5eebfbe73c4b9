//! # List commands
//!
//! Wrapping blocks in lists, splitting, sinking and lifting list items.
//!
//! ```text
//! <ul>                         <ul>
//!   <li><p>one</p></li>          <li><p>one</p>
//!   <li><p>two|</p></li>  ──▶      <ul><li><p>two|</p></li></ul>
//! </ul>                  sink    </li>
//!                              </ul>
//! ```

use quire_model::{Attrs, Fragment, Node, NodeKind, NodeRange, Slice};
use quire_state::{Command, CommandError, EditorState, Transaction};
use quire_transform::{
    can_join, can_split, find_wrapping, lift_target, Assoc, Mappable, ReplaceAroundStep, Step,
    Wrapper,
};
use tracing::trace;

fn is_item_list(node: &Node) -> bool {
    node.first_child()
        .map_or(false, |child| child.kind() == NodeKind::ListItem)
}

/// The range of list items covered by the selection
fn item_range(tr: &Transaction) -> Result<Option<NodeRange>, CommandError> {
    let selection = tr.selection();
    let rfrom = tr.doc().resolve(selection.from())?;
    let rto = tr.doc().resolve(selection.to())?;
    Ok(rfrom.block_range(&rto, Some(&is_item_list)))
}

/// Depth of the innermost list around the selection start
fn list_depth(tr: &Transaction) -> Result<Option<usize>, CommandError> {
    let rpos = tr.doc().resolve(tr.selection().from())?;
    Ok((1..=rpos.depth())
        .rev()
        .find(|d| rpos.node(*d).kind().is_list()))
}

/// Wraps the selected blocks in a `kind` list, one item per block
pub fn wrap_in_list(kind: NodeKind, attrs: Option<Attrs>) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let selection = tr.selection();
        let rfrom = tr.doc().resolve(selection.from())?;
        let rto = tr.doc().resolve(selection.to())?;
        let Some(range) = rfrom.block_range(&rto, None) else {
            return Ok(false);
        };
        if range.depth >= 2
            && rfrom.node(range.depth - 1).kind().compatible_content(kind)
            && range.start_index() == 0
        {
            // already the head of a list item
            return Ok(false);
        }
        let Some(wrappers) = find_wrapping(&range, kind, attrs.as_ref()) else {
            return Ok(false);
        };
        wrap_as_list(tr, &range, &wrappers, kind)?;
        tr.scroll_into_view();
        Ok(true)
    }
}

fn wrap_as_list(
    tr: &mut Transaction,
    range: &NodeRange,
    wrappers: &[Wrapper],
    kind: NodeKind,
) -> Result<(), CommandError> {
    tr.wrap(range, wrappers)?;
    let found = wrappers
        .iter()
        .rposition(|w| w.kind == kind)
        .map_or(0, |i| i + 1);
    let split_depth = wrappers.len() - found;
    let parent = range.parent().clone();
    let mut split_pos = range.start() + wrappers.len();
    for i in range.start_index()..range.end_index() {
        if i > range.start_index() && can_split(tr.doc(), split_pos, split_depth, None) {
            tr.split(split_pos, split_depth, None)?;
            split_pos += 2 * split_depth;
        }
        split_pos += parent.child(i).node_size();
    }
    Ok(())
}

/// Moves the selected list items out one level: into the outer list when
/// nested, out of the list otherwise
pub fn lift_list_item(tr: &mut Transaction) -> Result<bool, CommandError> {
    let Some(range) = item_range(tr)? else {
        return Ok(false);
    };
    if range.depth == 0 {
        return Ok(false);
    }
    if range.from.node(range.depth - 1).kind() == NodeKind::ListItem {
        lift_to_outer_list(tr, range)
    } else {
        lift_out_of_list(tr, range)
    }
}

fn lift_to_outer_list(tr: &mut Transaction, range: NodeRange) -> Result<bool, CommandError> {
    let base = tr.steps().len();
    let end = range.end();
    let end_of_list = range.to.end(range.depth);
    let mut range = range;
    if end < end_of_list {
        // siblings after the lifted items become children of the last one
        let item = Node::new(
            NodeKind::ListItem,
            None,
            Fragment::from_node(range.parent().copy(Fragment::empty())),
            Vec::new(),
        );
        tr.step(Step::ReplaceAround(ReplaceAroundStep::new(
            end - 1,
            end_of_list,
            end,
            end_of_list,
            Slice::new(Fragment::from_node(item), 1, 0),
            1,
            true,
        )))?;
        range = NodeRange::new(
            tr.doc().resolve(range.from.pos())?,
            tr.doc().resolve(end_of_list)?,
            range.depth,
        );
    }
    let Some(target) = lift_target(&range) else {
        return Err(CommandError::NotApplicable("list item cannot be lifted"));
    };
    tr.lift(&range, target)?;
    let mapped = tr.mapping().slice(base).map(end, Assoc::Before);
    if mapped > 0 {
        let after = tr.doc().resolve(mapped - 1)?;
        let same_kind = match (after.node_before(), after.node_after()) {
            (Some(before), Some(next)) => before.kind() == next.kind(),
            _ => false,
        };
        if same_kind && can_join(tr.doc(), after.pos()) {
            tr.join(after.pos(), 1)?;
        }
    }
    tr.scroll_into_view();
    Ok(true)
}

fn lift_out_of_list(tr: &mut Transaction, range: NodeRange) -> Result<bool, CommandError> {
    let base = tr.steps().len();
    let list = range.parent().clone();

    // merge the selected items into one
    let mut pos = range.end();
    for i in (range.start_index() + 1..range.end_index()).rev() {
        pos -= list.child(i).node_size();
        tr.delete(pos - 1, pos + 1)?;
    }
    let start = tr.doc().resolve(range.start())?;
    let Some(item) = start.node_after() else {
        return Err(CommandError::NotApplicable("no list item to lift"));
    };
    if tr.mapping().slice(base).map(range.end(), Assoc::After) != range.start() + item.node_size()
    {
        return Err(CommandError::NotApplicable("list items did not merge"));
    }

    let at_start = range.start_index() == 0;
    let at_end = range.end_index() == list.child_count();
    let depth = start.depth();
    let parent = start.node(depth - 1);
    let index_before = start.index(depth - 1);
    let remainder = if at_end {
        Fragment::empty()
    } else {
        Fragment::from_node(list.clone())
    };
    if !parent.can_replace(
        index_before + usize::from(!at_start),
        index_before + 1,
        &item.content().append(&remainder),
    ) {
        return Err(CommandError::NotApplicable("parent cannot hold lifted content"));
    }

    // close the list on the sides that are not its ends
    let from = start.pos();
    let to = from + item.node_size();
    let shell = || Fragment::from_node(list.copy(Fragment::empty()));
    let before = if at_start { Fragment::empty() } else { shell() };
    let after = if at_end { Fragment::empty() } else { shell() };
    tr.step(Step::ReplaceAround(ReplaceAroundStep::new(
        from - usize::from(at_start),
        to + usize::from(at_end),
        from + 1,
        to - 1,
        Slice::new(
            before.append(&after),
            usize::from(!at_start),
            usize::from(!at_end),
        ),
        usize::from(!at_start),
        true,
    )))?;
    tr.scroll_into_view();
    Ok(true)
}

/// Nests the selected list items inside the item before them. When the
/// selection starts at the first item the following items nest under it.
pub fn sink_list_item(tr: &mut Transaction) -> Result<bool, CommandError> {
    let Some(range) = item_range(tr)? else {
        return Ok(false);
    };
    let parent = range.parent().clone();
    let (start_index, before) = if range.start_index() > 0 {
        (range.start_index(), range.start())
    } else if range.end_index() - range.start_index() > 1 {
        (
            range.start_index() + 1,
            range.start() + parent.child(range.start_index()).node_size(),
        )
    } else {
        return Ok(false);
    };
    let node_before = parent.child(start_index - 1);
    if node_before.kind() != NodeKind::ListItem {
        return Ok(false);
    }
    let after = range.end();
    let nested_before = node_before
        .last_child()
        .map_or(false, |last| last.kind() == parent.kind());
    let inner = if nested_before {
        Fragment::from_node(Node::new(NodeKind::ListItem, None, Fragment::empty(), Vec::new()))
    } else {
        Fragment::empty()
    };
    let wrapper = Node::new(
        NodeKind::ListItem,
        None,
        Fragment::from_node(Node::new(parent.kind(), Some(parent.attrs()), inner, Vec::new())),
        Vec::new(),
    );
    let open = if nested_before { 3 } else { 1 };
    trace!(start_index, nested_before, "Sinking list items");
    tr.step(Step::ReplaceAround(ReplaceAroundStep::new(
        before - open,
        after,
        before,
        after,
        Slice::new(Fragment::from_node(wrapper), open, 0),
        1,
        true,
    )))?;
    tr.scroll_into_view();
    Ok(true)
}

/// Splits the list item around the cursor. Empty trailing items are left
/// to [`exit_empty_list_item`].
pub fn split_list_item(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    if let Some(node) = selection.selected_node(tr.doc()) {
        if node.is_block() {
            return Ok(false);
        }
    }
    let rfrom = tr.doc().resolve(selection.from())?;
    let rto = tr.doc().resolve(selection.to())?;
    let depth = rfrom.depth();
    if depth < 2 || !rfrom.same_parent(&rto) {
        return Ok(false);
    }
    let item = rfrom.node(depth - 1);
    if item.kind() != NodeKind::ListItem {
        return Ok(false);
    }
    if rfrom.parent().content().size() == 0 && item.child_count() == rfrom.index_after(depth - 1) {
        return Ok(false);
    }
    let types = if rto.pos() == rfrom.end(depth) {
        Some(vec![None, Some(Wrapper::new(NodeKind::Paragraph, None))])
    } else {
        None
    };
    if rto.pos() > rfrom.pos() {
        tr.delete(rfrom.pos(), rto.pos())?;
    }
    if !can_split(tr.doc(), rfrom.pos(), 2, types.as_deref()) {
        return Err(CommandError::NotApplicable("list item cannot be split here"));
    }
    tr.split(rfrom.pos(), 2, types.as_deref())?;
    tr.scroll_into_view();
    Ok(true)
}

/// Lifts an empty last paragraph of a list item out of the list
pub fn exit_empty_list_item(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    let Some(pos) = selection.cursor_pos() else {
        return Ok(false);
    };
    let rpos = tr.doc().resolve(pos)?;
    let depth = rpos.depth();
    if depth < 2 || rpos.parent().content().size() > 0 {
        return Ok(false);
    }
    let item = rpos.node(depth - 1);
    if item.kind() != NodeKind::ListItem || rpos.index_after(depth - 1) != item.child_count() {
        return Ok(false);
    }
    lift_list_item(tr)
}

fn toggle_list(tr: &mut Transaction, kind: NodeKind) -> Result<bool, CommandError> {
    if let Some(depth) = list_depth(tr)? {
        let rpos = tr.doc().resolve(tr.selection().from())?;
        let list = rpos.node(depth);
        if list.kind() == kind {
            return lift_list_item(tr);
        }
        let pos = rpos.before(depth);
        tr.set_node_markup(pos, kind, None)?;
        return Ok(true);
    }
    wrap_in_list(kind, None).apply(tr)
}

pub fn toggle_bullet_list(tr: &mut Transaction) -> Result<bool, CommandError> {
    toggle_list(tr, NodeKind::BulletList)
}

pub fn toggle_ordered_list(tr: &mut Transaction) -> Result<bool, CommandError> {
    toggle_list(tr, NodeKind::OrderedList)
}

pub fn is_in_list(state: &EditorState) -> bool {
    let Ok(rpos) = state.doc().resolve(state.selection().from()) else {
        return false;
    };
    (1..=rpos.depth()).any(|d| rpos.node(d).kind().is_list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use quire_state::{Selection, StateConfig};

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
    fn test_wrap_paragraphs_one_item_each() {
        // 0 <p> 1 a 2 </p> 3 <p> 4 b 5 </p> 6
        let s = state(
            doc(vec![p(vec![txt("a")]), p(vec![txt("b")])]),
            Selection::text(1, 5),
        );
        let next = apply(&s, toggle_bullet_list);
        assert_eq!(
            next.doc(),
            &doc(vec![ul(vec![
                li(vec![p(vec![txt("a")])]),
                li(vec![p(vec![txt("b")])]),
            ])])
        );
        assert!(is_in_list(&next));
    }

    #[test]
    fn test_toggle_same_list_lifts_out() {
        let s = state(doc(vec![ul(vec![li(vec![p(vec![txt("a")])])])]), Selection::cursor(3));
        let next = apply(&s, toggle_bullet_list);
        assert_eq!(next.doc(), &doc(vec![p(vec![txt("a")])]));
        assert_eq!(*next.selection(), Selection::cursor(1));
    }

    #[test]
    fn test_toggle_other_list_retypes() {
        let s = state(doc(vec![ul(vec![li(vec![p(vec![txt("a")])])])]), Selection::cursor(3));
        let next = apply(&s, toggle_ordered_list);
        assert_eq!(next.doc().child(0).kind(), NodeKind::OrderedList);
        assert_eq!(next.doc().child(0).child(0), &li(vec![p(vec![txt("a")])]));
    }

    #[test]
    fn test_lift_middle_item_splits_list() {
        // 0 <ul> 1 <li> 2 <p> 3 a 4 </p> 5 </li> 6 <li> 7 <p> 8 b ...
        let s = state(
            doc(vec![ul(vec![
                li(vec![p(vec![txt("a")])]),
                li(vec![p(vec![txt("b")])]),
                li(vec![p(vec![txt("c")])]),
            ])]),
            Selection::cursor(8),
        );
        let next = apply(&s, lift_list_item);
        assert_eq!(
            next.doc(),
            &doc(vec![
                ul(vec![li(vec![p(vec![txt("a")])])]),
                p(vec![txt("b")]),
                ul(vec![li(vec![p(vec![txt("c")])])]),
            ])
        );
    }

    #[test]
    fn test_sink_then_lift_restores() {
        let s = state(
            doc(vec![ul(vec![
                li(vec![p(vec![txt("a")])]),
                li(vec![p(vec![txt("b")])]),
            ])]),
            Selection::cursor(9),
        );
        let sunk = apply(&s, sink_list_item);
        assert_eq!(
            sunk.doc(),
            &doc(vec![ul(vec![li(vec![
                p(vec![txt("a")]),
                ul(vec![li(vec![p(vec![txt("b")])])]),
            ])])])
        );
        let lifted = apply(&sunk, lift_list_item);
        assert_eq!(lifted.doc(), s.doc());
        assert_eq!(lifted.selection(), s.selection());
    }

    #[test]
    fn test_sink_first_item_alone_is_not_applicable() {
        let s = state(doc(vec![ul(vec![li(vec![p(vec![txt("a")])])])]), Selection::cursor(3));
        assert!(!sink_list_item.run(&s, None));
    }

    #[test]
    fn test_split_list_item() {
        // 0 <ul> 1 <li> 2 <p> 3 a 4 b 5 </p>
        let s = state(doc(vec![ul(vec![li(vec![p(vec![txt("ab")])])])]), Selection::cursor(4));
        let next = apply(&s, split_list_item);
        assert_eq!(
            next.doc(),
            &doc(vec![ul(vec![
                li(vec![p(vec![txt("a")])]),
                li(vec![p(vec![txt("b")])]),
            ])])
        );
        assert_eq!(*next.selection(), Selection::cursor(8));
    }

    #[test]
    fn test_exit_empty_item() {
        // 0 <ul> 1 <li> 2 <p> 3 a 4 </p> 5 </li> 6 <li> 7 <p> 8 </p>
        let s = state(
            doc(vec![ul(vec![li(vec![p(vec![txt("a")])]), li(vec![p(vec![])])])]),
            Selection::cursor(8),
        );
        assert!(!split_list_item.run(&s, None));
        let next = apply(&s, exit_empty_list_item);
        assert_eq!(
            next.doc(),
            &doc(vec![ul(vec![li(vec![p(vec![txt("a")])])]), p(vec![])])
        );
    }
}

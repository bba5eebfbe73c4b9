//! # Structural transforms
//!
//! Lifting, wrapping, splitting, joining and retyping blocks. The free
//! functions answer "is this possible here" and compute targets; the
//! [`Transform`] methods perform the change.

use crate::error::StepError;
use crate::map::{Assoc, Mappable};
use crate::replace_step::{ReplaceAroundStep, ReplaceStep};
use crate::step::Step;
use crate::transform::{Transform, TransformResult};
use quire_model::{content_valid, Attrs, Fragment, Node, NodeKind, NodeRange, Slice};

/// A node type and attributes to wrap content in or to give a split-off
/// node
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapper {
    pub kind: NodeKind,
    pub attrs: Attrs,
}

impl Wrapper {
    pub fn new(kind: NodeKind, attrs: Option<&Attrs>) -> Self {
        Wrapper {
            kind,
            attrs: kind.compute_attrs(attrs),
        }
    }
}

fn can_cut(node: &Node, start: usize, end: usize) -> bool {
    (start == 0 || node.can_replace(start, node.child_count(), &Fragment::empty()))
        && (end == node.child_count() || node.can_replace(0, end, &Fragment::empty()))
}

/// The depth the content of `range` can be lifted to, if any
pub fn lift_target(range: &NodeRange) -> Option<usize> {
    let parent = range.parent();
    let content = parent
        .content()
        .cut_by_index(range.start_index(), range.end_index());
    let mut depth = range.depth;
    loop {
        let node = range.from.node(depth);
        let index = range.from.index(depth);
        let end_index = range.to.index_after(depth);
        if depth < range.depth && node.can_replace(index, end_index, &content) {
            return Some(depth);
        }
        if depth == 0 || node.kind().spec().isolating || !can_cut(node, index, end_index) {
            return None;
        }
        depth -= 1;
    }
}

/// Wrappers that would put the content of `range` inside a `kind` node,
/// adding one intermediate node when `kind` cannot hold the content
/// directly (a list needs a list item)
pub fn find_wrapping(range: &NodeRange, kind: NodeKind, attrs: Option<&Attrs>) -> Option<Vec<Wrapper>> {
    let parent = range.parent();
    if !parent.can_replace_with(range.start_index(), range.end_index(), kind) {
        return None;
    }
    let first = parent.maybe_child(range.start_index())?;
    let inside = wrapping_inside(kind, first.kind())?;
    let innermost = inside.unwrap_or(kind);
    let children = parent
        .content()
        .cut_by_index(range.start_index(), range.end_index());
    if !innermost.content().matches(children.kinds()) {
        return None;
    }
    let mut wrappers = vec![Wrapper::new(kind, attrs)];
    if let Some(inner) = inside {
        wrappers.push(Wrapper::new(inner, None));
    }
    Some(wrappers)
}

/// `Some(None)` when `outer` takes `inner` directly, `Some(Some(k))` when a
/// `k` node must sit between them
fn wrapping_inside(outer: NodeKind, inner: NodeKind) -> Option<Option<NodeKind>> {
    if outer.content().accepts_first(inner) {
        return Some(None);
    }
    NodeKind::ALL
        .iter()
        .copied()
        .find(|kind| {
            !kind.is_leaf()
                && outer.content().accepts_first(*kind)
                && outer.content().matches(std::iter::once(*kind))
                && kind.content().accepts_first(inner)
        })
        .map(Some)
}

pub fn can_change_type(doc: &Node, pos: usize, kind: NodeKind) -> bool {
    let Ok(rpos) = doc.resolve(pos) else {
        return false;
    };
    let index = rpos.index(rpos.depth());
    rpos.parent().can_replace_with(index, index + 1, kind)
}

/// Whether splitting at `pos` `depth` levels deep yields valid nodes.
/// `types_after` optionally gives the type of the split-off node at each
/// level, outermost first.
pub fn can_split(
    doc: &Node,
    pos: usize,
    depth: usize,
    types_after: Option<&[Option<Wrapper>]>,
) -> bool {
    let Ok(rpos) = doc.resolve(pos) else {
        return false;
    };
    if depth == 0 || depth > rpos.depth() {
        return false;
    }
    let base = rpos.depth() - depth;
    let type_at = |i: isize| -> Option<&Wrapper> {
        if i < 0 {
            return None;
        }
        types_after
            .and_then(|types| types.get(i as usize))
            .and_then(Option::as_ref)
    };

    let parent = rpos.parent();
    let index = rpos.index(rpos.depth());
    let inner_kind = type_at(depth as isize - 1)
        .map(|w| w.kind)
        .unwrap_or(parent.kind());
    let rest = parent.content().cut_by_index(index, parent.child_count());
    if parent.kind().spec().isolating
        || !parent.can_replace(index, parent.child_count(), &Fragment::empty())
        || !content_valid(inner_kind, &rest)
    {
        return false;
    }

    let mut i = depth as isize - 2;
    for d in (base + 1..rpos.depth()).rev() {
        let node = rpos.node(d);
        let index = rpos.index(d);
        if node.kind().spec().isolating {
            return false;
        }
        let mut rest: Vec<NodeKind> = node.content().nodes()[index..]
            .iter()
            .map(Node::kind)
            .collect();
        if let (Some(first), Some(child)) = (rest.first_mut(), type_at(i + 1)) {
            *first = child.kind;
        }
        let after_kind = type_at(i).map(|w| w.kind).unwrap_or(node.kind());
        if !node.can_replace(index + 1, node.child_count(), &Fragment::empty())
            || !after_kind.content().matches(rest)
        {
            return false;
        }
        i -= 1;
    }

    let index = rpos.index_after(base);
    let base_kind = type_at(0)
        .map(|w| w.kind)
        .unwrap_or(rpos.node(base + 1).kind());
    rpos.node(base).can_replace_with(index, index, base_kind)
}

fn joinable(before: &Node, after: &Node) -> bool {
    if before.is_leaf() || after.is_text() {
        return false;
    }
    if after.content().size() > 0 {
        before.can_replace(before.child_count(), before.child_count(), after.content())
    } else {
        before.kind().compatible_content(after.kind())
    }
}

/// Whether the nodes on both sides of `pos` can be joined
pub fn can_join(doc: &Node, pos: usize) -> bool {
    let Ok(rpos) = doc.resolve(pos) else {
        return false;
    };
    let index = rpos.index(rpos.depth());
    let (Some(before), Some(after)) = (rpos.node_before(), rpos.node_after()) else {
        return false;
    };
    joinable(&before, &after) && rpos.parent().can_replace(index, index + 1, &Fragment::empty())
}

/// Position where the nodes around `pos` or around one of its ancestors can
/// be joined, searching upward and looking backward when `backward` is set.
/// Textblocks are never the left side of such a join.
pub fn join_point(doc: &Node, pos: usize, backward: bool) -> Option<usize> {
    let rpos = doc.resolve(pos).ok()?;
    let mut pos = pos;
    let mut d = rpos.depth();
    loop {
        let mut index = rpos.index(d);
        let (before, after) = if d == rpos.depth() {
            (rpos.node_before(), rpos.node_after())
        } else if backward {
            let before = if index > 0 {
                rpos.node(d).maybe_child(index - 1).cloned()
            } else {
                None
            };
            (before, Some(rpos.node(d + 1).clone()))
        } else {
            index += 1;
            (
                Some(rpos.node(d + 1).clone()),
                rpos.node(d).maybe_child(index).cloned(),
            )
        };
        if let (Some(before), Some(after)) = (&before, &after) {
            if !before.is_textblock()
                && joinable(before, after)
                && rpos.node(d).can_replace(index, index + 1, &Fragment::empty())
            {
                return Some(pos);
            }
        }
        if d == 0 {
            return None;
        }
        pos = if backward {
            rpos.before(d)
        } else {
            rpos.after(d)
        };
        d -= 1;
    }
}

impl Transform {
    /// Moves the content of `range` out to `target` depth, splitting the
    /// ancestors in between where needed
    pub fn lift(&mut self, range: &NodeRange, target: usize) -> TransformResult<'_> {
        let from = &range.from;
        let to = &range.to;
        let depth = range.depth;

        let gap_start = from.before(depth + 1);
        let gap_end = to.after(depth + 1);
        let mut start = gap_start;
        let mut end = gap_end;

        let mut before = Fragment::empty();
        let mut open_start = 0;
        let mut splitting = false;
        for d in (target + 1..=depth).rev() {
            if splitting || from.index(d) > 0 {
                splitting = true;
                before = Fragment::from_node(from.node(d).copy(before));
                open_start += 1;
            } else {
                start -= 1;
            }
        }

        let mut after = Fragment::empty();
        let mut open_end = 0;
        let mut splitting = false;
        for d in (target + 1..=depth).rev() {
            if splitting || to.after(d + 1) < to.end(d) {
                splitting = true;
                after = Fragment::from_node(to.node(d).copy(after));
                open_end += 1;
            } else {
                end += 1;
            }
        }

        self.step(Step::ReplaceAround(ReplaceAroundStep::new(
            start,
            end,
            gap_start,
            gap_end,
            Slice::new(before.append(&after), open_start, open_end),
            before.size() - open_start,
            true,
        )))
    }

    /// Wraps the content of `range` in `wrappers`, outermost first
    pub fn wrap(&mut self, range: &NodeRange, wrappers: &[Wrapper]) -> TransformResult<'_> {
        let mut content = Fragment::empty();
        for wrapper in wrappers.iter().rev() {
            if content.size() > 0 && !content_valid(wrapper.kind, &content) {
                return Err(StepError::invalid(format!(
                    "{} cannot hold the inner wrapper",
                    wrapper.kind.name()
                )));
            }
            content = Fragment::from_node(Node::new(
                wrapper.kind,
                Some(&wrapper.attrs),
                content,
                Vec::new(),
            ));
        }
        let start = range.start();
        let end = range.end();
        self.step(Step::ReplaceAround(ReplaceAroundStep::new(
            start,
            end,
            start,
            end,
            Slice::closed(content),
            wrappers.len(),
            true,
        )))
    }

    /// Splits the node at `pos` and `depth - 1` of its ancestors
    pub fn split(
        &mut self,
        pos: usize,
        depth: usize,
        types_after: Option<&[Option<Wrapper>]>,
    ) -> TransformResult<'_> {
        let rpos = self.doc.resolve(pos)?;
        if depth > rpos.depth() {
            return Err(StepError::invalid(format!(
                "cannot split {} levels at depth {}",
                depth,
                rpos.depth()
            )));
        }
        let mut before = Fragment::empty();
        let mut after = Fragment::empty();
        let base = rpos.depth() - depth;
        let mut i = depth;
        for d in (base + 1..=rpos.depth()).rev() {
            i -= 1;
            before = Fragment::from_node(rpos.node(d).copy(before));
            let type_after = types_after
                .and_then(|types| types.get(i))
                .and_then(Option::as_ref);
            let node = match type_after {
                Some(wrapper) => Node::new(wrapper.kind, Some(&wrapper.attrs), after, Vec::new()),
                None => rpos.node(d).copy(after),
            };
            after = Fragment::from_node(node);
        }
        self.step(Step::Replace(ReplaceStep::new(
            pos,
            pos,
            Slice::new(before.append(&after), depth, depth),
            true,
        )))
    }

    /// Joins the blocks around `pos`, `depth` levels deep
    pub fn join(&mut self, pos: usize, depth: usize) -> TransformResult<'_> {
        if depth > pos {
            return Err(StepError::invalid("join depth exceeds position"));
        }
        self.step(Step::Replace(ReplaceStep::new(
            pos - depth,
            pos + depth,
            Slice::empty(),
            true,
        )))
    }

    /// Retypes every textblock in `from..to` that can become a `kind`
    pub fn set_block_type(
        &mut self,
        from: usize,
        to: usize,
        kind: NodeKind,
        attrs: Option<&Attrs>,
    ) -> TransformResult<'_> {
        if !kind.is_textblock() {
            return Err(StepError::invalid(format!(
                "{} is not a textblock",
                kind.name()
            )));
        }
        kind.check_attrs(&kind.compute_attrs(attrs))?;
        let map_from = self.steps.len();
        let mut targets: Vec<(usize, usize)> = Vec::new();
        self.doc.nodes_between(from, to, &mut |node, pos, _, _| {
            if node.is_textblock() {
                if !node.has_markup(kind, attrs) {
                    targets.push((pos, node.node_size()));
                }
                return false;
            }
            true
        });
        for (pos, size) in targets {
            let mapped = self.mapping.slice(map_from).map(pos, Assoc::After);
            if !can_change_type(&self.doc, mapped, kind) {
                continue;
            }
            self.clear_incompatible(mapped, kind)?;
            let mapping = self.mapping.slice(map_from);
            let start = mapping.map(pos, Assoc::After);
            let end = mapping.map(pos + size, Assoc::After);
            let marks = self
                .doc
                .node_at(start)
                .map(|node| node.marks().to_vec())
                .unwrap_or_default();
            let node = Node::new(kind, attrs, Fragment::empty(), marks);
            self.step(Step::ReplaceAround(ReplaceAroundStep::new(
                start,
                end,
                start + 1,
                end - 1,
                Slice::closed(Fragment::from_node(node)),
                1,
                true,
            )))?;
        }
        Ok(self)
    }

    /// Changes the type, attributes and marks of the node at `pos` while
    /// keeping its content
    pub fn set_node_markup(
        &mut self,
        pos: usize,
        kind: NodeKind,
        attrs: Option<&Attrs>,
    ) -> TransformResult<'_> {
        let node = self.doc.node_at(pos).ok_or(StepError::NoNodeAt(pos))?;
        let replacement = Node::new(kind, attrs, Fragment::empty(), node.marks().to_vec());
        kind.check_attrs(replacement.attrs())?;
        if node.is_leaf() {
            return self.replace_with(pos, pos + node.node_size(), Fragment::from_node(replacement));
        }
        if !content_valid(kind, node.content()) {
            return Err(StepError::invalid(format!(
                "{} cannot hold the content of {}",
                kind.name(),
                node.kind().name()
            )));
        }
        let end = pos + node.node_size();
        self.step(Step::ReplaceAround(ReplaceAroundStep::new(
            pos,
            end,
            pos + 1,
            end - 1,
            Slice::closed(Fragment::from_node(replacement)),
            1,
            true,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;

    fn range(d: &Node, from: usize, to: usize) -> NodeRange {
        let rfrom = d.resolve(from).unwrap();
        let rto = d.resolve(to).unwrap();
        rfrom.block_range(&rto, None).unwrap()
    }

    #[test]
    fn test_lift_out_of_blockquote() {
        // 0 <bq> 1 <p> 2 a 3 </p> 4 </bq> 5
        let d = doc(vec![blockquote(vec![p(vec![txt("a")])])]);
        let r = range(&d, 2, 2);
        assert_eq!(lift_target(&r), Some(0));
        let mut tr = Transform::new(d);
        tr.lift(&r, 0).unwrap();
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("a")])]));
    }

    #[test]
    fn test_lift_middle_paragraph_splits_parent() {
        let d = doc(vec![blockquote(vec![
            p(vec![txt("a")]),
            p(vec![txt("b")]),
            p(vec![txt("c")]),
        ])]);
        // "b" starts at 5
        let r = range(&d, 5, 5);
        let mut tr = Transform::new(d);
        tr.lift(&r, 0).unwrap();
        assert_eq!(
            tr.doc(),
            &doc(vec![
                blockquote(vec![p(vec![txt("a")])]),
                p(vec![txt("b")]),
                blockquote(vec![p(vec![txt("c")])]),
            ])
        );
    }

    #[test]
    fn test_no_lift_target_at_top_level() {
        let d = doc(vec![p(vec![txt("a")])]);
        assert_eq!(lift_target(&range(&d, 1, 1)), None);
    }

    #[test]
    fn test_find_wrapping_list_adds_item() {
        let d = doc(vec![p(vec![txt("a")])]);
        let r = range(&d, 1, 1);
        let wrappers = find_wrapping(&r, NodeKind::BulletList, None).unwrap();
        let kinds: Vec<NodeKind> = wrappers.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![NodeKind::BulletList, NodeKind::ListItem]);

        let mut tr = Transform::new(d);
        tr.wrap(&r, &wrappers).unwrap();
        assert_eq!(tr.doc(), &doc(vec![ul(vec![li(vec![p(vec![txt("a")])])])]));
    }

    #[test]
    fn test_find_wrapping_blockquote_direct() {
        let d = doc(vec![p(vec![txt("a")]), p(vec![txt("b")])]);
        let r = range(&d, 1, 4);
        let wrappers = find_wrapping(&r, NodeKind::Blockquote, None).unwrap();
        assert_eq!(wrappers.len(), 1);
        let mut tr = Transform::new(d);
        tr.wrap(&r, &wrappers).unwrap();
        assert_eq!(
            tr.doc(),
            &doc(vec![blockquote(vec![p(vec![txt("a")]), p(vec![txt("b")])])])
        );
    }

    #[test]
    fn test_split_paragraph() {
        let d = doc(vec![p(vec![txt("abcd")])]);
        assert!(can_split(&d, 3, 1, None));
        let mut tr = Transform::new(d);
        tr.split(3, 1, None).unwrap();
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("ab")]), p(vec![txt("cd")])]));
    }

    #[test]
    fn test_split_heading_into_paragraph() {
        let d = doc(vec![heading(3, vec![txt("Title")])]);
        let types = [Some(Wrapper::new(NodeKind::Paragraph, None))];
        let mut tr = Transform::new(d);
        tr.split(6, 1, Some(&types)).unwrap();
        assert_eq!(
            tr.doc(),
            &doc(vec![heading(3, vec![txt("Title")]), p(vec![])])
        );
    }

    #[test]
    fn test_split_list_item() {
        // 0 <ul> 1 <li> 2 <p> 3 a 4 b 5 </p> 6 </li> 7 </ul> 8
        let d = doc(vec![ul(vec![li(vec![p(vec![txt("ab")])])])]);
        assert!(can_split(&d, 4, 2, None));
        let mut tr = Transform::new(d);
        tr.split(4, 2, None).unwrap();
        assert_eq!(
            tr.doc(),
            &doc(vec![ul(vec![
                li(vec![p(vec![txt("a")])]),
                li(vec![p(vec![txt("b")])]),
            ])])
        );
    }

    #[test]
    fn test_cannot_split_inside_details_summary() {
        // 0 <details> 1 <summary> 2 a 3 ...
        let d = doc(vec![details(vec![txt("a")], vec![p(vec![])])]);
        assert!(!can_split(&d, 2, 1, None));
    }

    #[test]
    fn test_join_paragraphs() {
        let d = doc(vec![p(vec![txt("a")]), p(vec![txt("b")])]);
        assert!(can_join(&d, 3));
        assert!(!can_join(&d, 1));
        let mut tr = Transform::new(d);
        tr.join(3, 1).unwrap();
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("ab")])]));
    }

    #[test]
    fn test_join_lists_but_not_list_and_paragraph() {
        let d = doc(vec![
            ul(vec![li(vec![p(vec![txt("a")])])]),
            ul(vec![li(vec![p(vec![txt("b")])])]),
            p(vec![txt("c")]),
        ]);
        // first list is 0..7, second 7..14
        assert!(can_join(&d, 7));
        assert!(!can_join(&d, 14));
    }

    #[test]
    fn test_set_block_type_to_heading() {
        let d = doc(vec![p(vec![txt("a")]), p(vec![txt("b")])]);
        let attrs = Attrs::new().with("level", 2);
        let mut tr = Transform::new(d);
        tr.set_block_type(1, 5, NodeKind::Heading, Some(&attrs)).unwrap();
        assert_eq!(
            tr.doc(),
            &doc(vec![heading(2, vec![txt("a")]), heading(2, vec![txt("b")])])
        );
    }

    #[test]
    fn test_set_block_type_code_clears_marks() {
        let d = doc(vec![p(vec![bold("a"), br(), txt("b")])]);
        let mut tr = Transform::new(d);
        tr.set_block_type(1, 1, NodeKind::CodeBlock, None).unwrap();
        assert_eq!(tr.doc(), &doc(vec![code_block("a\nb")]));
    }

    #[test]
    fn test_set_node_markup_keeps_content() {
        let d = doc(vec![ul(vec![li(vec![p(vec![txt("a")])])])]);
        let mut tr = Transform::new(d);
        tr.set_node_markup(0, NodeKind::OrderedList, None).unwrap();
        assert_eq!(tr.doc(), &doc(vec![ol(vec![li(vec![p(vec![txt("a")])])])]));
    }

    #[test]
    fn test_join_point_finds_adjacent_blockquotes() {
        // 0 <bq> 1 <p> 2 a 3 </p> 4 </bq> 5 <bq> 6 <p> 7 b 8 </p> 9 </bq> 10
        let d = doc(vec![
            blockquote(vec![p(vec![txt("a")])]),
            blockquote(vec![p(vec![txt("b")])]),
        ]);
        assert_eq!(join_point(&d, 7, true), Some(5));
        assert_eq!(join_point(&d, 3, false), Some(5));
    }

    #[test]
    fn test_join_point_skips_textblocks() {
        let d = doc(vec![p(vec![txt("a")]), p(vec![txt("b")])]);
        assert_eq!(join_point(&d, 4, true), None);
    }
}

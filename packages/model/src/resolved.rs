use crate::error::{ModelError, ModelResult};
use crate::mark::Mark;
use crate::node::Node;
use std::fmt;

#[derive(Clone)]
struct PathEntry {
    node: Node,
    index: usize,
    /// Absolute position where the child at `index` starts
    offset: usize,
}

/// A position resolved against one document: the chain of ancestors that
/// contain it and the child index at every depth.
///
/// Depth 0 is the document itself; `depth()` is the innermost node whose
/// content contains the position (the parent).
#[derive(Clone)]
pub struct ResolvedPos {
    pos: usize,
    path: Vec<PathEntry>,
    parent_offset: usize,
}

impl ResolvedPos {
    pub(crate) fn resolve(doc: &Node, pos: usize) -> ModelResult<ResolvedPos> {
        let size = doc.content().size();
        if pos > size {
            return Err(ModelError::PositionOutOfRange { pos, size });
        }
        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc.clone();
        loop {
            let (index, offset) = node.content().find_index(parent_offset)?;
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let child = node.child(index).clone();
            if child.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }
        Ok(ResolvedPos {
            pos,
            path,
            parent_offset,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn doc(&self) -> &Node {
        &self.path[0].node
    }

    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth() && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// Start of the content of the ancestor at `depth`
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content().size()
    }

    /// Position before the ancestor at `depth` (`depth >= 1`)
    pub fn before(&self, depth: usize) -> usize {
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset
        }
    }

    /// Position after the ancestor at `depth` (`depth >= 1`)
    pub fn after(&self, depth: usize) -> usize {
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset + self.path[depth].node.node_size()
        }
    }

    /// Offset into the text node the position points into, 0 between nodes
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let child = parent.maybe_child(index)?;
        let offset = self.text_offset();
        if offset > 0 {
            Some(child.cut(offset, child.node_size()))
        } else {
            Some(child.clone())
        }
    }

    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return parent.maybe_child(index).map(|child| child.cut(0, offset));
        }
        if index == 0 {
            None
        } else {
            parent.maybe_child(index - 1).cloned()
        }
    }

    /// Absolute position of child `index` of the ancestor at `depth`
    pub fn pos_at_index(&self, index: usize, depth: usize) -> usize {
        let node = self.node(depth);
        let mut pos = self.start(depth);
        for child in node.content().iter().take(index) {
            pos += child.node_size();
        }
        pos
    }

    /// Marks that text inserted here would get. Non-inclusive marks (links)
    /// only continue when the node after carries them too.
    pub fn marks(&self) -> Vec<Mark> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if parent.content().size() == 0 {
            return Vec::new();
        }
        if self.text_offset() > 0 {
            return parent.child(index).marks().to_vec();
        }
        let mut main = if index > 0 {
            parent.maybe_child(index - 1)
        } else {
            None
        };
        let mut other = parent.maybe_child(index);
        if main.is_none() {
            std::mem::swap(&mut main, &mut other);
        }
        let Some(main) = main else {
            return Vec::new();
        };
        main.marks()
            .iter()
            .filter(|mark| {
                mark.kind().spec().inclusive
                    || other.map_or(false, |other| mark.is_in_set(other.marks()))
            })
            .cloned()
            .collect()
    }

    /// Deepest depth whose node contains both this position and `pos`
    pub fn shared_depth(&self, pos: usize) -> usize {
        for depth in (1..=self.depth()).rev() {
            if self.start(depth) <= pos && self.end(depth) >= pos {
                return depth;
            }
        }
        0
    }

    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.depth() == other.depth()
            && self.pos - self.parent_offset == other.pos - other.parent_offset
    }

    /// The range of sibling blocks around this position and `other`,
    /// optionally requiring the parent to satisfy `pred`
    pub fn block_range(
        &self,
        other: &ResolvedPos,
        pred: Option<&dyn Fn(&Node) -> bool>,
    ) -> Option<NodeRange> {
        if other.pos < self.pos {
            return other.block_range(self, pred);
        }
        let skip = if self.parent().inline_content() || self.pos == other.pos {
            1
        } else {
            0
        };
        let top = self.depth() as isize - skip;
        let mut depth = top;
        while depth >= 0 {
            let d = depth as usize;
            if other.pos <= self.end(d) && pred.map_or(true, |pred| pred(self.node(d))) {
                return Some(NodeRange::new(self.clone(), other.clone(), d));
            }
            depth -= 1;
        }
        None
    }
}

impl fmt::Debug for ResolvedPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolvedPos({}", self.pos)?;
        for depth in 1..=self.depth() {
            write!(f, " {}_{}", self.node(depth).kind().name(), self.index(depth - 1))?;
        }
        write!(f, ":{})", self.parent_offset)
    }
}

/// A flat range of sibling nodes inside the node at `depth`
#[derive(Debug, Clone)]
pub struct NodeRange {
    pub from: ResolvedPos,
    pub to: ResolvedPos,
    pub depth: usize,
}

impl NodeRange {
    pub fn new(from: ResolvedPos, to: ResolvedPos, depth: usize) -> Self {
        NodeRange { from, to, depth }
    }

    pub fn start(&self) -> usize {
        self.from.before(self.depth + 1)
    }

    pub fn end(&self) -> usize {
        self.to.after(self.depth + 1)
    }

    pub fn parent(&self) -> &Node {
        self.from.node(self.depth)
    }

    pub fn start_index(&self) -> usize {
        self.from.index(self.depth)
    }

    pub fn end_index(&self) -> usize {
        self.to.index_after(self.depth)
    }
}

#[cfg(test)]
mod tests {
    use crate::builders::*;
    use crate::schema::{MarkKind, NodeKind};

    fn sample() -> crate::Node {
        // 0 <p> 1 a 2 b 3 </p> 4 <blockquote> 5 <p> 6 c 7 </p> 8 </blockquote> 9
        doc(vec![
            p(vec![txt("ab")]),
            blockquote(vec![p(vec![txt("c")])]),
        ])
    }

    #[test]
    fn test_resolve_every_position() {
        let d = sample();
        for pos in 0..=d.content().size() {
            let r = d.resolve(pos).unwrap();
            assert_eq!(r.pos(), pos);
            assert!(r.start(r.depth()) <= pos && pos <= r.end(r.depth()));
            for depth in 1..=r.depth() {
                assert!(r.before(depth) < r.after(depth));
                assert_eq!(r.start(depth), r.before(depth) + 1);
                assert_eq!(r.end(depth), r.after(depth) - 1);
            }
        }
        assert!(d.resolve(d.content().size() + 1).is_err());
    }

    #[test]
    fn test_resolve_nested() {
        let d = sample();
        let r = d.resolve(6).unwrap();
        assert_eq!(r.depth(), 2);
        assert_eq!(r.node(1).kind(), NodeKind::Blockquote);
        assert_eq!(r.parent().kind(), NodeKind::Paragraph);
        assert_eq!(r.before(1), 4);
        assert_eq!(r.after(1), 9);
        assert_eq!(r.start(2), 6);
        assert_eq!(r.index(0), 1);
        assert_eq!(r.node_after().unwrap().as_text(), Some("c"));
        assert!(r.node_before().is_none());
    }

    #[test]
    fn test_text_offset_and_neighbours() {
        let d = sample();
        let r = d.resolve(2).unwrap();
        assert_eq!(r.text_offset(), 1);
        assert_eq!(r.node_before().unwrap().as_text(), Some("a"));
        assert_eq!(r.node_after().unwrap().as_text(), Some("b"));
        assert_eq!(r.index_after(1), 1);
    }

    #[test]
    fn test_marks_exclude_link_at_end() {
        let d = doc(vec![p(vec![link("site", "abc"), txt("d")])]);
        let inside = d.resolve(2).unwrap();
        assert!(inside.marks().iter().any(|m| m.kind() == MarkKind::Link));
        let after = d.resolve(4).unwrap();
        assert!(after.marks().is_empty());
        let b = doc(vec![p(vec![bold("ab")])]);
        assert_eq!(b.resolve(3).unwrap().marks().len(), 1);
    }

    #[test]
    fn test_block_range() {
        let d = sample();
        let a = d.resolve(2).unwrap();
        let b = d.resolve(6).unwrap();
        let range = a.block_range(&b, None).unwrap();
        assert_eq!(range.depth, 0);
        assert_eq!(range.start(), 0);
        assert_eq!(range.end(), 9);
        assert_eq!(range.start_index(), 0);
        assert_eq!(range.end_index(), 2);

        let single = d.resolve(6).unwrap();
        let range = single.block_range(&single, None).unwrap();
        assert_eq!(range.depth, 1);
        assert_eq!(range.parent().kind(), NodeKind::Blockquote);
    }
}

use crate::error::{ModelError, ModelResult};
use crate::node::Node;
use crate::schema::NodeKind;
use std::fmt;

/// Ordered children of a node with their cached total size.
///
/// Adjacent text nodes with identical marks are always merged and empty text
/// nodes are never stored, so two fragments describing the same content
/// compare equal.
#[derive(Clone, Default, PartialEq)]
pub struct Fragment {
    nodes: Vec<Node>,
    size: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_node(node: Node) -> Self {
        Self::from_vec(vec![node])
    }

    pub fn from_vec(nodes: Vec<Node>) -> Self {
        let mut joined: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            push_joined(&mut joined, node);
        }
        let size = joined.iter().map(Node::node_size).sum();
        Fragment {
            nodes: joined,
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child at `index`. Panics when out of bounds, like slice indexing.
    pub fn child(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.nodes.iter().map(Node::kind)
    }

    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.size == 0 && other.nodes.is_empty() {
            return self.clone();
        }
        if self.size == 0 && self.nodes.is_empty() {
            return other.clone();
        }
        let mut nodes = self.nodes.clone();
        for node in &other.nodes {
            push_joined(&mut nodes, node.clone());
        }
        Fragment {
            nodes,
            size: self.size + other.size,
        }
    }

    /// The content between two offsets, cutting nodes that straddle them
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to == self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        let mut size = 0;
        if to > from {
            let mut pos = 0;
            for child in &self.nodes {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let child = if pos < from || end > to {
                        if child.is_text() {
                            child.cut(from.saturating_sub(pos), child.node_size().min(to - pos))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                child.content().size().min(to - pos - 1),
                            )
                        }
                    } else {
                        child.clone()
                    };
                    size += child.node_size();
                    result.push(child);
                }
                pos = end;
            }
        }
        Fragment {
            nodes: result,
            size,
        }
    }

    pub fn cut_by_index(&self, from: usize, to: usize) -> Fragment {
        if from == to {
            return Fragment::empty();
        }
        if from == 0 && to == self.nodes.len() {
            return self.clone();
        }
        let nodes = self.nodes[from..to].to_vec();
        let size = nodes.iter().map(Node::node_size).sum();
        Fragment { nodes, size }
    }

    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.nodes.clone();
        let size = self.size + node.node_size() - nodes[index].node_size();
        nodes[index] = node;
        Fragment { nodes, size }
    }

    pub fn add_to_start(&self, node: Node) -> Fragment {
        Fragment::from_node(node).append(self)
    }

    pub fn add_to_end(&self, node: Node) -> Fragment {
        self.append(&Fragment::from_node(node))
    }

    /// Index of the child at `pos` and that child's start offset.
    ///
    /// A position on a child boundary resolves to the child after it.
    pub fn find_index(&self, pos: usize) -> ModelResult<(usize, usize)> {
        if pos == 0 {
            return Ok((0, 0));
        }
        if pos == self.size {
            return Ok((self.nodes.len(), self.size));
        }
        if pos > self.size {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        let mut cur = 0;
        for (index, child) in self.nodes.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos {
                    return Ok((index + 1, end));
                }
                return Ok((index, cur));
            }
            cur = end;
        }
        Err(ModelError::PositionOutOfRange {
            pos,
            size: self.size,
        })
    }

    /// Calls `f(node, pos, parent, index)` for every node overlapping
    /// `from..to`, descending into a node's children when `f` returns true
    pub(crate) fn nodes_between<F>(
        &self,
        from: usize,
        to: usize,
        f: &mut F,
        node_start: usize,
        parent: &Node,
    ) where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        let mut pos = 0;
        for (index, child) in self.nodes.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent, index) && child.content().size() > 0
            {
                let start = pos + 1;
                child.content().nodes_between(
                    from.saturating_sub(start),
                    child.content().size().min(to - start),
                    f,
                    node_start + start,
                    child,
                );
            }
            pos = end;
        }
    }
}

fn push_joined(nodes: &mut Vec<Node>, node: Node) {
    if node.is_text() && node.node_size() == 0 {
        return;
    }
    if let Some(last) = nodes.last_mut() {
        if let (Some(a), Some(b)) = (last.as_text(), node.as_text()) {
            if last.same_markup(&node) {
                let joined = last.with_text(format!("{}{}", a, b));
                *last = joined;
                return;
            }
        }
    }
    nodes.push(node);
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", node)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::Mark;
    use crate::schema::MarkKind;

    #[test]
    fn test_merges_adjacent_text() {
        let fragment = Fragment::from_vec(vec![
            Node::text("ab", vec![]),
            Node::text("", vec![]),
            Node::text("cd", vec![]),
            Node::text("ef", vec![Mark::of(MarkKind::Bold)]),
        ]);
        assert_eq!(fragment.child_count(), 2);
        assert_eq!(fragment.child(0).as_text(), Some("abcd"));
        assert_eq!(fragment.size(), 6);
    }

    #[test]
    fn test_cut_text() {
        let fragment = Fragment::from_vec(vec![
            Node::text("hello", vec![]),
            Node::text("world", vec![Mark::of(MarkKind::Italic)]),
        ]);
        let cut = fragment.cut(3, 7);
        assert_eq!(cut.size(), 4);
        assert_eq!(cut.child(0).as_text(), Some("lo"));
        assert_eq!(cut.child(1).as_text(), Some("wo"));
    }

    #[test]
    fn test_find_index() {
        let fragment = Fragment::from_vec(vec![
            Node::text("ab", vec![]),
            Node::text("cd", vec![Mark::of(MarkKind::Bold)]),
        ]);
        assert_eq!(fragment.find_index(0).unwrap(), (0, 0));
        assert_eq!(fragment.find_index(1).unwrap(), (0, 0));
        assert_eq!(fragment.find_index(2).unwrap(), (1, 2));
        assert_eq!(fragment.find_index(4).unwrap(), (2, 4));
        assert!(fragment.find_index(5).is_err());
    }
}

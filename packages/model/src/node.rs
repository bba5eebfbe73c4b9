//! # Document nodes
//!
//! A [`Node`] is an immutable, reference-counted tree element. Editing never
//! mutates a node: operations return new nodes that share every untouched
//! subtree with the old version.
//!
//! ## Sizes and positions
//!
//! ```text
//!   doc( paragraph( "ab" ), mainImage )
//!  0    1            2  3  4          5
//! ```
//!
//! A text node's size is its character count, a leaf's size is 1 and every
//! other node's size is its content size plus 2 (open and close tokens).

use crate::attrs::Attrs;
use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::{normalize_set, Mark};
use crate::replace::replace;
use crate::resolved::ResolvedPos;
use crate::schema::{MarkKind, NodeKind};
use crate::slice::Slice;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Node(Arc<NodeData>);

#[derive(PartialEq)]
struct NodeData {
    kind: NodeKind,
    attrs: Attrs,
    content: Fragment,
    marks: Vec<Mark>,
    text: Option<String>,
    size: usize,
}

impl Node {
    /// Creates a node without validating its content
    pub fn new(kind: NodeKind, attrs: Option<&Attrs>, content: Fragment, marks: Vec<Mark>) -> Node {
        let size = if kind.is_leaf() {
            1
        } else {
            content.size() + 2
        };
        Node(Arc::new(NodeData {
            kind,
            attrs: kind.compute_attrs(attrs),
            content,
            marks: normalize_set(marks),
            text: None,
            size,
        }))
    }

    pub fn text(text: impl Into<String>, marks: Vec<Mark>) -> Node {
        let text = text.into();
        let size = text.chars().count();
        Node(Arc::new(NodeData {
            kind: NodeKind::Text,
            attrs: Attrs::new(),
            content: Fragment::empty(),
            marks: normalize_set(marks),
            text: Some(text),
            size,
        }))
    }

    /// Creates a node and validates its direct content
    pub fn create_checked(
        kind: NodeKind,
        attrs: Option<&Attrs>,
        content: Fragment,
        marks: Vec<Mark>,
    ) -> ModelResult<Node> {
        kind.check_attrs(&kind.compute_attrs(attrs))?;
        if !content_valid(kind, &content) {
            return Err(ModelError::schema(
                kind.name(),
                format!("invalid content {:?}", content),
            ));
        }
        Ok(Node::new(kind, attrs, content, marks))
    }

    /// Minimal valid node of `kind` (required children filled recursively)
    pub fn fill(kind: NodeKind, attrs: Option<&Attrs>) -> Node {
        let children = kind
            .content()
            .required_kinds()
            .into_iter()
            .map(|child| Node::fill(child, None))
            .collect();
        Node::new(kind, attrs, Fragment::from_vec(children), Vec::new())
    }

    /// The document every editor falls back to: one empty paragraph
    pub fn default_doc() -> Node {
        Node::fill(NodeKind::Doc, None)
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.0.attrs.get(name)
    }

    pub fn content(&self) -> &Fragment {
        &self.0.content
    }

    pub fn marks(&self) -> &[Mark] {
        &self.0.marks
    }

    pub fn as_text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn node_size(&self) -> usize {
        self.0.size
    }

    pub fn child_count(&self) -> usize {
        self.0.content.child_count()
    }

    pub fn child(&self, index: usize) -> &Node {
        self.0.content.child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.0.content.maybe_child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.0.content.last_child()
    }

    pub fn is_text(&self) -> bool {
        self.0.kind.is_text()
    }

    pub fn is_inline(&self) -> bool {
        self.0.kind.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.0.kind.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.0.kind.is_textblock()
    }

    pub fn inline_content(&self) -> bool {
        self.0.kind.inline_content()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.kind.is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.0.kind.is_atom()
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn same_markup(&self, other: &Node) -> bool {
        self.kind() == other.kind() && self.attrs() == other.attrs() && self.marks() == other.marks()
    }

    pub fn has_markup(&self, kind: NodeKind, attrs: Option<&Attrs>) -> bool {
        self.kind() == kind && *self.attrs() == kind.compute_attrs(attrs)
    }

    /// Same kind, attrs and marks with new content
    pub fn copy(&self, content: Fragment) -> Node {
        if self.is_text() {
            return self.clone();
        }
        let size = if self.is_leaf() { 1 } else { content.size() + 2 };
        Node(Arc::new(NodeData {
            kind: self.0.kind,
            attrs: self.0.attrs.clone(),
            content,
            marks: self.0.marks.clone(),
            text: None,
            size,
        }))
    }

    pub fn with_marks(&self, marks: Vec<Mark>) -> Node {
        let marks = normalize_set(marks);
        if marks == self.0.marks {
            return self.clone();
        }
        Node(Arc::new(NodeData {
            kind: self.0.kind,
            attrs: self.0.attrs.clone(),
            content: self.0.content.clone(),
            marks,
            text: self.0.text.clone(),
            size: self.0.size,
        }))
    }

    /// Same node with its attributes replaced (undeclared names dropped,
    /// missing ones defaulted)
    pub fn with_attrs(&self, attrs: &Attrs) -> Node {
        Node(Arc::new(NodeData {
            kind: self.0.kind,
            attrs: self.0.kind.compute_attrs(Some(attrs)),
            content: self.0.content.clone(),
            marks: self.0.marks.clone(),
            text: self.0.text.clone(),
            size: self.0.size,
        }))
    }

    pub fn with_text(&self, text: String) -> Node {
        Node::text(text, self.0.marks.clone())
    }

    /// The part of this node between two content offsets
    pub fn cut(&self, from: usize, to: usize) -> Node {
        if let Some(text) = self.as_text() {
            if from == 0 && to == self.node_size() {
                return self.clone();
            }
            return self.with_text(char_slice(text, from, to).to_string());
        }
        if from == 0 && to == self.content().size() {
            return self.clone();
        }
        self.copy(self.content().cut(from, to))
    }

    pub fn text_content(&self) -> String {
        match self.as_text() {
            Some(text) => text.to_string(),
            None => self.text_between(0, self.content().size(), "", None),
        }
    }

    /// Text between two positions. `block_separator` goes between textblocks
    /// and `leaf_text` stands in for non-text leaves.
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: &str,
        leaf_text: Option<&str>,
    ) -> String {
        let mut text = String::new();
        let mut first = true;
        self.nodes_between(from, to, &mut |node, pos, _, _| {
            let node_text = match node.as_text() {
                Some(t) => {
                    let start = from.max(pos) - pos;
                    let end = (to - pos).min(node.node_size());
                    char_slice(t, start, end).to_string()
                }
                None if node.is_leaf() => leaf_text.unwrap_or("").to_string(),
                None => String::new(),
            };
            let separates = (node.is_block() && node.is_leaf() && !node_text.is_empty())
                || node.is_textblock();
            if separates && !block_separator.is_empty() {
                if first {
                    first = false;
                } else {
                    text.push_str(block_separator);
                }
            }
            text.push_str(&node_text);
            true
        });
        text
    }

    /// Calls `f(node, pos, parent, index)` for every descendant overlapping
    /// `from..to`; returning false skips the node's children
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.content().nodes_between(from, to, f, 0, self);
    }

    /// Pre-order walk over every descendant
    pub fn descendants<F>(&self, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.nodes_between(0, self.content().size(), f);
    }

    pub fn node_at(&self, pos: usize) -> Option<Node> {
        let mut node = self.clone();
        let mut pos = pos;
        loop {
            let (index, offset) = node.content().find_index(pos).ok()?;
            let child = node.maybe_child(index)?.clone();
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    /// The direct child starting at or containing `pos`, with its index and
    /// start offset
    pub fn child_after(&self, pos: usize) -> Option<(Node, usize, usize)> {
        let (index, offset) = self.content().find_index(pos).ok()?;
        self.maybe_child(index)
            .map(|child| (child.clone(), index, offset))
    }

    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos> {
        ResolvedPos::resolve(self, pos)
    }

    /// The content between two positions, with open depths
    pub fn slice(&self, from: usize, to: usize) -> ModelResult<Slice> {
        if from == to {
            return Ok(Slice::empty());
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        let depth = rfrom.shared_depth(to);
        let start = rfrom.start(depth);
        let content = rfrom
            .node(depth)
            .content()
            .cut(rfrom.pos() - start, rto.pos() - start);
        Ok(Slice::new(
            content,
            rfrom.depth() - depth,
            rto.depth() - depth,
        ))
    }

    /// Replaces `from..to` with `slice`, validating every touched parent
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> ModelResult<Node> {
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        replace(&rfrom, &rto, slice)
    }

    pub fn range_has_mark(&self, from: usize, to: usize, kind: MarkKind) -> bool {
        let mut found = false;
        if to > from {
            self.nodes_between(from, to, &mut |node, _, _, _| {
                if node.marks().iter().any(|mark| mark.kind() == kind) {
                    found = true;
                }
                !found
            });
        }
        found
    }

    /// Whether replacing children `from..to` with `replacement` keeps this
    /// node's content valid
    pub fn can_replace(&self, from: usize, to: usize, replacement: &Fragment) -> bool {
        let content = self.content();
        let kinds = content
            .nodes()
            .iter()
            .take(from)
            .chain(replacement.iter())
            .chain(content.nodes().iter().skip(to))
            .map(Node::kind);
        if !self.kind().content().matches(kinds) {
            return false;
        }
        self.kind().allows_marks() || replacement.iter().all(|node| node.marks().is_empty())
    }

    pub fn can_replace_with(&self, from: usize, to: usize, kind: NodeKind) -> bool {
        let content = self.content();
        let kinds = content
            .nodes()
            .iter()
            .take(from)
            .map(Node::kind)
            .chain(std::iter::once(kind))
            .chain(content.nodes().iter().skip(to).map(Node::kind));
        self.kind().content().matches(kinds)
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        let mut count = 0;
        self.descendants(&mut |node, _, _, _| {
            if node.kind() == kind {
                count += 1;
            }
            !node.is_atom()
        });
        count
    }

    /// Validates this node and every descendant against the schema
    pub fn check(&self) -> ModelResult<()> {
        self.check_node()?;
        if self.kind() == NodeKind::Doc && self.count_kind(NodeKind::MainImage) > 1 {
            return Err(ModelError::schema(
                NodeKind::Doc.name(),
                "more than one main image",
            ));
        }
        Ok(())
    }

    fn check_node(&self) -> ModelResult<()> {
        if self.is_text() {
            if self.node_size() == 0 {
                return Err(ModelError::schema("text", "empty text node"));
            }
            return Ok(());
        }
        self.kind().check_attrs(self.attrs())?;
        if !content_valid(self.kind(), self.content()) {
            return Err(ModelError::schema(
                self.kind().name(),
                format!("invalid content {:?}", self.content()),
            ));
        }
        for child in self.content() {
            child.check_node()?;
        }
        Ok(())
    }
}

/// Whether `content` is valid for a node of `kind`
pub fn content_valid(kind: NodeKind, content: &Fragment) -> bool {
    kind.content().matches(content.kinds())
        && (kind.allows_marks() || content.iter().all(|node| node.marks().is_empty()))
}

/// Substring by character offsets
pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> &str {
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let start = indices.nth(from).unwrap_or(text.len());
    let end = if to > from {
        indices.nth(to - from - 1).unwrap_or(text.len())
    } else {
        start
    };
    &text[start..end]
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.as_text() {
            let mut out = format!("{:?}", text);
            for mark in self.marks().iter().rev() {
                out = format!("{:?}({})", mark, out);
            }
            return f.write_str(&out);
        }
        f.write_str(self.kind().name())?;
        if self.child_count() > 0 {
            write!(f, "({:?})", self.content())?;
        }
        Ok(())
    }
}

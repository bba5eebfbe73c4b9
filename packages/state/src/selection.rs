//! # Selection
//!
//! Where the user is: a text cursor or range inside inline content, or a
//! single selected node (media atoms, rules).
//!
//! ```text
//!   Text { anchor: 2, head: 5 }      doc( p("a|bc|d") )
//!   Node { anchor: 0, head: 1 }      doc( [mainImage], p("…") )
//! ```
//!
//! Selections are plain positions. They are only meaningful against the
//! document they were made for and are remapped after every transaction.

use quire_model::{Node, ResolvedPos};
use quire_transform::{Assoc, Mappable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Selection {
    Text { anchor: usize, head: usize },
    /// `head` is the position after the selected node
    Node { anchor: usize, head: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionKind {
    /// No editor is mounted
    Detached,
    Collapsed,
    Range,
    Node,
}

impl Selection {
    pub fn text(anchor: usize, head: usize) -> Self {
        Selection::Text { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Selection::Text {
            anchor: pos,
            head: pos,
        }
    }

    /// Selects the node starting at `pos`, if there is a selectable one
    pub fn node(doc: &Node, pos: usize) -> Option<Self> {
        let node = doc.node_at(pos)?;
        if node.is_text() || !node.kind().spec().selectable {
            return None;
        }
        Some(Selection::Node {
            anchor: pos,
            head: pos + node.node_size(),
        })
    }

    pub fn anchor(&self) -> usize {
        match *self {
            Selection::Text { anchor, .. } | Selection::Node { anchor, .. } => anchor,
        }
    }

    pub fn head(&self) -> usize {
        match *self {
            Selection::Text { head, .. } | Selection::Node { head, .. } => head,
        }
    }

    pub fn from(&self) -> usize {
        self.anchor().min(self.head())
    }

    pub fn to(&self) -> usize {
        self.anchor().max(self.head())
    }

    pub fn empty(&self) -> bool {
        self.from() == self.to()
    }

    pub fn kind(&self) -> SelectionKind {
        match self {
            Selection::Node { .. } => SelectionKind::Node,
            Selection::Text { .. } if self.empty() => SelectionKind::Collapsed,
            Selection::Text { .. } => SelectionKind::Range,
        }
    }

    /// The collapsed text position, if this is a cursor
    pub fn cursor_pos(&self) -> Option<usize> {
        match *self {
            Selection::Text { anchor, head } if anchor == head => Some(head),
            _ => None,
        }
    }

    /// The selected node, for node selections
    pub fn selected_node(&self, doc: &Node) -> Option<Node> {
        match *self {
            Selection::Node { anchor, .. } => doc.node_at(anchor),
            Selection::Text { .. } => None,
        }
    }

    /// Whether the selection points at valid places in `doc`
    pub fn is_valid(&self, doc: &Node) -> bool {
        let size = doc.content().size();
        match *self {
            Selection::Text { anchor, head } => {
                anchor <= size
                    && head <= size
                    && [anchor, head].iter().all(|pos| {
                        doc.resolve(*pos)
                            .map(|rpos| rpos.parent().inline_content())
                            .unwrap_or(false)
                    })
            }
            Selection::Node { anchor, head } => {
                Selection::node(doc, anchor).map_or(false, |sel| sel.head() == head)
            }
        }
    }

    /// First valid selection in the document
    pub fn at_start(doc: &Node) -> Self {
        doc.resolve(0)
            .ok()
            .and_then(|rpos| Self::find_from(&rpos, true, false))
            .unwrap_or_else(|| Selection::cursor(0))
    }

    /// Last valid selection in the document
    pub fn at_end(doc: &Node) -> Self {
        doc.resolve(doc.content().size())
            .ok()
            .and_then(|rpos| Self::find_from(&rpos, false, false))
            .unwrap_or_else(|| Selection::cursor(0))
    }

    /// A valid selection at or near `rpos`, searching in the `forward`
    /// direction first
    pub fn near(rpos: &ResolvedPos, forward: bool) -> Self {
        Self::find_from(rpos, forward, false)
            .or_else(|| Self::find_from(rpos, !forward, false))
            .unwrap_or_else(|| Selection::at_start(rpos.doc()))
    }

    /// The first cursor or selectable node found from `rpos` in one
    /// direction, climbing out of the parent when it has none
    pub fn find_from(rpos: &ResolvedPos, forward: bool, text_only: bool) -> Option<Self> {
        let doc = rpos.doc();
        if rpos.parent().inline_content() {
            return Some(Selection::cursor(rpos.pos()));
        }
        let depth = rpos.depth();
        if let Some(found) = find_in(
            doc,
            rpos.parent(),
            rpos.pos(),
            rpos.index(depth),
            forward,
            text_only,
        ) {
            return Some(found);
        }
        for d in (0..depth).rev() {
            let found = if forward {
                find_in(
                    doc,
                    rpos.node(d),
                    rpos.after(d + 1),
                    rpos.index(d) + 1,
                    forward,
                    text_only,
                )
            } else {
                find_in(
                    doc,
                    rpos.node(d),
                    rpos.before(d + 1),
                    rpos.index(d),
                    forward,
                    text_only,
                )
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// This selection carried through `mapping` onto `doc`.
    ///
    /// Text selections map both ends forward and fall back to the nearest
    /// valid place when the head leaves inline content. Node selections
    /// whose node was deleted fall back the same way.
    pub fn map(&self, doc: &Node, mapping: &dyn Mappable) -> Self {
        match *self {
            Selection::Text { anchor, head } => {
                let head = mapping.map(head, Assoc::After);
                let Ok(rhead) = doc.resolve(head) else {
                    return Selection::at_start(doc);
                };
                if !rhead.parent().inline_content() {
                    return Selection::near(&rhead, true);
                }
                let anchor = mapping.map(anchor, Assoc::After);
                let anchor_inline = doc
                    .resolve(anchor)
                    .map(|r| r.parent().inline_content())
                    .unwrap_or(false);
                Selection::text(if anchor_inline { anchor } else { head }, head)
            }
            Selection::Node { anchor, .. } => {
                let result = mapping.map_result(anchor, Assoc::After);
                let Ok(rpos) = doc.resolve(result.pos) else {
                    return Selection::at_start(doc);
                };
                if result.deleted {
                    return Selection::near(&rpos, true);
                }
                Selection::node(doc, result.pos).unwrap_or_else(|| Selection::near(&rpos, true))
            }
        }
    }

    /// Recovers a selection that may not fit `doc` any more (the document
    /// was replaced out of band): positions are clamped into range and an
    /// invalid result moves to the nearest valid place
    pub fn clamp(&self, doc: &Node) -> Self {
        if self.is_valid(doc) {
            return *self;
        }
        let size = doc.content().size();
        let clamped = match *self {
            Selection::Text { anchor, head } => Selection::text(anchor.min(size), head.min(size)),
            Selection::Node { anchor, head } => Selection::Node {
                anchor: anchor.min(size),
                head: head.min(size),
            },
        };
        if clamped.is_valid(doc) {
            return clamped;
        }
        match doc.resolve(clamped.head().min(size)) {
            Ok(rpos) => Selection::near(&rpos, false),
            Err(_) => Selection::at_start(doc),
        }
    }
}

fn find_in(
    doc: &Node,
    node: &Node,
    pos: usize,
    index: usize,
    forward: bool,
    text_only: bool,
) -> Option<Selection> {
    if node.inline_content() {
        return Some(Selection::cursor(pos));
    }
    let count = node.child_count();
    let indices: Box<dyn Iterator<Item = usize>> = if forward {
        Box::new(index..count)
    } else {
        Box::new((0..index.min(count)).rev())
    };
    let mut pos = pos;
    for i in indices {
        let child = node.child(i);
        if !child.is_atom() {
            let inner_pos = if forward { pos + 1 } else { pos - 1 };
            let inner_index = if forward { 0 } else { child.child_count() };
            if let Some(found) = find_in(doc, child, inner_pos, inner_index, forward, text_only) {
                return Some(found);
            }
        } else if !text_only && child.kind().spec().selectable {
            let start = if forward { pos } else { pos - child.node_size() };
            return Selection::node(doc, start);
        }
        if forward {
            pos += child.node_size();
        } else {
            pos -= child.node_size();
        }
    }
    None
}

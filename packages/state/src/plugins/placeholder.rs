//! Placeholder decorations for empty paragraphs

use crate::plugin::{Decoration, Plugin};
use crate::state::EditorState;
use quire_model::{Node, NodeKind};

pub const PLACEHOLDER_KEY: &str = "placeholder";

/// Marks empty paragraphs. The paragraph that opens the article (after the
/// main image, if there is one) shows the placeholder text; every other
/// empty paragraph only gets the generic `is-empty` class.
pub struct PlaceholderPlugin {
    text: String,
}

impl PlaceholderPlugin {
    pub fn new(text: impl Into<String>) -> Self {
        PlaceholderPlugin { text: text.into() }
    }
}

fn is_empty_paragraph(node: &Node) -> bool {
    node.kind() == NodeKind::Paragraph && node.content().size() == 0
}

/// Position of the first top-level block that is not the main image
fn opening_block(doc: &Node) -> Option<usize> {
    let mut pos = 0;
    for child in doc.content() {
        if child.kind() != NodeKind::MainImage {
            return Some(pos);
        }
        pos += child.node_size();
    }
    None
}

impl Plugin for PlaceholderPlugin {
    fn key(&self) -> &'static str {
        PLACEHOLDER_KEY
    }

    fn decorations(&self, state: &EditorState) -> Vec<Decoration> {
        let doc = state.doc();
        let opening = opening_block(doc);
        let mut decorations = Vec::new();
        doc.descendants(&mut |node: &Node, pos: usize, _parent: &Node, _index: usize| {
            if is_empty_paragraph(node) {
                let to = pos + node.node_size();
                let decoration = if Some(pos) == opening {
                    Decoration::node(
                        pos,
                        to,
                        &[
                            ("class", "is-empty is-editor-empty"),
                            ("data-placeholder", self.text.as_str()),
                        ],
                    )
                } else {
                    Decoration::node(pos, to, &[("class", "is-empty"), ("data-placeholder", "")])
                };
                decorations.push(decoration);
            }
            !node.is_textblock()
        });
        decorations
    }
}

//! Shorthand constructors for documents, used by tests, benches and
//! headless tooling.
//!
//! ```rust,ignore
//! let d = doc(vec![p(vec![txt("Hello "), bold("world")])]);
//! ```

use crate::attrs::Attrs;
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;
use crate::schema::{MarkKind, NodeKind};
use serde_json::Value;

fn node(kind: NodeKind, content: Vec<Node>) -> Node {
    Node::new(kind, None, Fragment::from_vec(content), Vec::new())
}

fn with_attrs(kind: NodeKind, attrs: Attrs) -> Node {
    Node::new(kind, Some(&attrs), Fragment::empty(), Vec::new())
}

pub fn doc(content: Vec<Node>) -> Node {
    node(NodeKind::Doc, content)
}

pub fn p(content: Vec<Node>) -> Node {
    node(NodeKind::Paragraph, content)
}

pub fn p_with(attrs: Attrs, content: Vec<Node>) -> Node {
    Node::new(
        NodeKind::Paragraph,
        Some(&attrs),
        Fragment::from_vec(content),
        Vec::new(),
    )
}

pub fn heading(level: i64, content: Vec<Node>) -> Node {
    let attrs = Attrs::new().with("level", level);
    Node::new(
        NodeKind::Heading,
        Some(&attrs),
        Fragment::from_vec(content),
        Vec::new(),
    )
}

pub fn blockquote(content: Vec<Node>) -> Node {
    node(NodeKind::Blockquote, content)
}

pub fn code_block(text: &str) -> Node {
    node(NodeKind::CodeBlock, vec![txt(text)])
}

pub fn hr() -> Node {
    node(NodeKind::HorizontalRule, Vec::new())
}

pub fn br() -> Node {
    node(NodeKind::HardBreak, Vec::new())
}

pub fn ul(items: Vec<Node>) -> Node {
    node(NodeKind::BulletList, items)
}

pub fn ol(items: Vec<Node>) -> Node {
    node(NodeKind::OrderedList, items)
}

pub fn li(content: Vec<Node>) -> Node {
    node(NodeKind::ListItem, content)
}

pub fn details(summary: Vec<Node>, body: Vec<Node>) -> Node {
    node(
        NodeKind::Details,
        vec![
            node(NodeKind::DetailsSummary, summary),
            node(NodeKind::DetailsContent, body),
        ],
    )
}

pub fn main_image(src: &str) -> Node {
    with_attrs(NodeKind::MainImage, Attrs::new().with("src", src))
}

pub fn image(src: &str) -> Node {
    with_attrs(NodeKind::CustomImage, Attrs::new().with("src", src))
}

pub fn video(src: &str) -> Node {
    with_attrs(NodeKind::Video, Attrs::new().with("src", src))
}

pub fn audio(src: &str) -> Node {
    with_attrs(NodeKind::AudioWaveform, Attrs::new().with("src", src))
}

pub fn carousel(items: Value) -> Node {
    with_attrs(NodeKind::ImageCarousel, Attrs::new().with("items", items))
}

pub fn txt(text: &str) -> Node {
    Node::text(text, Vec::new())
}

pub fn marked(text: &str, marks: Vec<Mark>) -> Node {
    Node::text(text, marks)
}

pub fn bold(text: &str) -> Node {
    marked(text, vec![Mark::of(MarkKind::Bold)])
}

pub fn italic(text: &str) -> Node {
    marked(text, vec![Mark::of(MarkKind::Italic)])
}

pub fn link(href: &str, text: &str) -> Node {
    marked(text, vec![Mark::link(href, "_blank")])
}

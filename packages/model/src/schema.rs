//! # Schema
//!
//! The closed set of node and mark types an article document may contain.
//!
//! Every node kind carries a static [`NodeSpec`]: its content expression,
//! its group, behavioural flags (atom, isolating, code, ...) and attribute
//! defaults. Content expressions are short sequences of [`Term`]s matched
//! greedily against a node's children, which is sufficient for every
//! expression this schema uses (`block+`, `inline*`, `paragraph block*`,
//! `detailsSummary detailsContent`, ...).

use crate::attrs::Attrs;
use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node types of an article document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Doc,
    Text,
    Paragraph,
    Heading,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    HardBreak,
    BulletList,
    OrderedList,
    ListItem,
    Details,
    DetailsSummary,
    DetailsContent,
    MainImage,
    CustomImage,
    Video,
    AudioWaveform,
    ImageCarousel,
}

/// Mark types. Declaration order is the canonical order of a mark set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link,
    TextStyle,
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Block,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Group(Group),
    Kind(NodeKind),
}

/// One element of a content expression: a matcher with a repeat range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub matcher: Matcher,
    pub min: usize,
    pub max: Option<usize>,
}

impl Term {
    const fn group(group: Group, min: usize, max: Option<usize>) -> Self {
        Term {
            matcher: Matcher::Group(group),
            min,
            max,
        }
    }

    const fn kind(kind: NodeKind, min: usize, max: Option<usize>) -> Self {
        Term {
            matcher: Matcher::Kind(kind),
            min,
            max,
        }
    }

    pub fn accepts(&self, kind: NodeKind) -> bool {
        match self.matcher {
            Matcher::Group(group) => kind.in_group(group),
            Matcher::Kind(k) => k == kind,
        }
    }
}

/// A node type's allowed children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentExpr(pub &'static [Term]);

impl ContentExpr {
    /// Leaf content: no children allowed
    pub fn is_leaf(self) -> bool {
        self.0.is_empty()
    }

    /// Whether `kinds`, in order, form valid content
    pub fn matches<I>(self, kinds: I) -> bool
    where
        I: IntoIterator<Item = NodeKind>,
    {
        let mut kinds = kinds.into_iter().peekable();
        for term in self.0 {
            let mut count = 0;
            while term.max.map_or(true, |max| count < max) {
                match kinds.peek() {
                    Some(kind) if term.accepts(*kind) => {
                        kinds.next();
                        count += 1;
                    }
                    _ => break,
                }
            }
            if count < term.min {
                return false;
            }
        }
        kinds.next().is_none()
    }

    /// Whether `kind` may appear anywhere in this content
    pub fn accepts(self, kind: NodeKind) -> bool {
        self.0.iter().any(|term| term.accepts(kind))
    }

    /// Whether valid content may start with `kind`
    pub fn accepts_first(self, kind: NodeKind) -> bool {
        for term in self.0 {
            if term.accepts(kind) {
                return true;
            }
            if term.min > 0 {
                return false;
            }
        }
        false
    }

    pub fn inline_content(self) -> bool {
        self.0.first().map_or(false, |term| match term.matcher {
            Matcher::Group(group) => group == Group::Inline,
            Matcher::Kind(kind) => kind.spec().inline,
        })
    }

    /// Kinds of the children a freshly filled node needs
    pub fn required_kinds(self) -> Vec<NodeKind> {
        let mut kinds = Vec::new();
        for term in self.0 {
            let fill = match term.matcher {
                Matcher::Kind(kind) => Some(kind),
                Matcher::Group(Group::Block) => Some(NodeKind::Paragraph),
                Matcher::Group(Group::Inline) => None,
            };
            if let Some(kind) = fill {
                kinds.extend(std::iter::repeat(kind).take(term.min));
            }
        }
        kinds
    }
}

#[derive(Debug, Clone, Copy)]
pub enum AttrDefault {
    Null,
    Str(&'static str),
    Int(i64),
    EmptyList,
}

impl AttrDefault {
    pub fn to_value(self) -> Value {
        match self {
            AttrDefault::Null => Value::Null,
            AttrDefault::Str(s) => Value::String(s.to_string()),
            AttrDefault::Int(n) => Value::from(n),
            AttrDefault::EmptyList => Value::Array(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttrSpec {
    pub name: &'static str,
    pub default: AttrDefault,
}

const fn attr(name: &'static str, default: AttrDefault) -> AttrSpec {
    AttrSpec { name, default }
}

/// Static description of a node type
#[derive(Debug)]
pub struct NodeSpec {
    pub content: ContentExpr,
    pub group: Option<Group>,
    pub inline: bool,
    pub atom: bool,
    pub selectable: bool,
    pub isolating: bool,
    pub defining: bool,
    pub code: bool,
    /// Whether inline children may carry marks
    pub marks: bool,
    pub attrs: &'static [AttrSpec],
}

/// Static description of a mark type
#[derive(Debug)]
pub struct MarkSpec {
    pub inclusive: bool,
    pub attrs: &'static [AttrSpec],
}

const BLOCK_PLUS: &[Term] = &[Term::group(Group::Block, 1, None)];
const INLINE_STAR: &[Term] = &[Term::group(Group::Inline, 0, None)];
const TEXT_STAR: &[Term] = &[Term::kind(NodeKind::Text, 0, None)];
const LIST_ITEMS: &[Term] = &[Term::kind(NodeKind::ListItem, 1, None)];
const LIST_ITEM_CONTENT: &[Term] = &[
    Term::kind(NodeKind::Paragraph, 1, Some(1)),
    Term::group(Group::Block, 0, None),
];
const DETAILS_CONTENT: &[Term] = &[
    Term::kind(NodeKind::DetailsSummary, 1, Some(1)),
    Term::kind(NodeKind::DetailsContent, 1, Some(1)),
];
const LEAF: &[Term] = &[];

const PARAGRAPH_ATTRS: &[AttrSpec] = &[
    attr("textAlign", AttrDefault::Str("left")),
    attr("textIndent", AttrDefault::Null),
];
/// Heading levels an article may use
pub const HEADING_LEVELS: [i64; 2] = [2, 3];

const HEADING_ATTRS: &[AttrSpec] = &[attr("level", AttrDefault::Int(2))];
const ORDERED_LIST_ATTRS: &[AttrSpec] = &[attr("order", AttrDefault::Int(1))];
const MAIN_IMAGE_ATTRS: &[AttrSpec] = &[
    attr("src", AttrDefault::Str("")),
    attr("alt", AttrDefault::Str("")),
    attr("title", AttrDefault::Str("")),
];
const CUSTOM_IMAGE_ATTRS: &[AttrSpec] = &[
    attr("src", AttrDefault::Str("")),
    attr("alt", AttrDefault::Str("")),
    attr("width", AttrDefault::Int(300)),
    attr("height", AttrDefault::Int(200)),
    attr("textAlign", AttrDefault::Str("left")),
    attr("caption", AttrDefault::Str("")),
];
const VIDEO_ATTRS: &[AttrSpec] = &[
    attr("src", AttrDefault::Str("")),
    attr("width", AttrDefault::Int(300)),
    attr("height", AttrDefault::Int(150)),
    attr("textAlign", AttrDefault::Str("left")),
    attr("caption", AttrDefault::Str("")),
];
const AUDIO_ATTRS: &[AttrSpec] = &[
    attr("src", AttrDefault::Str("")),
    attr("duration", AttrDefault::Int(0)),
    attr("caption", AttrDefault::Str("")),
];
const CAROUSEL_ATTRS: &[AttrSpec] = &[attr("items", AttrDefault::EmptyList)];

const fn container(content: &'static [Term], group: Option<Group>) -> NodeSpec {
    NodeSpec {
        content: ContentExpr(content),
        group,
        inline: false,
        atom: false,
        selectable: false,
        isolating: false,
        defining: false,
        code: false,
        marks: true,
        attrs: &[],
    }
}

const fn media(attrs: &'static [AttrSpec]) -> NodeSpec {
    NodeSpec {
        content: ContentExpr(LEAF),
        group: Some(Group::Block),
        inline: false,
        atom: true,
        selectable: true,
        isolating: true,
        defining: false,
        code: false,
        marks: true,
        attrs,
    }
}

static DOC: NodeSpec = container(BLOCK_PLUS, None);
static TEXT: NodeSpec = NodeSpec {
    inline: true,
    ..container(LEAF, Some(Group::Inline))
};
static PARAGRAPH: NodeSpec = NodeSpec {
    attrs: PARAGRAPH_ATTRS,
    ..container(INLINE_STAR, Some(Group::Block))
};
static HEADING: NodeSpec = NodeSpec {
    attrs: HEADING_ATTRS,
    defining: true,
    ..container(INLINE_STAR, Some(Group::Block))
};
static BLOCKQUOTE: NodeSpec = NodeSpec {
    defining: true,
    ..container(BLOCK_PLUS, Some(Group::Block))
};
static CODE_BLOCK: NodeSpec = NodeSpec {
    code: true,
    marks: false,
    defining: true,
    ..container(TEXT_STAR, Some(Group::Block))
};
static HORIZONTAL_RULE: NodeSpec = NodeSpec {
    selectable: true,
    ..container(LEAF, Some(Group::Block))
};
static HARD_BREAK: NodeSpec = NodeSpec {
    inline: true,
    ..container(LEAF, Some(Group::Inline))
};
static BULLET_LIST: NodeSpec = container(LIST_ITEMS, Some(Group::Block));
static ORDERED_LIST: NodeSpec = NodeSpec {
    attrs: ORDERED_LIST_ATTRS,
    ..container(LIST_ITEMS, Some(Group::Block))
};
static LIST_ITEM: NodeSpec = NodeSpec {
    defining: true,
    ..container(LIST_ITEM_CONTENT, None)
};
static DETAILS: NodeSpec = NodeSpec {
    defining: true,
    isolating: true,
    ..container(DETAILS_CONTENT, Some(Group::Block))
};
static DETAILS_SUMMARY: NodeSpec = NodeSpec {
    defining: true,
    ..container(INLINE_STAR, None)
};
static DETAILS_BODY: NodeSpec = NodeSpec {
    defining: true,
    ..container(BLOCK_PLUS, None)
};
static MAIN_IMAGE: NodeSpec = NodeSpec {
    defining: true,
    ..media(MAIN_IMAGE_ATTRS)
};
static CUSTOM_IMAGE: NodeSpec = media(CUSTOM_IMAGE_ATTRS);
static VIDEO: NodeSpec = media(VIDEO_ATTRS);
static AUDIO_WAVEFORM: NodeSpec = NodeSpec {
    isolating: false,
    ..media(AUDIO_ATTRS)
};
static IMAGE_CAROUSEL: NodeSpec = media(CAROUSEL_ATTRS);

impl NodeKind {
    pub const ALL: [NodeKind; 19] = [
        NodeKind::Doc,
        NodeKind::Text,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::Blockquote,
        NodeKind::CodeBlock,
        NodeKind::HorizontalRule,
        NodeKind::HardBreak,
        NodeKind::BulletList,
        NodeKind::OrderedList,
        NodeKind::ListItem,
        NodeKind::Details,
        NodeKind::DetailsSummary,
        NodeKind::DetailsContent,
        NodeKind::MainImage,
        NodeKind::CustomImage,
        NodeKind::Video,
        NodeKind::AudioWaveform,
        NodeKind::ImageCarousel,
    ];

    /// Name used in serialized documents
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Text => "text",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Blockquote => "blockquote",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::HardBreak => "hardBreak",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::Details => "details",
            NodeKind::DetailsSummary => "detailsSummary",
            NodeKind::DetailsContent => "detailsContent",
            NodeKind::MainImage => "mainImage",
            NodeKind::CustomImage => "customImage",
            NodeKind::Video => "video",
            NodeKind::AudioWaveform => "audioWaveform",
            NodeKind::ImageCarousel => "imageCarousel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn spec(self) -> &'static NodeSpec {
        match self {
            NodeKind::Doc => &DOC,
            NodeKind::Text => &TEXT,
            NodeKind::Paragraph => &PARAGRAPH,
            NodeKind::Heading => &HEADING,
            NodeKind::Blockquote => &BLOCKQUOTE,
            NodeKind::CodeBlock => &CODE_BLOCK,
            NodeKind::HorizontalRule => &HORIZONTAL_RULE,
            NodeKind::HardBreak => &HARD_BREAK,
            NodeKind::BulletList => &BULLET_LIST,
            NodeKind::OrderedList => &ORDERED_LIST,
            NodeKind::ListItem => &LIST_ITEM,
            NodeKind::Details => &DETAILS,
            NodeKind::DetailsSummary => &DETAILS_SUMMARY,
            NodeKind::DetailsContent => &DETAILS_BODY,
            NodeKind::MainImage => &MAIN_IMAGE,
            NodeKind::CustomImage => &CUSTOM_IMAGE,
            NodeKind::Video => &VIDEO,
            NodeKind::AudioWaveform => &AUDIO_WAVEFORM,
            NodeKind::ImageCarousel => &IMAGE_CAROUSEL,
        }
    }

    pub fn content(self) -> ContentExpr {
        self.spec().content
    }

    pub fn in_group(self, group: Group) -> bool {
        self.spec().group == Some(group)
    }

    pub fn is_text(self) -> bool {
        self == NodeKind::Text
    }

    pub fn is_inline(self) -> bool {
        self.spec().inline
    }

    pub fn is_block(self) -> bool {
        !self.spec().inline
    }

    pub fn is_leaf(self) -> bool {
        self.spec().content.is_leaf()
    }

    pub fn is_atom(self) -> bool {
        self.is_leaf() || self.spec().atom
    }

    pub fn is_textblock(self) -> bool {
        self.is_block() && self.spec().content.inline_content()
    }

    pub fn inline_content(self) -> bool {
        self.spec().content.inline_content()
    }

    pub fn is_list(self) -> bool {
        matches!(self, NodeKind::BulletList | NodeKind::OrderedList)
    }

    /// Media atoms that are inserted with a trailing paragraph
    pub fn is_media(self) -> bool {
        matches!(
            self,
            NodeKind::MainImage
                | NodeKind::CustomImage
                | NodeKind::Video
                | NodeKind::AudioWaveform
                | NodeKind::ImageCarousel
        )
    }

    pub fn allows_marks(self) -> bool {
        self.spec().marks
    }

    pub fn has_attr(self, name: &str) -> bool {
        self.spec().attrs.iter().any(|spec| spec.name == name)
    }

    pub fn default_attrs(self) -> Attrs {
        attrs_from_specs(self.spec().attrs, None)
    }

    /// Declared attributes filled from `given`, falling back to defaults.
    /// Undeclared names are dropped.
    pub fn compute_attrs(self, given: Option<&Attrs>) -> Attrs {
        attrs_from_specs(self.spec().attrs, given)
    }

    /// Rejects attribute values outside what the kind allows
    pub fn check_attrs(self, attrs: &Attrs) -> ModelResult<()> {
        if self == NodeKind::Heading {
            let level = attrs.get("level").and_then(Value::as_i64);
            if !level.map_or(false, |level| HEADING_LEVELS.contains(&level)) {
                return Err(ModelError::schema(
                    self.name(),
                    format!("unsupported heading level {:?}", attrs.get("level")),
                ));
            }
        }
        Ok(())
    }

    /// Whether the content of both kinds can be joined into one node
    pub fn compatible_content(self, other: NodeKind) -> bool {
        if self == other {
            return true;
        }
        let (a, b) = (self.content(), other.content());
        NodeKind::ALL
            .iter()
            .any(|kind| a.accepts(*kind) && b.accepts(*kind))
    }
}

impl MarkKind {
    pub const ALL: [MarkKind; 8] = [
        MarkKind::Bold,
        MarkKind::Italic,
        MarkKind::Underline,
        MarkKind::Strike,
        MarkKind::Code,
        MarkKind::Link,
        MarkKind::TextStyle,
        MarkKind::Highlight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkKind::Bold => "bold",
            MarkKind::Italic => "italic",
            MarkKind::Underline => "underline",
            MarkKind::Strike => "strike",
            MarkKind::Code => "code",
            MarkKind::Link => "link",
            MarkKind::TextStyle => "textStyle",
            MarkKind::Highlight => "highlight",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn spec(self) -> &'static MarkSpec {
        static PLAIN: MarkSpec = MarkSpec {
            inclusive: true,
            attrs: &[],
        };
        static LINK: MarkSpec = MarkSpec {
            inclusive: false,
            attrs: &[
                attr("href", AttrDefault::Str("")),
                attr("target", AttrDefault::Str("_blank")),
            ],
        };
        static COLOR: MarkSpec = MarkSpec {
            inclusive: true,
            attrs: &[attr("color", AttrDefault::Null)],
        };
        match self {
            MarkKind::Link => &LINK,
            MarkKind::TextStyle | MarkKind::Highlight => &COLOR,
            _ => &PLAIN,
        }
    }

    pub fn compute_attrs(self, given: Option<&Attrs>) -> Attrs {
        attrs_from_specs(self.spec().attrs, given)
    }
}

fn attrs_from_specs(specs: &[AttrSpec], given: Option<&Attrs>) -> Attrs {
    let mut attrs = Attrs::new();
    for spec in specs {
        let value = given
            .and_then(|given| given.get(spec.name))
            .cloned()
            .unwrap_or_else(|| spec.default.to_value());
        attrs.insert(spec.name, value);
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.name()), Some(kind));
        }
        for kind in MarkKind::ALL {
            assert_eq!(MarkKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(NodeKind::from_name("table"), None);
    }

    #[test]
    fn test_list_item_content() {
        let expr = NodeKind::ListItem.content();
        assert!(expr.matches([NodeKind::Paragraph]));
        assert!(expr.matches([NodeKind::Paragraph, NodeKind::BulletList]));
        assert!(!expr.matches([NodeKind::BulletList]));
        assert!(!expr.matches([]));
        assert!(expr.accepts_first(NodeKind::Paragraph));
        assert!(!expr.accepts_first(NodeKind::Heading));
    }

    #[test]
    fn test_details_content() {
        let expr = NodeKind::Details.content();
        assert!(expr.matches([NodeKind::DetailsSummary, NodeKind::DetailsContent]));
        assert!(!expr.matches([NodeKind::DetailsContent]));
        assert!(!expr.matches([
            NodeKind::DetailsSummary,
            NodeKind::DetailsContent,
            NodeKind::DetailsContent
        ]));
    }

    #[test]
    fn test_flags() {
        assert!(NodeKind::Paragraph.is_textblock());
        assert!(NodeKind::CodeBlock.is_textblock());
        assert!(!NodeKind::Blockquote.is_textblock());
        assert!(NodeKind::MainImage.is_atom());
        assert!(NodeKind::HardBreak.is_inline());
        assert!(!NodeKind::CodeBlock.allows_marks());
        assert!(!MarkKind::Link.spec().inclusive);
    }

    #[test]
    fn test_compute_attrs_fills_defaults() {
        let mut given = Attrs::new();
        given.insert("width", Value::from(640));
        given.insert("bogus", Value::from(true));
        let attrs = NodeKind::CustomImage.compute_attrs(Some(&given));
        assert_eq!(attrs.get("width"), Some(&Value::from(640)));
        assert_eq!(attrs.get("height"), Some(&Value::from(200)));
        assert_eq!(attrs.get("bogus"), None);
    }

    #[test]
    fn test_compatible_content() {
        assert!(NodeKind::Paragraph.compatible_content(NodeKind::Heading));
        assert!(NodeKind::BulletList.compatible_content(NodeKind::OrderedList));
        assert!(!NodeKind::Paragraph.compatible_content(NodeKind::Blockquote));
    }
}

//! JSON form of documents: `{type, attrs?, content?, text?, marks?}`

use crate::attrs::Attrs;
use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;
use crate::schema::{MarkKind, NodeKind};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeJson {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<NodeJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<MarkJson>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkJson {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl Mark {
    pub fn to_json(&self) -> MarkJson {
        MarkJson {
            kind: self.kind().name().to_string(),
            attrs: if self.attrs().is_empty() {
                None
            } else {
                Some(self.attrs().clone().into_map())
            },
        }
    }

    pub fn from_json(json: &MarkJson) -> ModelResult<Mark> {
        let kind = MarkKind::from_name(&json.kind)
            .ok_or_else(|| ModelError::UnknownMarkType(json.kind.clone()))?;
        let attrs = json.attrs.clone().map(Attrs::from);
        Ok(Mark::new(kind, attrs.as_ref()))
    }
}

impl Node {
    pub fn to_json(&self) -> NodeJson {
        NodeJson {
            kind: self.kind().name().to_string(),
            attrs: if self.attrs().is_empty() {
                None
            } else {
                Some(self.attrs().clone().into_map())
            },
            content: if self.child_count() == 0 {
                None
            } else {
                Some(self.content().iter().map(Node::to_json).collect())
            },
            text: self.as_text().map(str::to_string),
            marks: if self.marks().is_empty() {
                None
            } else {
                Some(self.marks().iter().map(Mark::to_json).collect())
            },
        }
    }

    /// Builds a node tree from JSON without validating content. Used for
    /// open slices, whose nodes are not valid on their own.
    pub fn from_json(json: &NodeJson) -> ModelResult<Node> {
        let kind = NodeKind::from_name(&json.kind)
            .ok_or_else(|| ModelError::UnknownNodeType(json.kind.clone()))?;
        let marks = json
            .marks
            .iter()
            .flatten()
            .map(Mark::from_json)
            .collect::<ModelResult<Vec<_>>>()?;
        if kind == NodeKind::Text {
            let text = json
                .text
                .clone()
                .ok_or_else(|| ModelError::InvalidJson("text node without text".into()))?;
            return Ok(Node::text(text, marks));
        }
        let children = json
            .content
            .iter()
            .flatten()
            .map(Node::from_json)
            .collect::<ModelResult<Vec<_>>>()?;
        if kind.is_leaf() && !children.is_empty() {
            return Err(ModelError::schema(kind.name(), "leaf node with content"));
        }
        let attrs = json.attrs.clone().map(Attrs::from);
        Ok(Node::new(
            kind,
            attrs.as_ref(),
            Fragment::from_vec(children),
            marks,
        ))
    }

    /// Builds and fully validates a node tree
    pub fn from_json_checked(json: &NodeJson) -> ModelResult<Node> {
        let node = Node::from_json(json)?;
        node.check()?;
        Ok(node)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self.to_json()).unwrap_or(Value::Null)
    }

    pub fn from_value(value: &Value) -> ModelResult<Node> {
        let json: NodeJson = serde_json::from_value(value.clone())
            .map_err(|e| ModelError::InvalidJson(e.to_string()))?;
        Node::from_json_checked(&json)
    }
}

/// Parses a stored document, substituting the single-empty-paragraph
/// document for missing or invalid input
pub fn doc_from_json_or_default(value: Option<&Value>) -> Node {
    let Some(value) = value else {
        return Node::default_doc();
    };
    match Node::from_value(value) {
        Ok(node) if node.kind() == NodeKind::Doc => node,
        Ok(node) => {
            warn!(kind = node.kind().name(), "Stored content is not a document, using default");
            Node::default_doc()
        }
        Err(error) => {
            warn!(%error, "Invalid stored document, using default");
            Node::default_doc()
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = NodeJson::deserialize(deserializer)?;
        Node::from_json(&json).map_err(D::Error::custom)
    }
}

impl Serialize for Mark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Mark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = MarkJson::deserialize(deserializer)?;
        Mark::from_json(&json).map_err(D::Error::custom)
    }
}

impl Serialize for Fragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.nodes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Fragment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nodes = Vec::<Node>::deserialize(deserializer)?;
        Ok(Fragment::from_vec(nodes))
    }
}

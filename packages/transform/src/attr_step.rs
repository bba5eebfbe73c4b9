use crate::error::{StepError, StepResult};
use crate::map::{Assoc, Mappable};
use crate::step::Step;
use quire_model::{Attrs, Fragment, Node, Slice};
use serde::{Deserialize, Serialize};

/// Replaces the attributes of the node starting at `pos`. Positions are
/// unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrsStep {
    pub pos: usize,
    pub attrs: Attrs,
}

impl AttrsStep {
    pub fn new(pos: usize, attrs: Attrs) -> Self {
        AttrsStep { pos, attrs }
    }

    pub fn apply(&self, doc: &Node) -> StepResult {
        let node = doc.node_at(self.pos).ok_or(StepError::NoNodeAt(self.pos))?;
        if node.is_text() {
            return Err(StepError::invalid("text nodes have no attributes"));
        }
        let updated = node.with_attrs(&self.attrs);
        updated.kind().check_attrs(updated.attrs())?;
        let slice = Slice::closed(Fragment::from_node(updated));
        Ok(doc.replace(self.pos, self.pos + node.node_size(), &slice)?)
    }

    pub fn invert(&self, doc: &Node) -> Result<Step, StepError> {
        let node = doc.node_at(self.pos).ok_or(StepError::NoNodeAt(self.pos))?;
        Ok(Step::Attrs(AttrsStep::new(self.pos, node.attrs().clone())))
    }

    pub fn map(&self, mapping: &dyn Mappable) -> Option<Step> {
        let result = mapping.map_result(self.pos, Assoc::After);
        if result.deleted {
            return None;
        }
        Some(Step::Attrs(AttrsStep::new(result.pos, self.attrs.clone())))
    }
}

//! # Steps
//!
//! A [`Step`] is one atomic, invertible change to a document. Steps are
//! plain data: they serialize to JSON tagged by `stepType` and can be
//! replayed against the document they were created for.
//!
//! | Step           | Changes                          | Map                 |
//! |----------------|----------------------------------|---------------------|
//! | Replace        | any range                        | one range           |
//! | ReplaceAround  | range, keeping an inner gap      | two ranges          |
//! | AddMark        | marks of inline content          | identity            |
//! | RemoveMark     | marks of inline content          | identity            |
//! | Attrs          | attributes of one node           | identity            |

use crate::attr_step::AttrsStep;
use crate::error::{StepError, StepResult};
use crate::map::{Mappable, StepMap};
use crate::mark_step::{AddMarkStep, RemoveMarkStep};
use crate::replace_step::{ReplaceAroundStep, ReplaceStep};
use quire_model::Node;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
pub enum Step {
    Replace(ReplaceStep),
    ReplaceAround(ReplaceAroundStep),
    AddMark(AddMarkStep),
    RemoveMark(RemoveMarkStep),
    Attrs(AttrsStep),
}

impl Step {
    pub fn apply(&self, doc: &Node) -> StepResult {
        let result = match self {
            Step::Replace(step) => step.apply(doc),
            Step::ReplaceAround(step) => step.apply(doc),
            Step::AddMark(step) => step.apply(doc),
            Step::RemoveMark(step) => step.apply(doc),
            Step::Attrs(step) => step.apply(doc),
        };
        if let Err(error) = &result {
            trace!(step = self.name(), %error, "Step failed");
        }
        result
    }

    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace(step) => step.get_map(),
            Step::ReplaceAround(step) => step.get_map(),
            Step::AddMark(_) | Step::RemoveMark(_) | Step::Attrs(_) => StepMap::empty(),
        }
    }

    /// The step that undoes this one, given the document it applied to
    pub fn invert(&self, doc: &Node) -> Result<Step, StepError> {
        match self {
            Step::Replace(step) => step.invert(doc),
            Step::ReplaceAround(step) => step.invert(doc),
            Step::AddMark(step) => Ok(step.invert()),
            Step::RemoveMark(step) => Ok(step.invert()),
            Step::Attrs(step) => step.invert(doc),
        }
    }

    /// This step moved through a mapping, or `None` when its target was
    /// deleted
    pub fn map(&self, mapping: &dyn Mappable) -> Option<Step> {
        match self {
            Step::Replace(step) => step.map(mapping),
            Step::ReplaceAround(step) => step.map(mapping),
            Step::AddMark(step) => step.map(mapping),
            Step::RemoveMark(step) => step.map(mapping),
            Step::Attrs(step) => step.map(mapping),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Replace(_) => "replace",
            Step::ReplaceAround(_) => "replaceAround",
            Step::AddMark(_) => "addMark",
            Step::RemoveMark(_) => "removeMark",
            Step::Attrs(_) => "attrs",
        }
    }
}

impl From<ReplaceStep> for Step {
    fn from(step: ReplaceStep) -> Self {
        Step::Replace(step)
    }
}

impl From<ReplaceAroundStep> for Step {
    fn from(step: ReplaceAroundStep) -> Self {
        Step::ReplaceAround(step)
    }
}

impl From<AttrsStep> for Step {
    fn from(step: AttrsStep) -> Self {
        Step::Attrs(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use quire_model::{Fragment, Mark, MarkKind, Slice};
    use serde_json::json;

    #[test]
    fn test_step_json_shape() {
        let step = Step::AddMark(AddMarkStep::new(1, 3, Mark::of(MarkKind::Bold)));
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(
            value,
            json!({"stepType": "addMark", "from": 1, "to": 3, "mark": {"type": "bold"}})
        );
        let back: Step = serde_json::from_value(value).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn test_replace_step_json() {
        let step = Step::Replace(ReplaceStep::new(
            1,
            1,
            Slice::closed(Fragment::from_node(txt("hi"))),
            false,
        ));
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["stepType"], "replace");
        assert_eq!(value["slice"]["content"][0]["text"], "hi");
        let back: Step = serde_json::from_value(value).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn test_mark_steps_do_not_move_positions() {
        let step = Step::RemoveMark(RemoveMarkStep::new(1, 3, Mark::of(MarkKind::Bold)));
        assert!(step.get_map().is_empty());
    }

    #[test]
    fn test_invert_round_trip() {
        let d = doc(vec![p(vec![txt("hello")]), p(vec![txt("world")])]);
        let step = Step::Replace(ReplaceStep::new(4, 10, Slice::empty(), false));
        let changed = step.apply(&d).unwrap();
        assert_eq!(changed, doc(vec![p(vec![txt("helrld")])]));
        let inverse = step.invert(&d).unwrap();
        assert_eq!(inverse.apply(&changed).unwrap(), d);
    }
}

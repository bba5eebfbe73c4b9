//! # Transform
//!
//! An accumulator of steps over a starting document. Every helper appends
//! zero or more steps; a step that fails leaves the document unchanged,
//! returns the error to the caller and marks the transform as failed.
//!
//! ```text
//!   doc₀ ──step₀──▶ doc₁ ──step₁──▶ doc₂ ...
//!   docs = [doc₀, doc₁]   doc = doc₂   mapping = [map₀, map₁]
//! ```

use crate::error::StepError;
use crate::map::Mapping;
use crate::replace_step::ReplaceStep;
use crate::step::Step;
use quire_model::{Attrs, Fragment, Mark, Node, Slice};
use serde_json::Value;
use tracing::trace;

pub type TransformResult<'a> = Result<&'a mut Transform, StepError>;

#[derive(Debug, Clone)]
pub struct Transform {
    pub(crate) doc: Node,
    pub(crate) steps: Vec<Step>,
    pub(crate) docs: Vec<Node>,
    pub(crate) mapping: Mapping,
    pub(crate) failed: Option<StepError>,
}

impl Transform {
    pub fn new(doc: Node) -> Self {
        Transform {
            doc,
            steps: Vec::new(),
            docs: Vec::new(),
            mapping: Mapping::new(),
            failed: None,
        }
    }

    /// The current document
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// The document before the first step
    pub fn before(&self) -> &Node {
        self.docs.first().unwrap_or(&self.doc)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The document each step was applied to
    pub fn docs(&self) -> &[Node] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// The first step error this transform ran into
    pub fn failed(&self) -> Option<&StepError> {
        self.failed.as_ref()
    }

    pub fn step(&mut self, step: Step) -> TransformResult<'_> {
        match step.apply(&self.doc) {
            Ok(doc) => {
                self.add_step(step, doc);
                Ok(self)
            }
            Err(error) => {
                self.failed.get_or_insert_with(|| error.clone());
                Err(error)
            }
        }
    }

    /// Applies a step, returning false instead of an error when it fails
    pub fn maybe_step(&mut self, step: Step) -> bool {
        match step.apply(&self.doc) {
            Ok(doc) => {
                self.add_step(step, doc);
                true
            }
            Err(_) => false,
        }
    }

    pub(crate) fn add_step(&mut self, step: Step, doc: Node) {
        trace!(step = step.name(), count = self.steps.len() + 1, "Step applied");
        self.docs.push(std::mem::replace(&mut self.doc, doc));
        self.mapping.append_map(step.get_map());
        self.steps.push(step);
    }

    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> TransformResult<'_> {
        if from == to && slice.size() == 0 {
            return Ok(self);
        }
        self.step(Step::Replace(ReplaceStep::new(from, to, slice, false)))
    }

    pub fn replace_with(&mut self, from: usize, to: usize, content: Fragment) -> TransformResult<'_> {
        self.replace(from, to, Slice::closed(content))
    }

    pub fn insert(&mut self, pos: usize, content: Fragment) -> TransformResult<'_> {
        self.replace_with(pos, pos, content)
    }

    pub fn delete(&mut self, from: usize, to: usize) -> TransformResult<'_> {
        self.replace(from, to, Slice::empty())
    }

    /// Replaces `from..to` with text carrying `marks`; empty text deletes
    pub fn insert_text(
        &mut self,
        text: &str,
        from: usize,
        to: usize,
        marks: Vec<Mark>,
    ) -> TransformResult<'_> {
        if text.is_empty() {
            return self.delete(from, to);
        }
        self.replace_with(from, to, Fragment::from_node(Node::text(text, marks)))
    }

    /// Deletes a range whose ends may sit at different depths.
    ///
    /// A direct replace is tried first. When the two sides cannot be joined
    /// the range is cleared piecewise: the tail of every ancestor on the
    /// start side, the whole siblings in between and the head of every
    /// ancestor on the end side. Each piece is a flat deletion inside one
    /// parent, so the surrounding structure survives.
    pub fn delete_range(&mut self, from: usize, to: usize) -> TransformResult<'_> {
        if from >= to {
            return Ok(self);
        }
        let direct = Step::Replace(ReplaceStep::new(from, to, Slice::empty(), false));
        if let Ok(doc) = direct.apply(&self.doc) {
            self.add_step(direct, doc);
            return Ok(self);
        }

        let rfrom = self.doc.resolve(from)?;
        let rto = self.doc.resolve(to)?;
        let shared = rfrom.shared_depth(to);
        let mut pieces: Vec<(usize, usize)> = Vec::new();

        if rto.depth() > shared {
            pieces.push((rto.start(rto.depth()), to));
            for depth in (shared + 1..rto.depth()).rev() {
                pieces.push((rto.start(depth), rto.before(depth + 1)));
            }
        }
        let middle_from = if rfrom.depth() > shared {
            rfrom.after(shared + 1)
        } else {
            from
        };
        let middle_to = if rto.depth() > shared {
            rto.before(shared + 1)
        } else {
            to
        };
        pieces.push((middle_from, middle_to));
        if rfrom.depth() > shared {
            for depth in shared + 1..rfrom.depth() {
                pieces.push((rfrom.after(depth + 1), rfrom.end(depth)));
            }
            pieces.push((from, rfrom.end(rfrom.depth())));
        }

        // descending order keeps the original positions valid
        pieces.sort_by(|a, b| b.0.cmp(&a.0));
        for (start, end) in pieces {
            if end > start {
                self.delete(start, end)?;
            }
        }
        Ok(self)
    }

    /// Replaces the attributes of the node at `pos`
    pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> TransformResult<'_> {
        self.step(Step::Attrs(crate::attr_step::AttrsStep::new(pos, attrs)))
    }

    /// Sets one attribute of the node at `pos`, keeping the others
    pub fn set_node_attr(
        &mut self,
        pos: usize,
        name: &str,
        value: impl Into<Value>,
    ) -> TransformResult<'_> {
        let node = self.doc.node_at(pos).ok_or(StepError::NoNodeAt(pos))?;
        let attrs = node.attrs().clone().with(name, value);
        self.set_node_attrs(pos, attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Assoc, Mappable};
    use quire_model::builders::*;

    #[test]
    fn test_records_docs_and_mapping() {
        let d = doc(vec![p(vec![txt("ab")])]);
        let mut tr = Transform::new(d.clone());
        tr.insert_text("xy", 2, 2, Vec::new()).unwrap();
        tr.delete(1, 2).unwrap();

        assert_eq!(tr.steps().len(), 2);
        assert_eq!(tr.docs()[0], d);
        assert_eq!(tr.before(), &d);
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("xyb")])]));
        assert_eq!(tr.mapping().map(3, Assoc::After), 4);
    }

    #[test]
    fn test_failed_step_leaves_transform_unchanged() {
        let d = doc(vec![p(vec![txt("ab")])]);
        let mut tr = Transform::new(d.clone());
        let result = tr.insert(1, Fragment::from_node(p(vec![])));
        assert!(result.is_err());
        assert!(!tr.doc_changed());
        assert_eq!(tr.doc(), &d);
        assert!(tr.failed().is_some());
    }

    #[test]
    fn test_failure_is_kept_after_later_steps() {
        let mut tr = Transform::new(doc(vec![p(vec![txt("ab")])]));
        tr.insert_text("x", 1, 1, Vec::new()).unwrap();
        assert!(tr.failed().is_none());
        assert!(tr.insert(1, Fragment::from_node(p(vec![]))).is_err());
        tr.insert_text("y", 1, 1, Vec::new()).unwrap();
        assert_eq!(tr.steps().len(), 2);
        assert!(tr.failed().is_some());
    }

    #[test]
    fn test_maybe_step_does_not_fail_transform() {
        let mut tr = Transform::new(doc(vec![p(vec![txt("ab")])]));
        let step = Step::Replace(ReplaceStep::new(
            1,
            1,
            Slice::closed(Fragment::from_node(p(vec![]))),
            false,
        ));
        assert!(!tr.maybe_step(step));
        assert!(tr.failed().is_none());
    }

    #[test]
    fn test_empty_replace_is_noop() {
        let mut tr = Transform::new(doc(vec![p(vec![])]));
        tr.replace(1, 1, Slice::empty()).unwrap();
        assert!(!tr.doc_changed());
    }

    #[test]
    fn test_delete_range_across_depths() {
        // 0 <p> 1 a 2 b 3 </p> 4 <ul> 5 <li> 6 <p> 7 c 8 d 9 </p> 10 </li> 11 </ul> 12
        let d = doc(vec![
            p(vec![txt("ab")]),
            ul(vec![li(vec![p(vec![txt("cd")])])]),
        ]);
        let mut tr = Transform::new(d);
        tr.delete_range(2, 8).unwrap();
        assert_eq!(
            tr.doc(),
            &doc(vec![p(vec![txt("a")]), ul(vec![li(vec![p(vec![txt("d")])])])])
        );
    }

    #[test]
    fn test_delete_range_same_depth_joins() {
        let d = doc(vec![p(vec![txt("ab")]), p(vec![txt("cd")])]);
        let mut tr = Transform::new(d);
        tr.delete_range(2, 6).unwrap();
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("ad")])]));
    }

    #[test]
    fn test_set_node_attr_keeps_others() {
        let d = doc(vec![image("a.png")]);
        let mut tr = Transform::new(d);
        tr.set_node_attr(0, "alt", "cover").unwrap();
        let node = tr.doc().child(0).clone();
        assert_eq!(node.attrs().get_str("alt"), Some("cover"));
        assert_eq!(node.attrs().get_str("src"), Some("a.png"));
    }
}

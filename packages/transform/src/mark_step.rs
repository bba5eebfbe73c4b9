//! Steps that add or remove a mark on the inline content of a range

use crate::error::StepResult;
use crate::map::{Assoc, Mappable};
use crate::step::Step;
use quire_model::{Fragment, Mark, Node, Slice};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMarkStep {
    pub from: usize,
    pub to: usize,
    pub mark: Mark,
}

impl AddMarkStep {
    pub fn new(from: usize, to: usize, mark: Mark) -> Self {
        AddMarkStep { from, to, mark }
    }

    pub fn apply(&self, doc: &Node) -> StepResult {
        let old = doc.slice(self.from, self.to)?;
        let rfrom = doc.resolve(self.from)?;
        let parent = rfrom.node(rfrom.shared_depth(self.to)).clone();
        let content = map_inline(&old.content, &parent, &|node, parent| {
            if !node.is_atom() || !parent.kind().allows_marks() {
                return node.clone();
            }
            node.with_marks(self.mark.add_to_set(node.marks()))
        });
        let slice = Slice::new(content, old.open_start, old.open_end);
        Ok(doc.replace(self.from, self.to, &slice)?)
    }

    pub fn invert(&self) -> Step {
        Step::RemoveMark(RemoveMarkStep::new(self.from, self.to, self.mark.clone()))
    }

    pub fn map(&self, mapping: &dyn Mappable) -> Option<Step> {
        let (from, to) = map_range(self.from, self.to, mapping)?;
        Some(Step::AddMark(AddMarkStep::new(from, to, self.mark.clone())))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveMarkStep {
    pub from: usize,
    pub to: usize,
    pub mark: Mark,
}

impl RemoveMarkStep {
    pub fn new(from: usize, to: usize, mark: Mark) -> Self {
        RemoveMarkStep { from, to, mark }
    }

    pub fn apply(&self, doc: &Node) -> StepResult {
        let old = doc.slice(self.from, self.to)?;
        let content = map_inline(&old.content, doc, &|node, _| {
            node.with_marks(self.mark.remove_from_set(node.marks()))
        });
        let slice = Slice::new(content, old.open_start, old.open_end);
        Ok(doc.replace(self.from, self.to, &slice)?)
    }

    pub fn invert(&self) -> Step {
        Step::AddMark(AddMarkStep::new(self.from, self.to, self.mark.clone()))
    }

    pub fn map(&self, mapping: &dyn Mappable) -> Option<Step> {
        let (from, to) = map_range(self.from, self.to, mapping)?;
        Some(Step::RemoveMark(RemoveMarkStep::new(from, to, self.mark.clone())))
    }
}

fn map_range(from: usize, to: usize, mapping: &dyn Mappable) -> Option<(usize, usize)> {
    let from = mapping.map_result(from, Assoc::After);
    let to = mapping.map_result(to, Assoc::Before);
    if (from.deleted && to.deleted) || from.pos >= to.pos {
        return None;
    }
    Some((from.pos, to.pos))
}

/// Rebuilds `fragment`, passing every inline node through `f` together
/// with its parent
fn map_inline(
    fragment: &Fragment,
    parent: &Node,
    f: &dyn Fn(&Node, &Node) -> Node,
) -> Fragment {
    let mapped = fragment
        .iter()
        .map(|child| {
            let child = if child.content().size() > 0 {
                child.copy(map_inline(child.content(), child, f))
            } else {
                child.clone()
            };
            if child.is_inline() {
                f(&child, parent)
            } else {
                child
            }
        })
        .collect();
    Fragment::from_vec(mapped)
}

impl From<AddMarkStep> for Step {
    fn from(step: AddMarkStep) -> Self {
        Step::AddMark(step)
    }
}

impl From<RemoveMarkStep> for Step {
    fn from(step: RemoveMarkStep) -> Self {
        Step::RemoveMark(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use crate::map::StepMap;
    use quire_model::MarkKind;

    #[test]
    fn test_add_mark_to_part_of_text() {
        // 0 <p> 1 a 2 b 3 c 4 </p> 5
        let d = doc(vec![p(vec![txt("abc")])]);
        let step = AddMarkStep::new(2, 3, Mark::of(MarkKind::Bold));
        let result = step.apply(&d).unwrap();
        assert_eq!(result, doc(vec![p(vec![txt("a"), bold("b"), txt("c")])]));
    }

    #[test]
    fn test_add_mark_skips_code_block() {
        let d = doc(vec![code_block("let x"), p(vec![txt("y")])]);
        let step = AddMarkStep::new(0, d.content().size(), Mark::of(MarkKind::Italic));
        let result = step.apply(&d).unwrap();
        assert_eq!(result, doc(vec![code_block("let x"), p(vec![italic("y")])]));
    }

    #[test]
    fn test_remove_mark_inverts_add() {
        let d = doc(vec![p(vec![txt("abc")])]);
        let add = AddMarkStep::new(1, 4, Mark::of(MarkKind::Bold));
        let added = add.apply(&d).unwrap();
        let removed = add.invert().apply(&added).unwrap();
        assert_eq!(removed, d);
    }

    #[test]
    fn test_remove_mark_only_exact_mark() {
        let d = doc(vec![p(vec![link("https://a.io", "ab")])]);
        let other = RemoveMarkStep::new(1, 3, Mark::link("https://b.io", "_blank"));
        assert_eq!(other.apply(&d).unwrap(), d);

        let same = RemoveMarkStep::new(1, 3, Mark::link("https://a.io", "_blank"));
        assert_eq!(same.apply(&d).unwrap(), doc(vec![p(vec![txt("ab")])]));
    }

    #[test]
    fn test_map_drops_collapsed_range() {
        let step = AddMarkStep::new(2, 4, Mark::of(MarkKind::Bold));
        let mapping = StepMap::new(vec![(1, 4, 0)]);
        assert!(step.map(&mapping).is_none());
    }
}

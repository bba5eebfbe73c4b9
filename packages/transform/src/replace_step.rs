//! Replace steps: plain replacement and replacement around a kept gap

use crate::error::{StepError, StepResult};
use crate::map::{Assoc, Mappable, StepMap};
use crate::step::Step;
use quire_model::{ModelResult, Node, Slice};
use serde::{Deserialize, Serialize};

/// Replaces `from..to` with a slice. With `structure` set the step refuses
/// to overwrite anything but node boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceStep {
    pub from: usize,
    pub to: usize,
    pub slice: Slice,
    #[serde(default)]
    pub structure: bool,
}

impl ReplaceStep {
    pub fn new(from: usize, to: usize, slice: Slice, structure: bool) -> Self {
        ReplaceStep {
            from,
            to,
            slice,
            structure,
        }
    }

    pub fn apply(&self, doc: &Node) -> StepResult {
        if self.structure && content_between(doc, self.from, self.to)? {
            return Err(StepError::StructureOverwrite);
        }
        Ok(doc.replace(self.from, self.to, &self.slice)?)
    }

    pub fn get_map(&self) -> StepMap {
        StepMap::new(vec![(self.from, self.to - self.from, self.slice.size())])
    }

    pub fn invert(&self, doc: &Node) -> Result<Step, StepError> {
        Ok(Step::Replace(ReplaceStep::new(
            self.from,
            self.from + self.slice.size(),
            doc.slice(self.from, self.to)?,
            false,
        )))
    }

    pub fn map(&self, mapping: &dyn Mappable) -> Option<Step> {
        let from = mapping.map_result(self.from, Assoc::After);
        let to = mapping.map_result(self.to, Assoc::Before);
        if from.deleted_across && to.deleted_across {
            return None;
        }
        Some(Step::Replace(ReplaceStep::new(
            from.pos,
            from.pos.max(to.pos),
            self.slice.clone(),
            self.structure,
        )))
    }
}

/// Replaces `from..to` with a slice while keeping `gap_from..gap_to`, which
/// is moved into the slice at offset `insert`. Used to wrap, unwrap and
/// retype nodes without touching their content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAroundStep {
    pub from: usize,
    pub to: usize,
    pub gap_from: usize,
    pub gap_to: usize,
    pub slice: Slice,
    pub insert: usize,
    #[serde(default)]
    pub structure: bool,
}

impl ReplaceAroundStep {
    pub fn new(
        from: usize,
        to: usize,
        gap_from: usize,
        gap_to: usize,
        slice: Slice,
        insert: usize,
        structure: bool,
    ) -> Self {
        ReplaceAroundStep {
            from,
            to,
            gap_from,
            gap_to,
            slice,
            insert,
            structure,
        }
    }

    pub fn apply(&self, doc: &Node) -> StepResult {
        if self.structure
            && (content_between(doc, self.from, self.gap_from)?
                || content_between(doc, self.gap_to, self.to)?)
        {
            return Err(StepError::StructureOverwrite);
        }
        let gap = doc.slice(self.gap_from, self.gap_to)?;
        if gap.open_start != 0 || gap.open_end != 0 {
            return Err(StepError::GapNotFlat);
        }
        let inserted = self
            .slice
            .insert_at(self.insert, &gap.content)
            .ok_or(StepError::GapMismatch)?;
        Ok(doc.replace(self.from, self.to, &inserted)?)
    }

    pub fn get_map(&self) -> StepMap {
        StepMap::new(vec![
            (self.from, self.gap_from - self.from, self.insert),
            (self.gap_to, self.to - self.gap_to, self.slice.size() - self.insert),
        ])
    }

    pub fn invert(&self, doc: &Node) -> Result<Step, StepError> {
        let gap = self.gap_to - self.gap_from;
        let removed = doc
            .slice(self.from, self.to)?
            .remove_between(self.gap_from - self.from, self.gap_to - self.from)?;
        Ok(Step::ReplaceAround(ReplaceAroundStep::new(
            self.from,
            self.from + self.slice.size() + gap,
            self.from + self.insert,
            self.from + self.insert + gap,
            removed,
            self.gap_from - self.from,
            self.structure,
        )))
    }

    pub fn map(&self, mapping: &dyn Mappable) -> Option<Step> {
        let from = mapping.map_result(self.from, Assoc::After);
        let to = mapping.map_result(self.to, Assoc::Before);
        let gap_from = if self.from == self.gap_from {
            from.pos
        } else {
            mapping.map(self.gap_from, Assoc::Before)
        };
        let gap_to = if self.to == self.gap_to {
            to.pos
        } else {
            mapping.map(self.gap_to, Assoc::After)
        };
        if (from.deleted_across && to.deleted_across) || gap_from < from.pos || gap_to > to.pos {
            return None;
        }
        Some(Step::ReplaceAround(ReplaceAroundStep::new(
            from.pos,
            to.pos,
            gap_from,
            gap_to,
            self.slice.clone(),
            self.insert,
            self.structure,
        )))
    }
}

/// Whether `from..to` covers anything besides the closing and opening
/// tokens of nodes
pub fn content_between(doc: &Node, from: usize, to: usize) -> ModelResult<bool> {
    let rfrom = doc.resolve(from)?;
    let mut dist = to.saturating_sub(from);
    let mut depth = rfrom.depth();
    while dist > 0 && depth > 0 && rfrom.index_after(depth) == rfrom.node(depth).child_count() {
        depth -= 1;
        dist -= 1;
    }
    if dist > 0 {
        let mut next = rfrom
            .node(depth)
            .maybe_child(rfrom.index_after(depth))
            .cloned();
        while dist > 0 {
            match next {
                Some(node) if !node.is_leaf() => {
                    next = node.first_child().cloned();
                    dist -= 1;
                }
                _ => return Ok(true),
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use quire_model::Fragment;

    #[test]
    fn test_replace_and_invert() {
        // 0 <p> 1 a 2 b 3 c 4 </p> 5
        let d = doc(vec![p(vec![txt("abc")])]);
        let step = ReplaceStep::new(2, 3, Slice::closed(Fragment::from_node(txt("XY"))), false);
        let changed = step.apply(&d).unwrap();
        assert_eq!(changed, doc(vec![p(vec![txt("aXYc")])]));

        let inverse = step.invert(&d).unwrap();
        assert_eq!(inverse.apply(&changed).unwrap(), d);
    }

    #[test]
    fn test_structure_step_refuses_content() {
        let d = doc(vec![p(vec![txt("ab")]), p(vec![txt("cd")])]);
        // joining at the boundary only touches tokens
        let join = ReplaceStep::new(3, 5, Slice::empty(), true);
        assert_eq!(join.apply(&d).unwrap(), doc(vec![p(vec![txt("abcd")])]));
        // covering text is refused
        let overwrite = ReplaceStep::new(2, 5, Slice::empty(), true);
        assert_eq!(overwrite.apply(&d), Err(StepError::StructureOverwrite));
    }

    #[test]
    fn test_replace_around_wraps_and_unwraps() {
        // 0 <p> 1 a 2 </p> 3
        let d = doc(vec![p(vec![txt("a")])]);
        let wrap = ReplaceAroundStep::new(
            0,
            3,
            0,
            3,
            Slice::closed(Fragment::from_node(blockquote(vec![]))),
            1,
            true,
        );
        let wrapped = wrap.apply(&d).unwrap();
        assert_eq!(wrapped, doc(vec![blockquote(vec![p(vec![txt("a")])])]));
        assert_eq!(wrap.get_map().map(1, Assoc::After), 2);

        let unwrap = wrap.invert(&d).unwrap();
        assert_eq!(unwrap.apply(&wrapped).unwrap(), d);
    }

    #[test]
    fn test_content_between() {
        // 0 <p> 1 a 2 </p> 3 <p> 4 b 5 </p> 6
        let d = doc(vec![p(vec![txt("a")]), p(vec![txt("b")])]);
        assert!(!content_between(&d, 2, 4).unwrap());
        assert!(content_between(&d, 1, 4).unwrap());
        assert!(content_between(&d, 2, 5).unwrap());
    }

    #[test]
    fn test_mapped_step_dropped_when_deleted() {
        let step = ReplaceStep::new(4, 5, Slice::empty(), false);
        let mapping = StepMap::new(vec![(2, 6, 0)]);
        assert!(step.map(&mapping).is_none());

        let shifted = StepMap::new(vec![(0, 0, 3)]);
        match step.map(&shifted) {
            Some(Step::Replace(mapped)) => assert_eq!((mapped.from, mapped.to), (7, 8)),
            other => panic!("unexpected {:?}", other),
        }
    }
}

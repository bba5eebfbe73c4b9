//! Mark helpers on [`Transform`]

use crate::mark_step::{AddMarkStep, RemoveMarkStep};
use crate::replace_step::ReplaceStep;
use crate::step::Step;
use crate::transform::{Transform, TransformResult};
use quire_model::{Fragment, Mark, MarkKind, Node, NodeKind, Slice};

/// Which marks `remove_mark` strips
#[derive(Debug, Clone, PartialEq)]
pub enum MarkMatch {
    /// Every mark of a kind, whatever its attributes
    Kind(MarkKind),
    /// Only this exact mark
    Exact(Mark),
    /// All marks
    All,
}

impl Transform {
    /// Adds `mark` to the inline content in `from..to`, replacing marks of
    /// the same kind
    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> TransformResult<'_> {
        let mut removed: Vec<RemoveMarkStep> = Vec::new();
        let mut added: Vec<AddMarkStep> = Vec::new();
        self.doc.nodes_between(from, to, &mut |node, pos, parent, _| {
            if !node.is_inline() {
                return true;
            }
            let marks = node.marks();
            if !mark.is_in_set(marks) && parent.kind().allows_marks() {
                let start = pos.max(from);
                let end = (pos + node.node_size()).min(to);
                let new_set = mark.add_to_set(marks);
                for old in marks.iter().filter(|old| !old.is_in_set(&new_set)) {
                    match removed.last_mut() {
                        Some(last) if last.to == start && last.mark == *old => last.to = end,
                        _ => removed.push(RemoveMarkStep::new(start, end, old.clone())),
                    }
                }
                match added.last_mut() {
                    Some(last) if last.to == start => last.to = end,
                    _ => added.push(AddMarkStep::new(start, end, mark.clone())),
                }
            }
            true
        });
        for step in removed {
            self.step(Step::RemoveMark(step))?;
        }
        for step in added {
            self.step(Step::AddMark(step))?;
        }
        Ok(self)
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, which: MarkMatch) -> TransformResult<'_> {
        struct Matched {
            mark: Mark,
            from: usize,
            to: usize,
            step: usize,
        }
        let mut matched: Vec<Matched> = Vec::new();
        let mut step = 0;
        self.doc.nodes_between(from, to, &mut |node, pos, _, _| {
            if !node.is_inline() {
                return true;
            }
            step += 1;
            let to_remove: Vec<Mark> = match &which {
                MarkMatch::Kind(kind) => node
                    .marks()
                    .iter()
                    .filter(|mark| mark.kind() == *kind)
                    .cloned()
                    .collect(),
                MarkMatch::Exact(mark) if mark.is_in_set(node.marks()) => vec![mark.clone()],
                MarkMatch::Exact(_) => Vec::new(),
                MarkMatch::All => node.marks().to_vec(),
            };
            let end = (pos + node.node_size()).min(to);
            for mark in to_remove {
                let found = matched
                    .iter_mut()
                    .find(|m| m.step + 1 == step && m.mark == mark);
                match found {
                    Some(m) => {
                        m.to = end;
                        m.step = step;
                    }
                    None => matched.push(Matched {
                        mark,
                        from: pos.max(from),
                        to: end,
                        step,
                    }),
                }
            }
            true
        });
        for m in matched {
            self.step(Step::RemoveMark(RemoveMarkStep::new(m.from, m.to, m.mark)))?;
        }
        Ok(self)
    }

    /// Strips content the node at `pos` could not hold as a `kind`: marks
    /// in a mark-free node and inline nodes its content rejects. Hard
    /// breaks in a code block become newlines.
    pub fn clear_incompatible(&mut self, pos: usize, kind: NodeKind) -> TransformResult<'_> {
        let Some(node) = self.doc.node_at(pos) else {
            return Ok(self);
        };
        let mut mark_steps = Vec::new();
        let mut replace_steps = Vec::new();
        let mut cur = pos + 1;
        for child in node.content() {
            let end = cur + child.node_size();
            if !kind.content().accepts(child.kind()) {
                let replacement = if kind.spec().code && child.kind() == NodeKind::HardBreak {
                    Slice::closed(Fragment::from_node(Node::text("\n", Vec::new())))
                } else {
                    Slice::empty()
                };
                replace_steps.push(ReplaceStep::new(cur, end, replacement, false));
            } else if !kind.allows_marks() {
                for mark in child.marks() {
                    mark_steps.push(RemoveMarkStep::new(cur, end, mark.clone()));
                }
            }
            cur = end;
        }
        for step in mark_steps {
            self.step(Step::RemoveMark(step))?;
        }
        for step in replace_steps.into_iter().rev() {
            self.step(Step::Replace(step))?;
        }
        Ok(self)
    }
}

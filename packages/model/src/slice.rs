use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::node::Node;
use serde::{Deserialize, Serialize};

/// A piece of document: a fragment plus how many levels are open on each
/// side. An open side is joined with the content around a replaced range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slice {
    pub content: Fragment,
    #[serde(default)]
    pub open_start: usize,
    #[serde(default)]
    pub open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Slice {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A slice with no open sides
    pub fn closed(content: Fragment) -> Self {
        Self::new(content, 0, 0)
    }

    /// Number of positions this slice adds when inserted
    pub fn size(&self) -> usize {
        self.content
            .size()
            .saturating_sub(self.open_start + self.open_end)
    }

    /// Fails when a side is open deeper than the content on that side nests
    pub fn check_open_depths(&self) -> ModelResult<()> {
        let start = open_depth(&self.content, Fragment::first_child);
        let end = open_depth(&self.content, Fragment::last_child);
        if self.open_start > start || self.open_end > end {
            return Err(ModelError::replace(format!(
                "open depths {}/{} exceed slice depths {}/{}",
                self.open_start, self.open_end, start, end
            )));
        }
        Ok(())
    }

    /// Inserts `fragment` at `pos` (relative to the slice's open start).
    /// `None` when the position is inside a text node's parent boundary.
    pub fn insert_at(&self, pos: usize, fragment: &Fragment) -> Option<Slice> {
        insert_into(&self.content, pos + self.open_start, fragment)
            .map(|content| Slice::new(content, self.open_start, self.open_end))
    }

    /// Removes a flat range `from..to` (relative to the open start)
    pub fn remove_between(&self, from: usize, to: usize) -> ModelResult<Slice> {
        let content = remove_range(
            &self.content,
            from + self.open_start,
            to + self.open_start,
        )?;
        Ok(Slice::new(content, self.open_start, self.open_end))
    }
}

/// How many non-leaf nodes are nested along one side of `content`
fn open_depth(content: &Fragment, side: fn(&Fragment) -> Option<&Node>) -> usize {
    let mut depth = 0;
    let mut fragment = content;
    while let Some(node) = side(fragment) {
        if node.is_text() || node.is_leaf() {
            break;
        }
        depth += 1;
        fragment = node.content();
    }
    depth
}

fn insert_into(content: &Fragment, dist: usize, insert: &Fragment) -> Option<Fragment> {
    let (index, offset) = content.find_index(dist).ok()?;
    let child = content.maybe_child(index);
    match child {
        Some(child) if offset != dist && !child.is_text() => {
            let inner = insert_into(child.content(), dist - offset - 1, insert)?;
            Some(content.replace_child(index, child.copy(inner)))
        }
        _ => Some(
            content
                .cut(0, dist)
                .append(insert)
                .append(&content.cut(dist, content.size())),
        ),
    }
}

fn remove_range(content: &Fragment, from: usize, to: usize) -> ModelResult<Fragment> {
    let (index, offset) = content.find_index(from)?;
    let (index_to, offset_to) = content.find_index(to)?;
    let child = content.maybe_child(index);
    let flat = offset == from || child.map_or(true, |child| child.is_text());
    if flat {
        let to_is_text = content.maybe_child(index_to).map_or(false, |c| c.is_text());
        if offset_to != to && !to_is_text {
            return Err(ModelError::replace("Removing non-flat range"));
        }
        return Ok(content.cut(0, from).append(&content.cut(to, content.size())));
    }
    if index != index_to {
        return Err(ModelError::replace("Removing non-flat range"));
    }
    match child {
        Some(child) => {
            let inner = remove_range(child.content(), from - offset - 1, to - offset - 1)?;
            Ok(content.replace_child(index, child.copy(inner)))
        }
        None => Err(ModelError::replace("Removing non-flat range")),
    }
}

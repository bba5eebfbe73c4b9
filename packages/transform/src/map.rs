//! # Position mapping
//!
//! Every step produces a [`StepMap`] describing which ranges of the old
//! document were replaced and how large the replacement is. A [`Mapping`]
//! chains step maps so a position in the document before a transform can be
//! carried over to the document after it.
//!
//! ```text
//!   old:  0 1 2 [3 4 5] 6 7        range (2, 3, 1)
//!   new:  0 1 2 [3] 4 5
//! ```

/// Which side a position sticks to when content is inserted exactly at it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The content on the associated side of the position was deleted
    pub deleted: bool,
    /// The position was strictly inside a replaced range
    pub deleted_across: bool,
}

/// Anything that can map positions: a single step map or a chain of them
pub trait Mappable {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult;

    fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }
}

/// Replaced ranges as `(start, old_size, new_size)` triples, in ascending
/// order of `start`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
    inverted: bool,
}

impl StepMap {
    pub fn new(ranges: Vec<(usize, usize, usize)>) -> Self {
        StepMap {
            ranges: ranges
                .into_iter()
                .filter(|(_, old, new)| *old != 0 || *new != 0)
                .collect(),
            inverted: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Map from the new document back to the old one
    pub fn invert(&self) -> StepMap {
        StepMap {
            ranges: self.ranges.clone(),
            inverted: !self.inverted,
        }
    }

    /// Calls `f(old_start, old_end, new_start, new_end)` for every range
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(usize, usize, usize, usize),
    {
        let mut diff: isize = 0;
        for &(start, old, new) in &self.ranges {
            let (old_size, new_size) = if self.inverted { (new, old) } else { (old, new) };
            let old_start = if self.inverted {
                offset(start, -diff)
            } else {
                start
            };
            let new_start = offset(old_start, diff);
            f(old_start, old_start + old_size, new_start, new_start + new_size);
            diff += new_size as isize - old_size as isize;
        }
    }
}

fn offset(pos: usize, diff: isize) -> usize {
    (pos as isize + diff).max(0) as usize
}

impl Mappable for StepMap {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for &(range_start, old, new) in &self.ranges {
            let start = if self.inverted {
                offset(range_start, -diff)
            } else {
                range_start
            };
            if start > pos {
                break;
            }
            let (old_size, new_size) = if self.inverted { (new, old) } else { (old, new) };
            let end = start + old_size;
            if pos <= end {
                let stick_before = if old_size == 0 {
                    assoc == Assoc::Before
                } else if pos == start {
                    true
                } else if pos == end {
                    false
                } else {
                    assoc == Assoc::Before
                };
                let mapped = offset(start, diff) + if stick_before { 0 } else { new_size };
                let deleted = match assoc {
                    Assoc::Before => pos != start,
                    Assoc::After => pos != end,
                };
                return MapResult {
                    pos: mapped,
                    deleted,
                    deleted_across: pos != start && pos != end,
                };
            }
            diff += new_size as isize - old_size as isize;
        }
        MapResult {
            pos: offset(pos, diff),
            deleted: false,
            deleted_across: false,
        }
    }
}

/// A chain of step maps applied in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_maps(maps: Vec<StepMap>) -> Self {
        Mapping { maps }
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn append_map(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn append_mapping(&mut self, other: &Mapping) {
        self.maps.extend(other.maps.iter().cloned());
    }

    /// The maps from index `from` on
    pub fn slice(&self, from: usize) -> Mapping {
        Mapping {
            maps: self.maps.get(from..).map(<[StepMap]>::to_vec).unwrap_or_default(),
        }
    }

    /// Maps positions of the final document back to the first one
    pub fn invert(&self) -> Mapping {
        Mapping {
            maps: self.maps.iter().rev().map(StepMap::invert).collect(),
        }
    }
}

impl Mappable for Mapping {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut result = MapResult {
            pos,
            deleted: false,
            deleted_across: false,
        };
        for map in &self.maps {
            let step = map.map_result(result.pos, assoc);
            result = MapResult {
                pos: step.pos,
                deleted: result.deleted || step.deleted,
                deleted_across: result.deleted_across || step.deleted_across,
            };
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_before_range_are_unchanged() {
        let map = StepMap::new(vec![(5, 2, 0)]);
        assert_eq!(map.map(3, Assoc::After), 3);
        assert_eq!(map.map(5, Assoc::After), 5);
    }

    #[test]
    fn test_positions_after_range_shift() {
        let map = StepMap::new(vec![(2, 3, 1)]);
        assert_eq!(map.map(6, Assoc::After), 4);
        assert_eq!(map.map(10, Assoc::Before), 8);
    }

    #[test]
    fn test_position_inside_deleted_range() {
        let map = StepMap::new(vec![(2, 4, 0)]);
        let result = map.map_result(4, Assoc::After);
        assert_eq!(result.pos, 2);
        assert!(result.deleted);
        assert!(result.deleted_across);
    }

    #[test]
    fn test_insertion_respects_assoc() {
        let map = StepMap::new(vec![(3, 0, 2)]);
        assert_eq!(map.map(3, Assoc::Before), 3);
        assert_eq!(map.map(3, Assoc::After), 5);
        assert!(!map.map_result(3, Assoc::After).deleted);
    }

    #[test]
    fn test_range_edges() {
        let map = StepMap::new(vec![(2, 2, 0)]);
        let start = map.map_result(2, Assoc::After);
        assert_eq!(start.pos, 2);
        assert!(start.deleted);
        assert!(!start.deleted_across);

        let end = map.map_result(4, Assoc::Before);
        assert_eq!(end.pos, 2);
        assert!(end.deleted);
        assert!(!map.map_result(4, Assoc::After).deleted);
    }

    #[test]
    fn test_inverted_map() {
        let map = StepMap::new(vec![(2, 0, 3)]);
        let inverted = map.invert();
        assert_eq!(inverted.map(7, Assoc::After), 4);
        assert_eq!(inverted.map(1, Assoc::After), 1);
    }

    #[test]
    fn test_mapping_chains_maps() {
        let mut mapping = Mapping::new();
        mapping.append_map(StepMap::new(vec![(0, 0, 2)]));
        mapping.append_map(StepMap::new(vec![(10, 3, 0)]));
        assert_eq!(mapping.map(4, Assoc::After), 6);
        assert_eq!(mapping.map(12, Assoc::After), 11);
        assert!(mapping.map_result(9, Assoc::After).deleted);
        assert_eq!(mapping.slice(1).map(4, Assoc::After), 4);
    }

    #[test]
    fn test_for_each_reports_new_positions() {
        let map = StepMap::new(vec![(1, 0, 2), (5, 1, 0)]);
        let mut seen = Vec::new();
        map.for_each(|old_start, old_end, new_start, new_end| {
            seen.push((old_start, old_end, new_start, new_end));
        });
        assert_eq!(seen, vec![(1, 1, 1, 3), (5, 6, 7, 7)]);
    }
}

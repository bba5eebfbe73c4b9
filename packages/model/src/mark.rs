//! Inline marks and mark sets.
//!
//! A mark set is a `Vec<Mark>` kept in [`MarkKind`] declaration order with at
//! most one mark per kind.

use crate::attrs::Attrs;
use crate::schema::MarkKind;
use serde_json::Value;
use std::fmt;

#[derive(Clone, PartialEq)]
pub struct Mark {
    kind: MarkKind,
    attrs: Attrs,
}

impl Mark {
    pub fn new(kind: MarkKind, attrs: Option<&Attrs>) -> Self {
        Mark {
            kind,
            attrs: kind.compute_attrs(attrs),
        }
    }

    /// A mark with default attributes
    pub fn of(kind: MarkKind) -> Self {
        Self::new(kind, None)
    }

    pub fn link(href: impl Into<String>, target: impl Into<String>) -> Self {
        let (href, target): (String, String) = (href.into(), target.into());
        let attrs = Attrs::new().with("href", href).with("target", target);
        Self::new(MarkKind::Link, Some(&attrs))
    }

    /// `textStyle` or `highlight` with a colour
    pub fn colored(kind: MarkKind, color: impl Into<String>) -> Self {
        let color: String = color.into();
        let attrs = Attrs::new().with("color", color);
        Self::new(kind, Some(&attrs))
    }

    pub fn kind(&self) -> MarkKind {
        self.kind
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// New set with this mark added, replacing a mark of the same kind
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut result: Vec<Mark> = set
            .iter()
            .filter(|mark| mark.kind != self.kind)
            .cloned()
            .collect();
        let at = result
            .iter()
            .position(|mark| mark.kind > self.kind)
            .unwrap_or(result.len());
        result.insert(at, self.clone());
        result
    }

    /// New set without this exact mark
    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|mark| *mark != self).cloned().collect()
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|mark| mark == self)
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attrs.is_empty() || self.attrs == self.kind.compute_attrs(None) {
            write!(f, "{}", self.kind.name())
        } else {
            write!(f, "{}{:?}", self.kind.name(), self.attrs)
        }
    }
}

pub fn find_mark(set: &[Mark], kind: MarkKind) -> Option<&Mark> {
    set.iter().find(|mark| mark.kind() == kind)
}

pub fn same_set(a: &[Mark], b: &[Mark]) -> bool {
    a == b
}

/// Sorts and dedupes marks into a canonical set
pub fn normalize_set(marks: Vec<Mark>) -> Vec<Mark> {
    marks
        .into_iter()
        .fold(Vec::new(), |set, mark| mark.add_to_set(&set))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_to_set_orders_and_replaces() {
        let set = Mark::of(MarkKind::Highlight).add_to_set(&[]);
        let set = Mark::of(MarkKind::Bold).add_to_set(&set);
        assert_eq!(set[0].kind(), MarkKind::Bold);

        let set = Mark::link("a", "_blank").add_to_set(&set);
        let set = Mark::link("b", "_blank").add_to_set(&set);
        let links: Vec<_> = set.iter().filter(|m| m.kind() == MarkKind::Link).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].attrs().get_str("href"), Some("b"));
    }

    #[test]
    fn test_remove_requires_equal_attrs() {
        let set = vec![Mark::colored(MarkKind::TextStyle, "red")];
        let other = Mark::colored(MarkKind::TextStyle, "blue");
        assert_eq!(other.remove_from_set(&set).len(), 1);
        assert!(set[0].remove_from_set(&set).is_empty());
    }
}

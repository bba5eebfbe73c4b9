//! Main image invariants: at most one, never removed by accident, always
//! first.

use crate::plugin::Plugin;
use crate::state::EditorState;
use crate::transaction::{meta, Transaction};
use quire_model::{Fragment, NodeKind};
use tracing::debug;

pub const MAIN_IMAGE_GUARD_KEY: &str = "mainImageGuard";
pub const PIN_MAIN_IMAGE_KEY: &str = "pinMainImage";

/// Vetoes transactions that remove the last main image without the
/// `allowMainImageDelete` tag, and ones that would leave two of them.
/// Undo and redo may remove it: they restore an earlier document.
pub struct MainImageGuard;

impl Plugin for MainImageGuard {
    fn key(&self) -> &'static str {
        MAIN_IMAGE_GUARD_KEY
    }

    fn filter_transaction(&self, tr: &Transaction, state: &EditorState) -> bool {
        if !tr.doc_changed() {
            return true;
        }
        let before = state.doc().count_kind(NodeKind::MainImage);
        let after = tr.doc().count_kind(NodeKind::MainImage);
        if after > 1 {
            debug!(count = after, "Refusing a second main image");
            return false;
        }
        if before > 0 && after == 0 {
            return tr.meta_bool(meta::ALLOW_MAIN_IMAGE_DELETE)
                || tr.get_meta(meta::HISTORY).is_some();
        }
        true
    }
}

/// Moves a top-level main image back to the first position
pub struct PinMainImage;

impl Plugin for PinMainImage {
    fn key(&self) -> &'static str {
        PIN_MAIN_IMAGE_KEY
    }

    fn append_transaction(
        &self,
        trs: &[Transaction],
        _old: &EditorState,
        new: &EditorState,
    ) -> Option<Transaction> {
        if !trs.iter().any(|tr| tr.doc_changed()) {
            return None;
        }
        let doc = new.doc();
        let mut pos = 0;
        let mut found = None;
        for (index, child) in doc.content().iter().enumerate() {
            if child.kind() == NodeKind::MainImage {
                if index > 0 {
                    found = Some((pos, child.clone()));
                }
                break;
            }
            pos += child.node_size();
        }
        let (pos, image) = found?;
        let mut tr = new.transaction();
        tr.delete(pos, pos + image.node_size()).ok()?;
        tr.insert(0, Fragment::from_node(image)).ok()?;
        Some(tr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::state::StateConfig;
    use crate::TransactionError;
    use quire_model::builders::*;
    use quire_model::Node;
    use std::sync::Arc;

    fn state(d: Node) -> EditorState {
        EditorState::create(StateConfig {
            doc: d,
            selection: Some(Selection::cursor(2)),
            plugins: vec![Arc::new(MainImageGuard), Arc::new(PinMainImage)],
        })
    }

    #[test]
    fn test_guard_blocks_untagged_delete() {
        let s = state(doc(vec![main_image("a.png"), p(vec![txt("x")])]));
        let mut tr = s.transaction();
        tr.delete(0, 1).unwrap();
        assert_eq!(
            s.apply(tr).unwrap_err(),
            TransactionError::Rejected {
                plugin: MAIN_IMAGE_GUARD_KEY.into()
            }
        );
    }

    #[test]
    fn test_guard_allows_tagged_delete() {
        let s = state(doc(vec![main_image("a.png"), p(vec![txt("x")])]));
        let mut tr = s.transaction();
        tr.delete(0, 1).unwrap();
        tr.set_meta(meta::ALLOW_MAIN_IMAGE_DELETE, true);
        let next = s.apply(tr).unwrap();
        assert_eq!(next.doc(), &doc(vec![p(vec![txt("x")])]));
    }

    #[test]
    fn test_guard_blocks_second_main_image() {
        let s = state(doc(vec![main_image("a.png"), p(vec![txt("x")])]));
        let mut tr = s.transaction();
        tr.insert(4, Fragment::from_node(main_image("b.png"))).unwrap();
        assert!(s.apply(tr).is_err());
    }

    #[test]
    fn test_main_image_is_pinned_first() {
        // 0 <p> 1 x 2 </p> 3 <img> 4
        let s = state(doc(vec![p(vec![txt("x")])]));
        let mut tr = s.transaction();
        tr.insert(3, Fragment::from_node(main_image("a.png"))).unwrap();
        let applied = s.apply_transaction(tr).unwrap();
        assert_eq!(applied.transactions.len(), 2);
        assert_eq!(
            applied.state.doc(),
            &doc(vec![main_image("a.png"), p(vec![txt("x")])])
        );
        assert_eq!(*applied.state.selection(), Selection::cursor(3));
    }
}

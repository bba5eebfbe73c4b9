//! # Media commands
//!
//! The main image always sits at the top of the article. Other media are
//! inserted after the block holding the selection, followed by an empty
//! paragraph that receives the cursor so writing can continue below.

use crate::insert::after_block;
use quire_model::{Attrs, Fragment, Node, NodeKind};
use quire_state::{meta, Command, CommandError, EditorState, Selection, Transaction};
use serde_json::Value;
use tracing::debug;

fn require_src(attrs: &Attrs) -> Result<(), CommandError> {
    match attrs.get_str("src") {
        Some(src) if !src.trim().is_empty() => Ok(()),
        _ => Err(CommandError::InvalidArgument("media needs a src".into())),
    }
}

fn is_blank(doc: &Node) -> bool {
    doc.child_count() == 1
        && doc.child(0).kind() == NodeKind::Paragraph
        && doc.child(0).content().size() == 0
}

pub fn has_main_image(doc: &Node) -> bool {
    doc.first_child()
        .map_or(false, |node| node.kind() == NodeKind::MainImage)
}

/// Sets the article's main image, updating the existing one in place
pub fn set_main_image(attrs: Attrs) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        require_src(&attrs)?;
        let doc = tr.doc().clone();
        if let Some(existing) = doc.first_child().filter(|n| n.kind() == NodeKind::MainImage) {
            let merged = existing.attrs().merged(&attrs);
            if merged == *existing.attrs() {
                return Ok(false);
            }
            tr.set_node_attrs(0, merged)?;
            return Ok(true);
        }
        let image = Node::new(NodeKind::MainImage, Some(&attrs), Fragment::empty(), Vec::new());
        if is_blank(&doc) {
            let paragraph = Node::fill(NodeKind::Paragraph, None);
            tr.replace_with(
                0,
                doc.content().size(),
                Fragment::from_vec(vec![image, paragraph]),
            )?;
            tr.set_selection(Selection::cursor(2));
        } else {
            tr.insert(0, Fragment::from_node(image))?;
        }
        debug!("Main image added");
        Ok(true)
    }
}

/// Removes the main image, tagging the transaction so the guard lets it
/// through
pub fn remove_main_image(tr: &mut Transaction) -> Result<bool, CommandError> {
    let doc = tr.doc().clone();
    let Some(image) = doc.first_child().filter(|n| n.kind() == NodeKind::MainImage) else {
        return Ok(false);
    };
    if doc.child_count() == 1 {
        tr.replace_with(
            0,
            image.node_size(),
            Fragment::from_node(Node::fill(NodeKind::Paragraph, None)),
        )?;
    } else {
        tr.delete(0, image.node_size())?;
    }
    tr.set_meta(meta::ALLOW_MAIN_IMAGE_DELETE, true);
    Ok(true)
}

/// Inserts `node` and an empty paragraph after the block holding the
/// selection end, leaving the cursor in the paragraph
fn insert_media(node: Node) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let content = Fragment::from_vec(vec![node.clone(), Node::fill(NodeKind::Paragraph, None)]);
        let rto = tr.doc().resolve(tr.selection().to())?;
        let Some(pos) = after_block(&rto, &content) else {
            return Ok(false);
        };
        tr.insert(pos, content)?;
        tr.set_selection(Selection::cursor(pos + node.node_size() + 1));
        tr.scroll_into_view();
        Ok(true)
    }
}

fn media_command(kind: NodeKind, attrs: Attrs) -> Result<impl Command, CommandError> {
    require_src(&attrs)?;
    Ok(insert_media(Node::new(kind, Some(&attrs), Fragment::empty(), Vec::new())))
}

pub fn insert_custom_image(attrs: Attrs) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        media_command(NodeKind::CustomImage, attrs.clone())?.apply(tr)
    }
}

pub fn insert_video(attrs: Attrs) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        media_command(NodeKind::Video, attrs.clone())?.apply(tr)
    }
}

pub fn insert_audio(attrs: Attrs) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        media_command(NodeKind::AudioWaveform, attrs.clone())?.apply(tr)
    }
}

/// Inserts a carousel of `items`, each an object with at least a `src`
pub fn insert_carousel(items: Value) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        validate_items(&items)?;
        let attrs = Attrs::new().with("items", items.clone());
        let node = Node::new(NodeKind::ImageCarousel, Some(&attrs), Fragment::empty(), Vec::new());
        insert_media(node).apply(tr)
    }
}

fn validate_items(items: &Value) -> Result<(), CommandError> {
    let Some(list) = items.as_array() else {
        return Err(CommandError::InvalidArgument("carousel items must be a list".into()));
    };
    if list.is_empty() {
        return Err(CommandError::InvalidArgument("carousel needs at least one item".into()));
    }
    let valid = list
        .iter()
        .all(|item| item.get("src").and_then(Value::as_str).map_or(false, |s| !s.is_empty()));
    if !valid {
        return Err(CommandError::InvalidArgument("carousel item without src".into()));
    }
    Ok(())
}

fn media_at(tr: &Transaction, pos: usize) -> Result<Node, CommandError> {
    match tr.doc().node_at(pos) {
        Some(node) if node.kind().is_media() => Ok(node),
        _ => Err(CommandError::InvalidArgument(format!("no media node at {pos}"))),
    }
}

/// Replaces the items of the carousel at `pos`
pub fn update_carousel(pos: usize, items: Value) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let node = media_at(tr, pos)?;
        if node.kind() != NodeKind::ImageCarousel {
            return Err(CommandError::InvalidArgument(format!("no carousel at {pos}")));
        }
        validate_items(&items)?;
        if node.attr("items") == Some(&items) {
            return Ok(false);
        }
        tr.set_node_attr(pos, "items", items.clone())?;
        Ok(true)
    }
}

/// Updates some attributes of the media node at `pos`, such as its size,
/// alignment or caption
pub fn set_media_attrs(pos: usize, attrs: Attrs) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let node = media_at(tr, pos)?;
        if let Some(name) = attrs.iter().map(|(name, _)| name).find(|n| !node.kind().has_attr(n)) {
            return Err(CommandError::InvalidArgument(format!(
                "{} has no attribute '{name}'",
                node.kind().name()
            )));
        }
        let merged = node.attrs().merged(&attrs);
        if merged == *node.attrs() {
            return Ok(false);
        }
        tr.set_node_attrs(pos, merged)?;
        Ok(true)
    }
}

/// Position of the media node the selection covers, if any
pub fn selected_media(state: &EditorState) -> Option<(usize, Node)> {
    let selection = state.selection();
    selection
        .selected_node(state.doc())
        .filter(|node| node.kind().is_media())
        .map(|node| (selection.from(), node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use quire_state::StateConfig;
    use serde_json::json;

    fn state(d: Node, selection: Selection) -> EditorState {
        EditorState::create(StateConfig {
            doc: d,
            selection: Some(selection),
            plugins: Vec::new(),
        })
    }

    fn apply(state: &EditorState, command: impl Command) -> EditorState {
        let mut out = None;
        assert!(command.run(state, Some(&mut |tr: Transaction| out = Some(tr))));
        state.apply(out.unwrap()).unwrap()
    }

    fn src(s: &str) -> Attrs {
        Attrs::new().with("src", s)
    }

    #[test]
    fn test_set_main_image_on_blank_doc() {
        let s = state(doc(vec![p(vec![])]), Selection::cursor(1));
        let next = apply(&s, set_main_image(src("cover.png")));
        assert_eq!(next.doc(), &doc(vec![main_image("cover.png"), p(vec![])]));
        assert_eq!(*next.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_set_main_image_updates_existing() {
        let s = state(
            doc(vec![main_image("a.png"), p(vec![txt("x")])]),
            Selection::cursor(2),
        );
        let next = apply(&s, set_main_image(src("b.png")));
        assert_eq!(next.doc(), &doc(vec![main_image("b.png"), p(vec![txt("x")])]));
        assert!(!set_main_image(src("b.png")).run(&next, None));
        assert!(!set_main_image(src(" ")).run(&next, None));
    }

    #[test]
    fn test_remove_main_image_is_tagged() {
        let s = state(
            doc(vec![main_image("a.png"), p(vec![txt("x")])]),
            Selection::cursor(2),
        );
        let mut tr = s.transaction();
        assert!(remove_main_image(&mut tr).unwrap());
        assert!(tr.meta_bool(meta::ALLOW_MAIN_IMAGE_DELETE));
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("x")])]));
    }

    #[test]
    fn test_insert_image_mid_paragraph() {
        // 0 <p> 1 a 2 b 3 </p> 4 <p> 5 c 6 </p> 7
        let s = state(
            doc(vec![p(vec![txt("ab")]), p(vec![txt("c")])]),
            Selection::cursor(2),
        );
        let next = apply(&s, insert_custom_image(src("i.png")));
        assert_eq!(
            next.doc(),
            &doc(vec![
                p(vec![txt("ab")]),
                image("i.png"),
                p(vec![]),
                p(vec![txt("c")]),
            ])
        );
        assert_eq!(*next.selection(), Selection::cursor(6));
    }

    #[test]
    fn test_insert_after_selected_media() {
        let s = state(doc(vec![video("v.mp4"), p(vec![])]), Selection::Node { anchor: 0, head: 1 });
        let next = apply(&s, insert_audio(src("a.mp3")));
        assert_eq!(
            next.doc(),
            &doc(vec![video("v.mp4"), audio("a.mp3"), p(vec![]), p(vec![])])
        );
        assert_eq!(*next.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_carousel_items_validated() {
        let s = state(doc(vec![p(vec![])]), Selection::cursor(1));
        assert!(!insert_carousel(json!([])).run(&s, None));
        assert!(!insert_carousel(json!([{ "alt": "x" }])).run(&s, None));

        let items = json!([{ "src": "1.png" }, { "src": "2.png" }]);
        let next = apply(&s, insert_carousel(items.clone()));
        assert_eq!(next.doc().child(1), &carousel(items));

        let fewer = json!([{ "src": "2.png" }]);
        let updated = apply(&next, update_carousel(2, fewer.clone()));
        assert_eq!(updated.doc().child(1).attr("items"), Some(&fewer));
        assert!(!update_carousel(0, fewer).run(&updated, None));
    }

    #[test]
    fn test_set_media_attrs() {
        let s = state(doc(vec![image("i.png"), p(vec![])]), Selection::Node { anchor: 0, head: 1 });
        assert_eq!(selected_media(&s).map(|(pos, _)| pos), Some(0));
        let next = apply(&s, set_media_attrs(0, Attrs::new().with("width", 640)));
        assert_eq!(next.doc().child(0).attr("width"), Some(&json!(640)));
        assert_eq!(next.doc().child(0).attr("src"), Some(&json!("i.png")));
        assert!(!set_media_attrs(0, Attrs::new().with("level", 2)).run(&s, None));
        assert!(!set_media_attrs(3, Attrs::new().with("width", 1)).run(&s, None));
    }
}

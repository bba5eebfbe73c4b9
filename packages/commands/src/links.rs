//! Link commands

use quire_model::{find_mark, Mark, MarkKind, ResolvedPos};
use quire_state::{Command, CommandError, EditorState, Selection, Transaction};
use quire_transform::MarkMatch;
use serde::Serialize;

/// Extent of a run of text carrying one mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkRange {
    pub from: usize,
    pub to: usize,
}

/// The run of text around `rpos` carrying a `kind` mark. At a boundary
/// between two text nodes the node after wins; at the end of the block the
/// last node is used.
pub fn get_mark_range(rpos: &ResolvedPos, kind: MarkKind) -> Option<MarkRange> {
    let parent = rpos.parent();
    let (mut index, mut offset) = parent.content().find_index(rpos.parent_offset()).ok()?;
    if index == parent.child_count() {
        index = index.checked_sub(1)?;
        offset -= parent.maybe_child(index)?.node_size();
    }
    let start = parent.maybe_child(index)?;
    let mark = find_mark(start.marks(), kind)?.clone();

    let mut start_index = index;
    let mut from = rpos.start(rpos.depth()) + offset;
    let mut end_index = index + 1;
    let mut to = from + start.node_size();
    while start_index > 0 && mark.is_in_set(parent.child(start_index - 1).marks()) {
        start_index -= 1;
        from -= parent.child(start_index).node_size();
    }
    while end_index < parent.child_count() && mark.is_in_set(parent.child(end_index).marks()) {
        to += parent.child(end_index).node_size();
        end_index += 1;
    }
    Some(MarkRange { from, to })
}

/// Links the selected text to `href`, opening in `target`
pub fn set_link_with_target(href: String, target: String) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let href = href.trim();
        if href.is_empty() {
            return Err(CommandError::InvalidArgument("empty link".into()));
        }
        let selection = tr.selection();
        if selection.empty() || matches!(selection, Selection::Node { .. }) {
            return Ok(false);
        }
        tr.add_mark(
            selection.from(),
            selection.to(),
            Mark::link(href, target.clone()),
        )?;
        Ok(true)
    }
}

pub fn set_link(href: impl Into<String>) -> impl Command {
    set_link_with_target(href.into(), "_blank".to_string())
}

/// Removes links from the selection and from the whole link run the
/// selection starts in
pub fn unset_link(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    let (mut from, mut to) = (selection.from(), selection.to());
    let rpos = tr.doc().resolve(from)?;
    if let Some(range) = get_mark_range(&rpos, MarkKind::Link) {
        from = from.min(range.from);
        to = to.max(range.to);
    }
    if from == to || !tr.doc().range_has_mark(from, to, MarkKind::Link) {
        return Ok(false);
    }
    tr.remove_mark(from, to, MarkMatch::Kind(MarkKind::Link))?;
    Ok(true)
}

/// Selects the `kind` run around `pos`
pub fn select_mark_range(pos: usize, kind: MarkKind) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let rpos = tr.doc().resolve(pos)?;
        let Some(range) = get_mark_range(&rpos, kind) else {
            return Ok(false);
        };
        tr.set_selection(Selection::text(range.from, range.to));
        Ok(true)
    }
}

/// The href of the link at the selection start
pub fn link_href_at_cursor(state: &EditorState) -> Option<String> {
    let rpos = state.doc().resolve(state.selection().from()).ok()?;
    let range = get_mark_range(&rpos, MarkKind::Link)?;
    let node = state.doc().node_at(range.from)?;
    find_mark(node.marks(), MarkKind::Link)?
        .attrs()
        .get_str("href")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;
    use quire_model::Node;
    use quire_state::StateConfig;

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

    #[test]
    fn test_mark_range_spans_split_text_nodes() {
        // 0 <p> 1 go 3 [ab 5 cd] 7 x 8
        let href = Mark::link("https://a.b", "_blank");
        let d = doc(vec![p(vec![
            txt("go"),
            marked("ab", vec![href.clone()]),
            marked("cd", vec![Mark::of(MarkKind::Bold), href]),
            txt("x"),
        ])]);
        for pos in [3, 4, 5, 6] {
            let rpos = d.resolve(pos).unwrap();
            assert_eq!(
                get_mark_range(&rpos, MarkKind::Link),
                Some(MarkRange { from: 3, to: 7 }),
                "at {pos}"
            );
        }
        assert_eq!(get_mark_range(&d.resolve(7).unwrap(), MarkKind::Link), None);
        assert_eq!(get_mark_range(&d.resolve(1).unwrap(), MarkKind::Link), None);
    }

    #[test]
    fn test_mark_range_at_run_edges() {
        // 0 <p> 1 go 3 [ab] 5 x 6
        let d = doc(vec![p(vec![txt("go"), link("https://a.b", "ab"), txt("x")])]);
        let range = |pos| get_mark_range(&d.resolve(pos).unwrap(), MarkKind::Link);
        assert_eq!(range(3), Some(MarkRange { from: 3, to: 5 }));
        assert_eq!(range(5), None);

        // A link closing the block is found from the block end
        let d = doc(vec![p(vec![txt("go"), link("https://a.b", "ab")])]);
        assert_eq!(
            get_mark_range(&d.resolve(5).unwrap(), MarkKind::Link),
            Some(MarkRange { from: 3, to: 5 })
        );
    }

    #[test]
    fn test_set_link_requires_range() {
        let s = state(doc(vec![p(vec![txt("hello")])]), Selection::cursor(2));
        assert!(!set_link("https://x.y").run(&s, None));

        let s = state(doc(vec![p(vec![txt("hello")])]), Selection::text(1, 6));
        let linked = apply(&s, set_link("https://x.y"));
        assert_eq!(linked.doc(), &doc(vec![p(vec![link("https://x.y", "hello")])]));
        assert!(!set_link("  ").run(&s, None));
    }

    #[test]
    fn test_unset_link_from_cursor_strips_whole_run() {
        let s = state(
            doc(vec![p(vec![txt("a"), link("https://x.y", "bcd"), txt("e")])]),
            Selection::cursor(3),
        );
        assert_eq!(link_href_at_cursor(&s).as_deref(), Some("https://x.y"));
        let next = apply(&s, unset_link);
        assert_eq!(next.doc(), &doc(vec![p(vec![txt("abcde")])]));
        assert!(!unset_link.run(&next, None));
    }

    #[test]
    fn test_select_mark_range() {
        let s = state(
            doc(vec![p(vec![txt("a"), link("https://x.y", "bcd")])]),
            Selection::cursor(1),
        );
        let next = apply(&s, select_mark_range(3, MarkKind::Link));
        assert_eq!(*next.selection(), Selection::text(2, 5));
    }
}

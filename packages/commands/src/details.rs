//! Collapsible details blocks

use crate::insert::{accepting_depth, place_block};
use quire_model::{Fragment, Node, NodeKind};
use quire_state::{CommandError, Selection, Transaction};

/// Summary used when nothing is selected
pub const EMPTY_SUMMARY: &str = "...";

fn summary_content(tr: &Transaction) -> Result<(Fragment, bool), CommandError> {
    let selection = tr.selection();
    let rfrom = tr.doc().resolve(selection.from())?;
    let rto = tr.doc().resolve(selection.to())?;
    if selection.empty() {
        return Ok((Fragment::from_node(Node::text(EMPTY_SUMMARY, Vec::new())), false));
    }
    if rfrom.same_parent(&rto) && rfrom.parent().inline_content() {
        let content = rfrom
            .parent()
            .content()
            .cut(rfrom.parent_offset(), rto.parent_offset());
        return Ok((content, true));
    }
    let text = tr
        .doc()
        .text_between(selection.from(), selection.to(), " ", None);
    let text = text.trim();
    let text = if text.is_empty() { EMPTY_SUMMARY } else { text };
    Ok((Fragment::from_node(Node::text(text, Vec::new())), false))
}

/// Inserts a details block. Selected inline content moves into the
/// summary; the cursor lands in the empty body.
pub fn insert_details(tr: &mut Transaction) -> Result<bool, CommandError> {
    let selection = tr.selection();
    if matches!(selection, Selection::Node { .. }) {
        return Ok(false);
    }
    let rto = tr.doc().resolve(selection.to())?;
    if accepting_depth(&rto, NodeKind::Details).is_none() {
        return Ok(false);
    }
    let (summary, moves_selection) = summary_content(tr)?;
    let summary_size = summary.size();
    let node = Node::new(
        NodeKind::Details,
        None,
        Fragment::from_vec(vec![
            Node::new(NodeKind::DetailsSummary, None, summary, Vec::new()),
            Node::new(
                NodeKind::DetailsContent,
                None,
                Fragment::from_node(Node::new(
                    NodeKind::Paragraph,
                    None,
                    Fragment::empty(),
                    Vec::new(),
                )),
                Vec::new(),
            ),
        ]),
        Vec::new(),
    );

    let at = if moves_selection {
        tr.delete(selection.from(), selection.to())?;
        selection.from()
    } else {
        selection.to()
    };
    let start = place_block(tr, at, node)?;
    // <details><summary>...</summary><content><p>|
    let cursor = start + summary_size + 5;
    tr.set_selection(Selection::cursor(cursor));
    tr.scroll_into_view();
    Ok(true)
}

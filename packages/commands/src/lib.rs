//! # Quire Commands
//!
//! Every user-facing editing operation of the article editor, expressed
//! as a [`Command`](quire_state::Command), plus the key bindings that
//! trigger them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_commands::{toggle_heading, Keymap};
//! use quire_state::Command;
//!
//! if toggle_heading(2).run(&state, None) {
//!     toggle_heading(2).run(&state, Some(&mut |tr| pending.push(tr)));
//! }
//! keymap.handle("Mod-b", &state, Some(&mut |tr| pending.push(tr)));
//! ```
//!
//! Commands never mutate state directly. They add steps to a transaction
//! that the caller applies.

mod blocks;
mod details;
mod editing;
mod format;
mod insert;
mod keymap;
mod links;
mod lists;
mod marks;
mod media;

pub use blocks::{
    block_active, is_block_active, lift, set_block_type, toggle_blockquote, toggle_code_block,
    toggle_heading, wrap_in,
};
pub use details::{insert_details, EMPTY_SUMMARY};
pub use editing::{
    delete_char_backward, delete_char_forward, delete_selection, focus_or_append_paragraph,
    insert_hard_break, insert_text, join_backward, join_forward, join_paragraph_backward,
    newline_in_code, select_all, select_node, split_block, split_paragraph,
};
pub use format::{
    clear_formatting, set_color, set_indent, set_text_align, toggle_highlight, unset_color,
    unset_indent, TEXT_ALIGNMENTS, TRANSPARENT,
};
pub use keymap::{normalize_key, Keymap};
pub use links::{
    get_mark_range, link_href_at_cursor, select_mark_range, set_link, set_link_with_target,
    unset_link, MarkRange,
};
pub use lists::{
    exit_empty_list_item, is_in_list, lift_list_item, sink_list_item, split_list_item,
    toggle_bullet_list, toggle_ordered_list, wrap_in_list,
};
pub use marks::{
    active_marks, is_mark_active, toggle_bold, toggle_code, toggle_italic, toggle_mark,
    toggle_mark_with, toggle_strike, toggle_underline,
};
pub use media::{
    has_main_image, insert_audio, insert_carousel, insert_custom_image, insert_video,
    remove_main_image, selected_media, set_main_image, set_media_attrs, update_carousel,
};
pub use quire_state::{redo, undo};

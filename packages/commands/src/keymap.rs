//! # Key bindings
//!
//! Maps key names such as `Mod-b` or `Shift-Enter` to commands. `Mod` is
//! the platform's command key; `Ctrl`, `Cmd` and `Meta` all normalize to
//! it.

use crate::editing::{
    delete_char_backward, delete_char_forward, delete_selection, guards_main_image,
    insert_hard_break, join_forward, join_paragraph_backward, newline_in_code, select_all,
    split_block, split_paragraph,
};
use crate::lists::{exit_empty_list_item, split_list_item};
use crate::marks::{toggle_bold, toggle_italic, toggle_strike, toggle_underline};
use quire_model::NodeKind;
use quire_state::{
    first_of, redo, undo, Command, CommandError, Dispatch, EditorState, Selection, Transaction,
    Typing,
};
use std::collections::BTreeMap;
use tracing::trace;

/// Normalizes a key name: modifiers in `Mod-Alt-Shift` order, single
/// characters lowercased
pub fn normalize_key(key: &str) -> String {
    let parts: Vec<&str> = key.split('-').collect();
    // "Mod--" binds the minus key
    let (mods, name) = match parts.as_slice() {
        [.., "", ""] => (&parts[..parts.len() - 2], "-"),
        [mods @ .., name] => (mods, *name),
        [] => (&parts[..0], ""),
    };
    let (mut primary, mut alt, mut shift) = (false, false, false);
    for m in mods {
        match m.to_ascii_lowercase().as_str() {
            "mod" | "ctrl" | "control" | "cmd" | "meta" => primary = true,
            "alt" | "option" => alt = true,
            "shift" => shift = true,
            _ => {}
        }
    }
    let mut chars = name.chars();
    let name = match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().to_string(),
        (Some(c), Some(_)) => c.to_uppercase().chain(name.chars().skip(1)).collect(),
        _ => String::new(),
    };
    let mut out = String::new();
    for (on, label) in [(primary, "Mod-"), (alt, "Alt-"), (shift, "Shift-")] {
        if on {
            out.push_str(label);
        }
    }
    out.push_str(&name);
    out
}

pub struct Keymap {
    bindings: BTreeMap<String, Box<dyn Command>>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::article()
    }
}

impl Keymap {
    pub fn new() -> Self {
        Keymap {
            bindings: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, key: &str, command: impl Command + 'static) -> &mut Self {
        self.bindings.insert(normalize_key(key), Box::new(command));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Runs the command bound to `key`. Returns whether the key was handled.
    pub fn handle(&self, key: &str, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        let key = normalize_key(key);
        let Some(command) = self.bindings.get(&key) else {
            return false;
        };
        let handled = command.run(state, dispatch);
        trace!(key = %key, handled, "Key handled");
        handled
    }

    /// The article editor's bindings
    pub fn article() -> Self {
        let mut keymap = Keymap::new();
        keymap
            .bind(
                "Enter",
                first_of(vec![
                    Box::new(exit_empty_list_item),
                    Box::new(split_list_item),
                    Box::new(newline_in_code),
                    Box::new(split_paragraph),
                    Box::new(split_block),
                ]),
            )
            .bind(
                "Backspace",
                Typing(first_of(vec![
                    Box::new(protect_main_image_backward),
                    Box::new(delete_selection),
                    Box::new(join_paragraph_backward),
                    Box::new(delete_char_backward),
                ])),
            )
            .bind(
                "Delete",
                Typing(first_of(vec![
                    Box::new(protect_main_image_forward),
                    Box::new(delete_selection),
                    Box::new(join_forward),
                    Box::new(delete_char_forward),
                ])),
            )
            .bind("Shift-Enter", insert_hard_break)
            .bind("Mod-Enter", insert_hard_break)
            .bind("Mod-b", toggle_bold)
            .bind("Mod-i", toggle_italic)
            .bind("Mod-u", toggle_underline)
            .bind("Mod-Shift-s", toggle_strike)
            .bind("Mod-z", undo)
            .bind("Mod-y", redo)
            .bind("Mod-Shift-z", redo)
            .bind("Mod-a", select_all);
        keymap
    }
}

fn main_image_selected(tr: &Transaction) -> bool {
    let selection = tr.selection();
    matches!(selection, Selection::Node { .. })
        && selection
            .selected_node(tr.doc())
            .map_or(false, |node| node.kind() == NodeKind::MainImage)
}

/// Swallows Backspace on a selected main image or right after one
fn protect_main_image_backward(tr: &mut Transaction) -> Result<bool, CommandError> {
    Ok(main_image_selected(tr) || guards_main_image(tr, false)?)
}

fn protect_main_image_forward(tr: &mut Transaction) -> Result<bool, CommandError> {
    Ok(main_image_selected(tr) || guards_main_image(tr, true)?)
}

//! Derived character count of the document text

use crate::plugin::{Plugin, PluginValue};
use crate::state::EditorState;
use crate::transaction::Transaction;
use serde::Serialize;
use std::sync::Arc;

pub const CHARACTER_COUNT_KEY: &str = "characterCount";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharacterCount {
    pub characters: usize,
}

impl CharacterCount {
    fn of(state: &EditorState) -> Self {
        CharacterCount {
            characters: state.doc().text_content().chars().count(),
        }
    }
}

pub struct CharacterCountPlugin;

impl Plugin for CharacterCountPlugin {
    fn key(&self) -> &'static str {
        CHARACTER_COUNT_KEY
    }

    fn init(&self, state: &EditorState) -> PluginValue {
        Arc::new(CharacterCount::of(state))
    }

    fn apply(
        &self,
        tr: &Transaction,
        value: &PluginValue,
        _old: &EditorState,
        new: &EditorState,
    ) -> PluginValue {
        if !tr.doc_changed() {
            return value.clone();
        }
        Arc::new(CharacterCount::of(new))
    }
}

/// Characters in `state`, 0 without the plugin
pub fn character_count(state: &EditorState) -> usize {
    state
        .plugin_state::<CharacterCount>(CHARACTER_COUNT_KEY)
        .map_or(0, |count| count.characters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateConfig;
    use quire_model::builders::*;

    #[test]
    fn test_counts_follow_edits() {
        let state = EditorState::create(StateConfig {
            doc: doc(vec![p(vec![txt("héllo")]), p(vec![txt("ab")])]),
            selection: None,
            plugins: vec![Arc::new(CharacterCountPlugin)],
        });
        assert_eq!(character_count(&state), 7);

        let mut tr = state.transaction();
        tr.insert_text("xyz").unwrap();
        let state = state.apply(tr).unwrap();
        assert_eq!(character_count(&state), 10);
    }
}

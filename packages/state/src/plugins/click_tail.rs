//! A clickable area after the last block; activating it focuses or appends
//! a trailing paragraph.

use crate::plugin::{Decoration, Plugin, WidgetSide};
use crate::state::EditorState;

pub const CLICK_TAIL_KEY: &str = "clickTail";
pub const CLICK_TAIL_CLASS: &str = "pm-click-tail";

pub struct ClickTail {
    label: String,
}

impl ClickTail {
    pub fn new(label: impl Into<String>) -> Self {
        ClickTail {
            label: label.into(),
        }
    }
}

impl Plugin for ClickTail {
    fn key(&self) -> &'static str {
        CLICK_TAIL_KEY
    }

    fn decorations(&self, state: &EditorState) -> Vec<Decoration> {
        vec![Decoration::Widget {
            pos: state.doc().content().size(),
            class: CLICK_TAIL_CLASS.to_string(),
            label: self.label.clone(),
            side: WidgetSide::After,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateConfig;
    use quire_model::builders::*;
    use std::sync::Arc;

    #[test]
    fn test_widget_sits_at_document_end() {
        let state = EditorState::create(StateConfig {
            doc: doc(vec![p(vec![txt("abc")]), hr()]),
            selection: None,
            plugins: vec![Arc::new(ClickTail::new("Add a paragraph"))],
        });
        assert_eq!(
            state.decorations(),
            vec![Decoration::Widget {
                pos: 6,
                class: "pm-click-tail".into(),
                label: "Add a paragraph".into(),
                side: WidgetSide::After,
            }]
        );
    }
}

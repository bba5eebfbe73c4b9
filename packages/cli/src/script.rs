//! Command scripts replayed by `quire apply`
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   { "command": "select", "from": 1, "to": 6 },
//!   { "command": "toggleMark", "mark": "bold" },
//!   { "command": "key", "key": "Enter" },
//!   { "command": "insertText", "text": "Second paragraph" }
//! ]
//! ```

use quire_commands as commands;
use quire_editor::Editor;
use quire_model::{Attrs, MarkKind};
use quire_state::{redo, undo, Command, CommandError, Selection, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum ScriptStep {
    /// Text selection; `to` defaults to `from`
    Select { from: usize, to: Option<usize> },
    SelectNode { pos: usize },
    SelectAll,
    InsertText { text: String },
    /// A key press such as `Enter` or `Mod-b`
    Key { key: String },
    ToggleMark { mark: MarkKind },
    ToggleHeading { level: i64 },
    ToggleBlockquote,
    ToggleCodeBlock,
    ToggleBulletList,
    ToggleOrderedList,
    Indent,
    Outdent,
    SetLink { href: String },
    UnsetLink,
    SetColor { color: String },
    UnsetColor,
    ToggleHighlight { color: String },
    SetTextAlign { align: String },
    ClearFormatting,
    InsertDetails,
    SetMainImage { src: String },
    RemoveMainImage,
    InsertImage { src: String },
    InsertVideo { src: String },
    InsertAudio { src: String },
    InsertCarousel { items: Value },
    ClickTail,
    Undo,
    Redo,
}

fn select_text(from: usize, to: usize) -> impl Command {
    move |tr: &mut Transaction| -> Result<bool, CommandError> {
        let selection = Selection::text(from, to).clamp(tr.doc());
        tr.set_selection(selection);
        Ok(true)
    }
}

fn src(src: &str) -> Attrs {
    Attrs::new().with("src", src)
}

impl ScriptStep {
    /// Runs the step. Returns whether it applied.
    pub fn run(&self, editor: &mut Editor) -> bool {
        let command: Box<dyn Command> = match self {
            ScriptStep::Key { key } => return editor.handle_key(key),
            ScriptStep::SetLink { href } => return editor.set_link(href.clone()),
            ScriptStep::Indent => return editor.indent(),
            ScriptStep::ClickTail => return editor.click_tail(),

            ScriptStep::Select { from, to } => Box::new(select_text(*from, to.unwrap_or(*from))),
            ScriptStep::SelectNode { pos } => Box::new(commands::select_node(*pos)),
            ScriptStep::SelectAll => Box::new(commands::select_all),
            ScriptStep::InsertText { text } => Box::new(commands::insert_text(text.clone())),
            ScriptStep::ToggleMark { mark } => Box::new(commands::toggle_mark(*mark)),
            ScriptStep::ToggleHeading { level } => Box::new(commands::toggle_heading(*level)),
            ScriptStep::ToggleBlockquote => Box::new(commands::toggle_blockquote),
            ScriptStep::ToggleCodeBlock => Box::new(commands::toggle_code_block),
            ScriptStep::ToggleBulletList => Box::new(commands::toggle_bullet_list),
            ScriptStep::ToggleOrderedList => Box::new(commands::toggle_ordered_list),
            ScriptStep::Outdent => Box::new(commands::unset_indent),
            ScriptStep::UnsetLink => Box::new(commands::unset_link),
            ScriptStep::SetColor { color } => Box::new(commands::set_color(color.clone())),
            ScriptStep::UnsetColor => Box::new(commands::unset_color),
            ScriptStep::ToggleHighlight { color } => {
                Box::new(commands::toggle_highlight(color.clone()))
            }
            ScriptStep::SetTextAlign { align } => Box::new(commands::set_text_align(align.clone())),
            ScriptStep::ClearFormatting => Box::new(commands::clear_formatting),
            ScriptStep::InsertDetails => Box::new(commands::insert_details),
            ScriptStep::SetMainImage { src: s } => Box::new(commands::set_main_image(src(s))),
            ScriptStep::RemoveMainImage => Box::new(commands::remove_main_image),
            ScriptStep::InsertImage { src: s } => Box::new(commands::insert_custom_image(src(s))),
            ScriptStep::InsertVideo { src: s } => Box::new(commands::insert_video(src(s))),
            ScriptStep::InsertAudio { src: s } => Box::new(commands::insert_audio(src(s))),
            ScriptStep::InsertCarousel { items } => {
                Box::new(commands::insert_carousel(items.clone()))
            }
            ScriptStep::Undo => Box::new(undo),
            ScriptStep::Redo => Box::new(redo),
        };
        editor.execute(command.as_ref())
    }

    /// Short label for progress output
    pub fn label(&self) -> String {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map
                .get("command")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string(),
            _ => "?".to_string(),
        }
    }
}

pub fn parse_script(content: &str) -> serde_json::Result<Vec<ScriptStep>> {
    serde_json::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_editor::EditorConfig;
    use quire_model::builders::*;

    fn editor(d: quire_model::Node) -> Editor {
        let mut editor = Editor::new(EditorConfig::default());
        editor.mount(Some(&d.to_value()), "");
        editor
    }

    #[test]
    fn test_parse_script() {
        let steps = parse_script(
            r#"[
                { "command": "select", "from": 1, "to": 3 },
                { "command": "toggleMark", "mark": "bold" },
                { "command": "key", "key": "Enter" },
                { "command": "setMainImage", "src": "cover.png" },
                { "command": "undo" }
            ]"#,
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                ScriptStep::Select { from: 1, to: Some(3) },
                ScriptStep::ToggleMark { mark: MarkKind::Bold },
                ScriptStep::Key { key: "Enter".to_string() },
                ScriptStep::SetMainImage { src: "cover.png".to_string() },
                ScriptStep::Undo,
            ]
        );
        assert_eq!(steps[1].label(), "toggleMark");
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        assert!(parse_script(r#"[{ "command": "explode" }]"#).is_err());
    }

    #[test]
    fn test_run_steps() {
        let mut e = editor(doc(vec![p(vec![txt("hello")])]));
        assert!(ScriptStep::Select { from: 1, to: Some(6) }.run(&mut e));
        assert!(ScriptStep::ToggleMark { mark: MarkKind::Bold }.run(&mut e));
        assert_eq!(e.doc(), Some(&doc(vec![p(vec![bold("hello")])])));

        assert!(ScriptStep::SetLink { href: "https://quire.dev".to_string() }.run(&mut e));
        assert!(!ScriptStep::ToggleHeading { level: 9 }.run(&mut e));
        assert!(ScriptStep::Undo.run(&mut e));
        assert_eq!(e.doc(), Some(&doc(vec![p(vec![bold("hello")])])));
    }
}

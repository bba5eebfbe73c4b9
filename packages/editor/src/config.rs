use crate::errors::ConfigError;
use quire_state::{HistoryConfig, PluginOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Placeholder shown in the first empty paragraph
    pub placeholder: String,

    pub click_tail_label: String,

    /// Undo groups kept
    pub history_depth: usize,

    /// Milliseconds within which consecutive edits share an undo group
    pub new_group_delay_ms: i64,

    /// Autosave debounce. The editor does not schedule saves itself; this is
    /// read by whoever does.
    pub save_debounce_ms: u64,

    /// Indent applied to paragraphs outside lists
    pub indent: String,

    pub link_target: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let plugins = PluginOptions::default();
        Self {
            placeholder: plugins.placeholder,
            click_tail_label: plugins.click_tail_label,
            history_depth: 100,
            new_group_delay_ms: 500,
            save_debounce_ms: 3000,
            indent: "2em".to_string(),
            link_target: "_blank".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when the file
    /// is absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "historyDepth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.new_group_delay_ms < 0 {
            return Err(ConfigError::Invalid {
                field: "newGroupDelayMs",
                reason: "must not be negative".to_string(),
            });
        }
        if self.indent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "indent",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn plugin_options(&self) -> PluginOptions {
        PluginOptions {
            placeholder: self.placeholder.clone(),
            click_tail_label: self.click_tail_label.clone(),
            history: HistoryConfig {
                depth: self.history_depth,
                new_group_delay_ms: self.new_group_delay_ms,
            },
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "placeholder": "Tell your story...",
            "historyDepth": 20,
            "newGroupDelayMs": 250,
            "linkTarget": "_self"
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.placeholder, "Tell your story...");
        assert_eq!(config.history_depth, 20);
        assert_eq!(config.new_group_delay_ms, 250);
        assert_eq!(config.link_target, "_self");
        assert_eq!(config.indent, "2em");
        assert_eq!(config.save_debounce_ms, 3000);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.history_depth, 100);
        assert_eq!(config.new_group_delay_ms, 500);
        assert_eq!(config.placeholder, "Start your masterpiece...");
        assert_eq!(config.plugin_options().history.depth, 100);
    }

    #[test]
    fn test_rejects_zero_depth() {
        let err = EditorConfig::from_json(r#"{ "historyDepth": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "historyDepth", .. }));
    }

    #[test]
    fn test_round_trips_camel_case() {
        let json = EditorConfig::default().to_json_pretty().unwrap();
        assert!(json.contains("\"clickTailLabel\""));
        assert!(json.contains("\"saveDebounceMs\""));
        assert_eq!(EditorConfig::from_json(&json).unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("quire-config-missing");
        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}

//! Built-in article plugins

mod character_count;
mod click_tail;
mod main_image;
mod placeholder;

pub use character_count::{character_count, CharacterCount, CharacterCountPlugin, CHARACTER_COUNT_KEY};
pub use click_tail::{ClickTail, CLICK_TAIL_CLASS, CLICK_TAIL_KEY};
pub use main_image::{MainImageGuard, PinMainImage, MAIN_IMAGE_GUARD_KEY, PIN_MAIN_IMAGE_KEY};
pub use placeholder::{PlaceholderPlugin, PLACEHOLDER_KEY};

use crate::history::{HistoryConfig, HistoryPlugin};
use crate::plugin::Plugin;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginOptions {
    pub placeholder: String,
    pub click_tail_label: String,
    pub history: HistoryConfig,
}

impl Default for PluginOptions {
    fn default() -> Self {
        PluginOptions {
            placeholder: "Start your masterpiece...".to_string(),
            click_tail_label: "Click to add a paragraph".to_string(),
            history: HistoryConfig::default(),
        }
    }
}

/// The article editor's plugin list, in application order
pub fn article_plugins(options: &PluginOptions) -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(PlaceholderPlugin::new(options.placeholder.clone())),
        Arc::new(MainImageGuard),
        Arc::new(PinMainImage),
        Arc::new(ClickTail::new(options.click_tail_label.clone())),
        Arc::new(CharacterCountPlugin),
        Arc::new(HistoryPlugin::new(options.history)),
    ]
}

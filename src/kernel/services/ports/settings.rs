use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const FONT_SIZES: &[&str] = &["12px", "14px", "16px", "18px", "20px", "24px"];

pub const FONT_FAMILIES: &[(&str, &str)] = &[
    ("Nunito (Default)", "\"Nunito\", sans-serif"),
    (
        "Monospace",
        "ui-monospace, SFMono-Regular, Menlo, Monaco, Consolas, \"Liberation Mono\", \"Courier New\", monospace",
    ),
    (
        "Serif",
        "ui-serif, Georgia, Cambria, \"Times New Roman\", Times, serif",
    ),
    (
        "Sans-serif",
        "ui-sans-serif, system-ui, -apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, \"Helvetica Neue\", Arial, sans-serif",
    ),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_workspace: Option<PathBuf>,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub diagram: DiagramSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSettings {
    #[serde(default = "default_font_size")]
    pub font_size: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Quiet period before a scheduled re-render fires.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            font_family: default_font_family(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl PreviewSettings {
    /// Returns false (and keeps the old value) for sizes outside [`FONT_SIZES`].
    pub fn set_font_size(&mut self, size: &str) -> bool {
        if !FONT_SIZES.contains(&size) {
            return false;
        }
        self.font_size = size.to_string();
        true
    }

    /// Accepts either a preset display name or its CSS value.
    pub fn set_font_family(&mut self, family: &str) -> bool {
        let Some((_, value)) = FONT_FAMILIES
            .iter()
            .find(|(name, value)| *name == family || *value == family)
        else {
            return false;
        };
        self.font_family = value.to_string();
        true
    }
}

fn default_font_size() -> String {
    "16px".to_string()
}

fn default_font_family() -> String {
    FONT_FAMILIES[0].1.to_string()
}

fn default_debounce_ms() -> u64 {
    150
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSettings {
    /// Maximum number of encoded images kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramTheme {
    Default,
    #[default]
    Dark,
    Forest,
    Neutral,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Strict,
    #[default]
    Loose,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramSettings {
    #[serde(default)]
    pub theme: DiagramTheme,
    #[serde(default)]
    pub security: SecurityLevel,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent settings backend. Read once at startup, written through on change.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<Settings, SettingsError>;

    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

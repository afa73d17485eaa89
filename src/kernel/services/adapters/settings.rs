use super::paths::get_settings_path;
use crate::kernel::services::ports::settings::{ConfigStore, Settings, SettingsError};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Settings persisted as pretty JSON. A missing file loads as defaults.
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the per-user cache location, if one can be determined.
    pub fn user_default() -> Option<Self> {
        get_settings_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// In-process store; nothing survives the process.
#[derive(Default)]
pub struct MemoryConfigStore {
    settings: Mutex<Settings>,
}

impl MemoryConfigStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.settings
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.snapshot())
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Ok(mut current) = self.settings.lock() {
            *current = settings.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/settings.rs"]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::atomic;
use crate::error::Result;
use crate::model::{Settings, Theme};

/// Cosmetic settings. Loaded once, flushed on every change.
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Never fails: an absent or unreadable file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = read_settings(&path);
        Self { path, settings }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn load_theme(&self) -> Theme {
        self.settings.theme
    }

    pub fn save_theme(&mut self, theme: Theme) -> Result<()> {
        let next = Settings {
            theme,
            ..self.settings.clone()
        };
        self.commit(next)?;
        log::info!("Theme set to {}", theme);
        Ok(())
    }

    pub fn set_debug_logging(&mut self, enabled: bool) -> Result<()> {
        let next = Settings {
            debug_logging: enabled,
            ..self.settings.clone()
        };
        self.commit(next)?;
        log::info!("Debug logging {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// In-memory settings only change once `next` is on disk.
    fn commit(&mut self, next: Settings) -> Result<()> {
        atomic::write_json(&self.path, &next)?;
        self.settings = next;
        Ok(())
    }
}

fn read_settings(path: &Path) -> Settings {
    let Ok(data) = fs::read_to_string(path) else {
        return Settings::default();
    };
    serde_json::from_str(&data).unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable {}: {}", path.display(), e);
        Settings::default()
    })
}

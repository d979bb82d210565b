use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "App Launcher";
pub const HOME_ENV: &str = "APP_LAUNCHER_HOME";

const PROFILES_FILE: &str = "launches.json";
const SETTINGS_FILE: &str = "settings.json";
const LOG_FILE: &str = "log.txt";

/// Locations of everything the launcher persists.
#[derive(Debug, Clone)]
pub struct AppDirs {
    data_dir: PathBuf,
}

impl AppDirs {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `$APP_LAUNCHER_HOME`, else the per-user data directory.
    pub fn resolve() -> Self {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::new(dir);
        }
        let base = dirs::data_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
        Self::new(base.join(APP_DIR_NAME))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn profiles_file(&self) -> PathBuf {
        self.data_dir.join(PROFILES_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_data_dir() {
        let dirs = AppDirs::new("/tmp/launcher");
        assert_eq!(dirs.profiles_file(), PathBuf::from("/tmp/launcher/launches.json"));
        assert_eq!(dirs.settings_file(), PathBuf::from("/tmp/launcher/settings.json"));
        assert_eq!(dirs.log_file(), PathBuf::from("/tmp/launcher/log.txt"));
    }
}

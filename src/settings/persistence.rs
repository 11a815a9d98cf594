use super::ScopeSettings;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

fn config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("openscopes")
}

#[derive(Debug)]
pub struct SettingsManager {
    path: PathBuf,
    data: ScopeSettings,
    last_written: Option<String>,
}

impl SettingsManager {
    pub fn load_or_default() -> Self {
        Self::load_from(config_dir().join("settings.json"))
    }

    /// Loads settings from `path`, falling back to defaults if it is missing or unreadable.
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let raw = fs::read_to_string(&path).ok();
        let data = raw
            .as_deref()
            .and_then(|s| {
                serde_json::from_str::<ScopeSettings>(s)
                    .map_err(|e| warn!("[settings] parse error {path:?}: {e}"))
                    .ok()
            })
            .unwrap_or_default()
            .sanitized();
        Self {
            path,
            data,
            last_written: raw,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &ScopeSettings {
        &self.data
    }

    pub fn update<F: FnOnce(&mut ScopeSettings) -> R, R>(&mut self, mutate: F) -> R {
        let result = mutate(&mut self.data);
        self.data.sanitize();
        result
    }

    /// Writes the settings as pretty JSON via a temp file and rename.
    ///
    /// Skips the write when the file already holds identical content.
    pub fn save(&mut self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.data).map_err(io::Error::other)?;
        if self.last_written.as_deref() == Some(json.as_str()) {
            debug!("[settings] unchanged; skipping write");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &json)?;
        fs::rename(&temp_path, &self.path)?;
        self.last_written = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = SettingsManager::load_from(dir.path().join("settings.json"));
        assert_eq!(manager.settings(), &ScopeSettings::default());
    }

    #[test]
    fn saved_settings_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let mut manager = SettingsManager::load_from(&path);
        manager.update(|s| {
            s.lined_scopes = true;
            s.channel_count = 16;
        });
        manager.save().expect("save");
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = SettingsManager::load_from(&path);
        assert!(reloaded.settings().lined_scopes);
        assert_eq!(reloaded.settings().channel_count, 16);
    }

    #[test]
    fn unchanged_settings_are_not_rewritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");

        let mut manager = SettingsManager::load_from(&path);
        manager.save().expect("first save");
        fs::write(&path, "sentinel").expect("overwrite");

        manager.save().expect("second save");
        assert_eq!(fs::read_to_string(&path).expect("read"), "sentinel");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").expect("write");

        let manager = SettingsManager::load_from(&path);
        assert_eq!(manager.settings(), &ScopeSettings::default());
    }

    #[test]
    fn update_sanitizes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut manager = SettingsManager::load_from(dir.path().join("settings.json"));
        manager.update(|s| s.channel_count = 99);
        assert_eq!(manager.settings().channel_count, 32);
    }
}

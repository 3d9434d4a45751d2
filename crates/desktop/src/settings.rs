use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use frame_export_core::shared::constants::{
    DEFAULT_EXPORT_HEIGHT, DEFAULT_EXPORT_WIDTH, DEFAULT_FILE_NAME, DEFAULT_FPS,
    DEFAULT_SEQUENCE_BEGIN_S, DEFAULT_SEQUENCE_END_S,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    Light,
}

impl Appearance {
    pub const ALL: &[Appearance] = &[Appearance::System, Appearance::Dark, Appearance::Light];
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Appearance::System => write!(f, "System"),
            Appearance::Dark => write!(f, "Dark"),
            Appearance::Light => write!(f, "Light"),
        }
    }
}

/// Export dialog values remembered between runs.
///
/// Folders left unset fall back to `out/` and `exports/` under the working
/// directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub image_folder: Option<PathBuf>,
    pub file_name: String,
    pub sequence_folder: Option<PathBuf>,
    pub fps: f64,
    pub begin_s: f64,
    pub end_s: f64,
    pub export_width: u32,
    pub export_height: u32,
    pub appearance: Appearance,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_folder: None,
            file_name: DEFAULT_FILE_NAME.to_owned(),
            sequence_folder: None,
            fps: DEFAULT_FPS,
            begin_s: DEFAULT_SEQUENCE_BEGIN_S,
            end_s: DEFAULT_SEQUENCE_END_S,
            export_width: DEFAULT_EXPORT_WIDTH,
            export_height: DEFAULT_EXPORT_HEIGHT,
            appearance: Appearance::System,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FrameExport").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Could not save settings to {}: {e}", path.display());
            }
        }
    }

    /// Missing or unreadable files give the defaults.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");
        let settings = Settings {
            image_folder: Some(PathBuf::from("/tmp/shots")),
            file_name: "frame".to_owned(),
            fps: 24.0,
            end_s: 4.5,
            appearance: Appearance::Dark,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "fps": 60.0, "appearance": "light" }"#).unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings.fps, 60.0);
        assert_eq!(settings.appearance, Appearance::Light);
        assert_eq!(settings.file_name, DEFAULT_FILE_NAME);
        assert_eq!(settings.export_width, DEFAULT_EXPORT_WIDTH);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}

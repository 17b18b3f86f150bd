use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PrefsError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }
}

/// The only state that outlives a session.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default)]
    pub theme: ThemePreference,
}

impl Preferences {
    pub fn read(path: &Path) -> Result<Self, PrefsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::read(path) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable preferences");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("binder-prefs-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_defaults_to_light() {
        assert_eq!(Preferences::load(&scratch_path()).theme, ThemePreference::Light);
    }

    #[test]
    fn theme_survives_save_and_load() {
        let path = scratch_path();
        let prefs = Preferences {
            theme: ThemePreference::Dark,
        };
        prefs.save(&path).unwrap();

        assert_eq!(Preferences::load(&path), prefs);
        assert!(fs::read_to_string(&path).unwrap().contains("\"dark\""));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn save_creates_missing_data_directory() {
        let dir = std::env::temp_dir().join(format!("binder-data-{}", Uuid::new_v4()));
        let path = dir.join("tcg-binder").join("binder-prefs.json");
        let prefs = Preferences {
            theme: ThemePreference::Dark,
        };

        prefs.save(&path).unwrap();

        assert_eq!(Preferences::load(&path), prefs);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let path = scratch_path();
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(Preferences::load(&path), Preferences::default());
        assert!(matches!(Preferences::read(&path), Err(PrefsError::Json(_))));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn toggling_flips_between_themes() {
        assert_eq!(ThemePreference::Light.toggled(), ThemePreference::Dark);
        assert_eq!(ThemePreference::Dark.toggled(), ThemePreference::Light);
    }
}

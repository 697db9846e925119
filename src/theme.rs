//! Light/dark theme and its persisted preference.
//!
//! The preference lives in a small JSON key/value file (default
//! `$XDG_CONFIG_HOME/portfolio-stats/preferences.json`) under the key
//! `theme`. A missing file or key means [`Theme::Light`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PreferenceError, ThemeParseError};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

pub struct ThemeColors {
    pub bg: &'static str,
    pub text: &'static str,
    pub key: &'static str,
    pub value: &'static str,
    pub cc: &'static str,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Accent used by the contribution chart image.
    pub fn chart_color(self) -> &'static str {
        match self {
            Theme::Dark => "0077ed",
            Theme::Light => "0071e3",
        }
    }

    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Dark => ThemeColors {
                bg: "#161b22",
                text: "#c9d1d9",
                key: "#ffa657",
                value: "#a5d6ff",
                cc: "#616e7f",
            },
            Theme::Light => ThemeColors {
                bg: "#ffffff",
                text: "#24292f",
                key: "#d73a49",
                value: "#0366d6",
                cc: "#6a737d",
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ThemeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ThemeParseError(other.to_string())),
        }
    }
}

/// File-backed key/value preferences.
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform config directory.
    pub fn at_default_location() -> Result<Self, PreferenceError> {
        let config_dir = dirs::config_dir().ok_or(PreferenceError::NoConfigDir)?;
        Ok(Self::new(
            config_dir.join("portfolio-stats").join("preferences.json"),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(PreferenceError::Parse),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(PreferenceError::Read(e)),
        }
    }

    /// Stored theme; unknown values fall back to light.
    pub fn load_theme(&self) -> Result<Theme, PreferenceError> {
        let prefs = self.read_all()?;
        Ok(prefs
            .get(THEME_KEY)
            .and_then(|v| match v.parse() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    log::warn!("Ignoring stored theme: {e}");
                    None
                }
            })
            .unwrap_or_default())
    }

    /// Write the theme, keeping any other keys already in the file.
    pub fn save_theme(&self, theme: Theme) -> Result<(), PreferenceError> {
        let mut prefs = self.read_all()?;
        prefs.insert(THEME_KEY.to_string(), theme.as_str().to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(PreferenceError::Write)?;
        }
        let json = serde_json::to_string_pretty(&prefs).map_err(PreferenceError::Parse)?;
        fs::write(&self.path, json).map_err(PreferenceError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_flips_between_light_and_dark() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn parses_only_known_names() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(" light ".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!(
            "sepia".parse::<Theme>(),
            Err(ThemeParseError("sepia".to_string()))
        );
    }

    #[test]
    fn missing_file_defaults_to_light() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("nope.json"));

        assert_eq!(store.load_theme().unwrap(), Theme::Light);
    }

    #[test]
    fn saved_theme_is_loaded_back_and_other_keys_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"font":"mono"}"#).unwrap();

        let store = PreferenceStore::new(&path);
        store.save_theme(Theme::Dark).unwrap();

        assert_eq!(store.load_theme().unwrap(), Theme::Dark);
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("font").map(String::as_str), Some("mono"));
        assert_eq!(raw.get(THEME_KEY).map(String::as_str), Some("dark"));
    }

    #[test]
    fn unknown_stored_value_falls_back_to_light() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"theme":"neon"}"#).unwrap();

        assert_eq!(PreferenceStore::new(&path).load_theme().unwrap(), Theme::Light);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            PreferenceStore::new(&path).load_theme(),
            Err(PreferenceError::Parse(_))
        ));
    }
}

//! Persisted user preferences: policy mode and theme
use crate::error::{StorageError, VerseError};
use crate::storage::{KeyValueStore, SETTINGS_KEY};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named verse selection policy
///
/// Unknown names are kept verbatim in [`PolicyMode::Other`] so they survive a
/// read-modify-write; the engine evaluates them as [`PolicyMode::Rotation`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyMode {
    #[default]
    Rotation,
    Seeded,
    Random,
    Shuffle,
    Yearly,
    Other(String),
}

impl PolicyMode {
    /// The recognized modes, in menu order
    pub const ALL: [PolicyMode; 5] = [
        PolicyMode::Rotation,
        PolicyMode::Seeded,
        PolicyMode::Random,
        PolicyMode::Shuffle,
        PolicyMode::Yearly,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PolicyMode::Rotation => "rotation",
            PolicyMode::Seeded => "seeded",
            PolicyMode::Random => "random",
            PolicyMode::Shuffle => "shuffle",
            PolicyMode::Yearly => "yearly",
            PolicyMode::Other(name) => name,
        }
    }
}

impl From<String> for PolicyMode {
    fn from(name: String) -> Self {
        match name.as_str() {
            "rotation" => PolicyMode::Rotation,
            "seeded" => PolicyMode::Seeded,
            "random" => PolicyMode::Random,
            "shuffle" => PolicyMode::Shuffle,
            "yearly" => PolicyMode::Yearly,
            _ => PolicyMode::Other(name),
        }
    }
}

impl From<&str> for PolicyMode {
    fn from(name: &str) -> Self {
        PolicyMode::from(name.to_string())
    }
}

impl From<PolicyMode> for String {
    fn from(mode: PolicyMode) -> Self {
        match mode {
            PolicyMode::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for PolicyMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PolicyMode::from(s))
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Light or dark page theme
///
/// Anything other than `"light"` reads as dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl ThemeName {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeName::Dark => "dark",
            ThemeName::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeName::Dark => ThemeName::Light,
            ThemeName::Light => ThemeName::Dark,
        }
    }
}

impl From<String> for ThemeName {
    fn from(name: String) -> Self {
        if name == "light" {
            ThemeName::Light
        } else {
            ThemeName::Dark
        }
    }
}

impl From<ThemeName> for String {
    fn from(theme: ThemeName) -> Self {
        theme.as_str().to_string()
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted preference record
///
/// Each field is read on its own: a missing, empty or non-string value takes
/// that field's default, so `{"mode":"seeded","theme":null}` reads as seeded
/// with the dark theme.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "lenient_name")]
    pub mode: PolicyMode,
    #[serde(deserialize_with = "lenient_name")]
    pub theme: ThemeName,
}

fn lenient_name<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + From<String>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(name) if !name.is_empty() => Ok(T::from(name)),
        _ => Ok(T::default()),
    }
}

impl Settings {
    pub fn with_mode(mut self, mode: PolicyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_theme(mut self, theme: ThemeName) -> Self {
        self.theme = theme;
        self
    }
}

/// Why the default settings were used
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsFallback {
    Missing,
    Corrupt(VerseError),
}

/// Result of reading the settings record
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsLoad {
    Stored(Settings),
    Defaulted(SettingsFallback),
}

impl SettingsLoad {
    /// The effective settings, default when nothing usable was stored
    pub fn settings(self) -> Settings {
        match self {
            SettingsLoad::Stored(settings) => settings,
            SettingsLoad::Defaulted(_) => Settings::default(),
        }
    }
}

/// Reads and writes [`Settings`] under [`SETTINGS_KEY`]
pub struct SettingsStore<S> {
    storage: S,
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        SettingsStore { storage }
    }

    /// Read the stored record, reporting why defaults were used if they were
    pub fn load(&self) -> SettingsLoad {
        let Some(raw) = self.storage.get(SETTINGS_KEY) else {
            return SettingsLoad::Defaulted(SettingsFallback::Missing);
        };
        if raw.is_empty() {
            return SettingsLoad::Defaulted(SettingsFallback::Missing);
        }
        match serde_json::from_str::<Settings>(&raw) {
            Ok(settings) => SettingsLoad::Stored(settings),
            Err(e) => {
                tracing::warn!(error = %e, "stored settings are corrupt, using defaults");
                SettingsLoad::Defaulted(SettingsFallback::Corrupt(VerseError::SettingsCorrupt(
                    e.to_string(),
                )))
            }
        }
    }

    /// Effective settings; never fails
    pub fn get(&self) -> Settings {
        self.load().settings()
    }

    /// Overwrite the stored record
    pub fn set(&self, settings: &Settings) -> Result<(), StorageError> {
        let raw = serde_json::to_string(settings)?;
        self.storage.set(SETTINGS_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store_with(raw: &str) -> SettingsStore<MemoryStore> {
        let storage = MemoryStore::new();
        storage.set(SETTINGS_KEY, raw).unwrap();
        SettingsStore::new(storage)
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.mode, PolicyMode::Rotation);
        assert_eq!(settings.theme, ThemeName::Dark);
    }

    #[test]
    fn test_missing_record_defaults() {
        let store = SettingsStore::new(MemoryStore::new());
        assert_eq!(
            store.load(),
            SettingsLoad::Defaulted(SettingsFallback::Missing)
        );
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn test_unparsable_record_defaults() {
        let store = store_with("{not json");
        assert!(matches!(
            store.load(),
            SettingsLoad::Defaulted(SettingsFallback::Corrupt(VerseError::SettingsCorrupt(_)))
        ));
        let settings = store.get();
        assert_eq!(settings.mode.as_str(), "rotation");
        assert_eq!(settings.theme.as_str(), "dark");
    }

    #[test]
    fn test_wrong_shape_defaults() {
        assert_eq!(store_with("[1, 2]").get(), Settings::default());
        assert_eq!(store_with(r#"{"mode": 3}"#).get(), Settings::default());
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let settings = store_with(r#"{"mode": "seeded"}"#).get();
        assert_eq!(settings.mode, PolicyMode::Seeded);
        assert_eq!(settings.theme, ThemeName::Dark);

        let settings = store_with(r#"{"theme": "light"}"#).get();
        assert_eq!(settings.mode, PolicyMode::Rotation);
        assert_eq!(settings.theme, ThemeName::Light);
    }

    #[test]
    fn test_bad_field_keeps_the_other() {
        let store = store_with(r#"{"mode": "shuffle", "theme": null}"#);
        assert_eq!(
            store.load(),
            SettingsLoad::Stored(Settings::default().with_mode(PolicyMode::Shuffle))
        );

        let settings = store_with(r#"{"mode": 42, "theme": "light"}"#).get();
        assert_eq!(settings.mode, PolicyMode::Rotation);
        assert_eq!(settings.theme, ThemeName::Light);

        let settings = store_with(r#"{"mode": "", "theme": ["light"]}"#).get();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unknown_mode_is_preserved() {
        let store = store_with(r#"{"mode": "bogus", "theme": "light"}"#);
        let settings = store.get();
        assert_eq!(settings.mode, PolicyMode::Other("bogus".to_string()));

        store.set(&settings).unwrap();
        assert_eq!(store.get().mode.as_str(), "bogus");
    }

    #[test]
    fn test_set_overwrites() {
        let store = SettingsStore::new(MemoryStore::new());
        store
            .set(&Settings::default().with_mode(PolicyMode::Shuffle))
            .unwrap();
        store
            .set(&Settings::default().with_theme(ThemeName::Light))
            .unwrap();
        let settings = store.get();
        assert_eq!(settings.mode, PolicyMode::Rotation);
        assert_eq!(settings.theme, ThemeName::Light);
    }

    #[test]
    fn test_serialized_shape() {
        let settings = Settings::default().with_mode(PolicyMode::Yearly);
        assert_eq!(
            serde_json::to_string(&settings).unwrap(),
            r#"{"mode":"yearly","theme":"dark"}"#
        );
    }

    #[test]
    fn test_theme_toggle_and_parse() {
        assert_eq!(ThemeName::Dark.toggled(), ThemeName::Light);
        assert_eq!(ThemeName::Light.toggled(), ThemeName::Dark);
        assert_eq!(ThemeName::from("sepia".to_string()), ThemeName::Dark);
    }

    #[test]
    fn test_mode_parse() {
        for mode in PolicyMode::ALL {
            assert_eq!(mode.as_str().parse::<PolicyMode>().unwrap(), mode);
        }
        assert_eq!(
            "weekly".parse::<PolicyMode>().unwrap(),
            PolicyMode::Other("weekly".to_string())
        );
    }
}

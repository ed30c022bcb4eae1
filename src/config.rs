//! Layered configuration for the `verse` binary
//!
//! Sources, lowest priority first: the user config file, `./verse.toml`,
//! explicit `--config` files, `VERSE__*` environment variables, and finally
//! command-line overrides.
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::app_dirs;

const DEFAULT_VERSES: &str = "verses.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    verses: Option<PathBuf>,
    embedded: Option<PathBuf>,
    state: Option<PathBuf>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_files: Vec<PathBuf>,
    pub no_config: bool,
    pub verses: Option<PathBuf>,
    pub embedded: Option<PathBuf>,
    pub state: Option<PathBuf>,
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseConfig {
    /// Primary verse payload
    pub verses: PathBuf,
    /// Fallback payload used when the primary one cannot be read
    pub embedded: Option<PathBuf>,
    /// File backing the settings and shuffle-order store
    pub state: PathBuf,
}

impl VerseConfig {
    pub fn print_summary(&self) {
        println!("Effective configuration:");
        println!("  Verses: {}", self.verses.display());
        match &self.embedded {
            Some(path) => println!("  Fallback verses: {}", path.display()),
            None => println!("  Fallback verses: (none)"),
        }
        println!("  State file: {}", self.state.display());
    }
}

/// Resolve the effective configuration
pub fn load(overrides: &ConfigOverrides) -> Result<VerseConfig> {
    let mut raw: RawConfig = build_config(overrides)?
        .try_deserialize()
        .map_err(|err| anyhow!("failed to deserialize configuration: {err}"))?;
    raw.apply_overrides(overrides);
    raw.resolve()
}

fn build_config(overrides: &ConfigOverrides) -> Result<Config> {
    let mut builder = Config::builder();

    if !overrides.no_config {
        for path in default_config_files() {
            builder = builder.add_source(File::from(path).required(false));
        }
    }

    for path in &overrides.config_files {
        builder = builder.add_source(File::from(path.clone()).required(true));
    }

    builder = builder.add_source(config::Environment::with_prefix("VERSE").separator("__"));

    builder.build().map_err(|err| match err {
        ConfigError::Frozen => anyhow!("configuration builder is frozen"),
        other => other.into(),
    })
}

/// Config files consulted unless `--no-config` is given
pub fn default_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Ok(file) = app_dirs::config_file() {
        files.push(file);
    }

    if let Ok(current_dir) = env::current_dir() {
        files.push(current_dir.join("verse.toml"));
    }

    files
}

impl RawConfig {
    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = overrides.verses.clone() {
            self.verses = Some(path);
        }
        if let Some(path) = overrides.embedded.clone() {
            self.embedded = Some(path);
        }
        if let Some(path) = overrides.state.clone() {
            self.state = Some(path);
        }
    }

    fn resolve(self) -> Result<VerseConfig> {
        let state = match self.state {
            Some(path) => path,
            None => app_dirs::state_file()?,
        };
        Ok(VerseConfig {
            verses: self.verses.unwrap_or_else(|| PathBuf::from(DEFAULT_VERSES)),
            embedded: self.embedded,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated() -> ConfigOverrides {
        ConfigOverrides {
            no_config: true,
            state: Some(PathBuf::from("/tmp/verse-state.json")),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn test_default_files_include_current_directory() {
        let files = default_config_files();
        assert!(files.iter().any(|path| path.ends_with("verse.toml")));
    }

    #[test]
    fn test_defaults() {
        let config = load(&isolated()).unwrap();
        assert_eq!(config.verses, PathBuf::from("verses.json"));
        assert_eq!(config.embedded, None);
    }

    #[test]
    fn test_config_file_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.toml");
        std::fs::write(
            &file,
            "verses = \"/srv/verses.json\"\nembedded = \"/srv/inline.json\"\n",
        )
        .unwrap();

        let mut overrides = isolated();
        overrides.config_files.push(file);
        let config = load(&overrides).unwrap();
        assert_eq!(config.verses, PathBuf::from("/srv/verses.json"));
        assert_eq!(config.embedded, Some(PathBuf::from("/srv/inline.json")));

        overrides.verses = Some(PathBuf::from("local.json"));
        let config = load(&overrides).unwrap();
        assert_eq!(config.verses, PathBuf::from("local.json"));
        assert_eq!(config.state, PathBuf::from("/tmp/verse-state.json"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let mut overrides = isolated();
        overrides
            .config_files
            .push(PathBuf::from("/nonexistent/verse.toml"));
        assert!(load(&overrides).is_err());
    }
}

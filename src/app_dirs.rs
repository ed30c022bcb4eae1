//! Where the `verse` binary keeps its config and state files
//!
//! `VERSE_CONFIG_DIR` and `VERSE_DATA_DIR` take precedence over the platform
//! locations from `directories`. An empty override counts as unset.

use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::ProjectDirs;

const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "state.json";

/// Directories the binary reads from or writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    /// Holds `config.toml`
    Config,
    /// Holds the key-value state file
    Data,
}

impl DirKind {
    fn env_var(self) -> &'static str {
        match self {
            DirKind::Config => "VERSE_CONFIG_DIR",
            DirKind::Data => "VERSE_DATA_DIR",
        }
    }

    fn platform_dir(self, dirs: &ProjectDirs) -> PathBuf {
        match self {
            DirKind::Config => dirs.config_local_dir(),
            DirKind::Data => dirs.data_local_dir(),
        }
        .to_path_buf()
    }
}

impl fmt::Display for DirKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirKind::Config => f.write_str("config"),
            DirKind::Data => f.write_str("data"),
        }
    }
}

/// Resolve one directory, override first
pub fn resolve(kind: DirKind) -> Result<PathBuf> {
    if let Some(dir) = env::var_os(kind.env_var()).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("org", "daily-verse", "verse")
        .map(|dirs| kind.platform_dir(&dirs))
        .ok_or_else(|| anyhow!("no home directory to place the verse {kind} directory in"))
}

/// The user-level `config.toml`
pub fn config_file() -> Result<PathBuf> {
    Ok(resolve(DirKind::Config)?.join(CONFIG_FILE))
}

/// Default state file when the configuration names none
pub fn state_file() -> Result<PathBuf> {
    Ok(resolve(DirKind::Data)?.join(STATE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let config = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        env::set_var("VERSE_CONFIG_DIR", config.path());
        env::set_var("VERSE_DATA_DIR", data.path());

        assert_eq!(config_file().unwrap(), config.path().join("config.toml"));
        assert_eq!(state_file().unwrap(), data.path().join("state.json"));
        assert_eq!(resolve(DirKind::Data).unwrap(), data.path());

        env::remove_var("VERSE_CONFIG_DIR");
        env::remove_var("VERSE_DATA_DIR");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(DirKind::Config.to_string(), "config");
        assert_eq!(DirKind::Data.env_var(), "VERSE_DATA_DIR");
    }
}

//! Orchid settings
//!
//! Read once at startup from `<config_dir>/orchid/config.toml`. Every key is
//! optional; a missing file is replaced by a freshly written default one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::wm::screen::Margins;

/// Everything `config.toml` can set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub placement: PlacementConfig,
}

impl Config {
    /// Read the user's config file
    pub fn load() -> Result<Self> {
        let dir = dirs::config_dir().context("No config directory for this user")?;
        Self::load_from(&Self::file_in(&dir))
    }

    /// Read `path`; if it does not exist, write the defaults there and use them
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No settings at {}, writing defaults", path.display());
                if let Err(e) = Self::default().write_to(path) {
                    warn!("Could not write default settings: {:#}", e);
                }
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot read {}", path.display()));
            }
        };

        let config = Self::parse(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        debug!("Settings from {}: {:?}", path.display(), config);

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn file_in(config_dir: &Path) -> PathBuf {
        config_dir.join("orchid").join("config.toml")
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create {}", dir.display()))?;
        }
        fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write {}", path.display()))
    }
}

/// Display connection configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Display to manage, e.g. ":1". Falls back to `$DISPLAY`, then ":0"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Window placement configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Space reserved at the screen edges; windows center in what remains
    pub margins: Margins,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn parses_target_and_margins() {
        let config = Config::parse(
            r#"
            [display]
            target = ":1"

            [placement.margins]
            top = 32
            left = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.display.target.as_deref(), Some(":1"));
        assert_eq!(config.placement.margins.top, 32);
        assert_eq!(config.placement.margins.left, 8);
        assert_eq!(config.placement.margins.bottom, 0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::parse("[display\ntarget = ").is_err());
    }

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orchid").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(Config::parse(&written).unwrap(), Config::default());
    }

    #[test]
    fn settings_file_lives_under_orchid() {
        let path = Config::file_in(Path::new("/home/u/.config"));
        assert_eq!(path, Path::new("/home/u/.config/orchid/config.toml"));
    }

    #[test]
    fn existing_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[display]\ntarget = \"remote:0\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.display.target.as_deref(), Some("remote:0"));
    }
}

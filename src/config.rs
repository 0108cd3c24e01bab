use crate::storage::config_dir;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

pub const CONFIG_FILE_NAME: &str = "config.yml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeConfig,
    pub layout: LayoutConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    pub primary: String,
    pub primary_fg: String,
    pub secondary: String,
    pub secondary_fg: String,
    pub accent: String,
    pub destructive: String,
    pub today: String,
    pub muted: String,
    pub text: String,
    pub surface: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub column_width: u16,
    pub column_height: u16,
    pub compact_column_height: u16,
    pub max_columns_per_row: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            theme: ThemeConfig::default(),
            layout: LayoutConfig::default(),
            log_level: "info".into(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            primary: "#818cf8".into(),
            primary_fg: "#101010".into(),
            secondary: "#2dd4bf".into(),
            secondary_fg: "#000000".into(),
            accent: "#fcd34d".into(),
            destructive: "#f87171".into(),
            today: "#f472b6".into(),
            muted: "#6272a4".into(),
            text: "#f8f8f2".into(),
            surface: "#27272a".into(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            column_width: 42,
            column_height: 19,
            compact_column_height: 14,
            max_columns_per_row: 8,
        }
    }
}

impl Config {
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    fn validate(&self) -> Result<()> {
        if self.layout.column_width < 16 {
            bail!("layout.column_width must be at least 16");
        }
        if self.layout.compact_column_height < 8 || self.layout.column_height < 8 {
            bail!("layout column heights must be at least 8");
        }
        Ok(())
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file {:?} does not exist", path);
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };
    parse_config_file(&path)
}

fn parse_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config =
        serde_yaml::from_str(&data).with_context(|| format!("parsing config {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("invalid config {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "theme:\n  primary: \"#112233\"\nlayout:\n  column_width: 36\nlog_level: debug\n",
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.theme.primary, "#112233");
        assert_eq!(config.theme.accent, ThemeConfig::default().accent);
        assert_eq!(config.layout.column_width, 36);
        assert_eq!(config.layout.column_height, 19);
        assert_eq!(config.level(), Level::DEBUG);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.yml"))).is_err());
    }

    #[test]
    fn rejects_unusable_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "layout:\n  column_width: 4\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("column_width"));
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = Config {
            log_level: "chatty".into(),
            ..Config::default()
        };
        assert_eq!(config.level(), Level::INFO);
    }
}

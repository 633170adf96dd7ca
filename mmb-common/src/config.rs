//! Configuration loading
//!
//! Two sources are merged into a [`BotConfig`]:
//! 1. **Overrides**: command-line arguments, with environment variable
//!    fallbacks handled by the binary's argument parser
//! 2. **TOML file**: optional bootstrap file
//!
//! Anything still unset falls back to built-in defaults. The database and
//! music paths have no defaults; missing either is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP control port
pub const DEFAULT_PORT: u16 = 8080;

/// Default chat command prefix
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Default number of tracks per `tracks` page
pub const DEFAULT_TRACKS_PAGE_SIZE: usize = 5;

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional so a partial file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Root folder scanned for audio files
    #[serde(default)]
    pub music_path: Option<PathBuf>,

    /// HTTP control port
    #[serde(default)]
    pub port: Option<u16>,

    /// Prefix that marks a chat message as a command
    #[serde(default)]
    pub command_prefix: Option<String>,

    /// Tracks listed per page by the `tracks` command
    #[serde(default)]
    pub tracks_page_size: Option<usize>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub music_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub command_prefix: Option<String>,
    pub tracks_page_size: Option<usize>,
    pub log_level: Option<String>,
}

/// Fully resolved bot configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub database_path: PathBuf,
    pub music_path: PathBuf,
    pub port: u16,
    pub command_prefix: String,
    pub tracks_page_size: usize,
    pub log_level: String,
}

impl BotConfig {
    /// Merge overrides over the TOML file over built-in defaults
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let database_path = overrides
            .database_path
            .or(file.database_path)
            .ok_or_else(|| Error::Config("DB path is empty.".to_string()))?;

        let music_path = overrides
            .music_path
            .or(file.music_path)
            .ok_or_else(|| Error::Config("Music path is empty.".to_string()))?;

        let tracks_page_size = overrides
            .tracks_page_size
            .or(file.tracks_page_size)
            .unwrap_or(DEFAULT_TRACKS_PAGE_SIZE);
        if tracks_page_size == 0 {
            return Err(Error::Config("tracks_page_size must be at least 1".to_string()));
        }

        Ok(Self {
            database_path,
            music_path,
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            command_prefix: overrides
                .command_prefix
                .or(file.command_prefix)
                .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string()),
            tracks_page_size,
            log_level: overrides
                .log_level
                .or(file.logging.level)
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Platform config file location (`<config dir>/mmb/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mmb").join("config.toml"))
}

/// Load the TOML bootstrap file
///
/// An explicitly requested file must exist. When no path is given the
/// platform default is tried, and its absence is not an error.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using command line and environment only");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config: TomlConfig = toml::from_str(&content).map_err(|e| {
        warn!("Invalid config file {}: {}", path.display(), e);
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn overrides_with_paths() -> ConfigOverrides {
        ConfigOverrides {
            database_path: Some(PathBuf::from("/tmp/bot.db")),
            music_path: Some(PathBuf::from("/srv/music")),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::resolve(overrides_with_paths(), TomlConfig::default()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.tracks_page_size, 5);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = TomlConfig {
            database_path: Some(PathBuf::from("/file/bot.db")),
            music_path: Some(PathBuf::from("/file/music")),
            port: Some(9000),
            command_prefix: Some("#".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            port: Some(9100),
            ..overrides_with_paths()
        };

        let config = BotConfig::resolve(overrides, file).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/bot.db"));
        assert_eq!(config.port, 9100);
        assert_eq!(config.command_prefix, "#");
    }

    #[test]
    fn test_missing_paths_rejected() {
        let err = BotConfig::resolve(ConfigOverrides::default(), TomlConfig::default()).unwrap_err();
        assert!(err.to_string().contains("DB path"));

        let only_db = ConfigOverrides {
            database_path: Some(PathBuf::from("/tmp/bot.db")),
            ..Default::default()
        };
        let err = BotConfig::resolve(only_db, TomlConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Music path"));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let overrides = ConfigOverrides {
            tracks_page_size: Some(0),
            ..overrides_with_paths()
        };
        assert!(BotConfig::resolve(overrides, TomlConfig::default()).is_err());
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            database_path = "/data/bot.db"
            music_path = "/data/music"
            port = 8181
            tracks_page_size = 10

            [logging]
            level = "debug"
            "#
        )
        .unwrap();

        let config = load_toml_config(Some(file.path())).unwrap();
        assert_eq!(config.port, Some(8181));
        assert_eq!(config.tracks_page_size, Some(10));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert!(config.command_prefix.is_none());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = load_toml_config(Some(Path::new("/nonexistent/mmb/config.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        assert!(load_toml_config(Some(file.path())).is_err());
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::cli::GlobalArgs;
use crate::error::Result;
use crate::notify::NotifyMode;
use crate::platform;

/// Settings from `config.toml`, with command line overrides applied.
///
/// ```toml
/// interval = "12h"
/// serial = "emulator-5554"
/// include_system_apps = false
/// notify = "log"
/// ```
///
/// Every key is optional. Unknown keys are ignored so configs written by
/// newer versions still load.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sync interval string, see `interval::parse_interval`
    #[serde(deserialize_with = "interval_value")]
    pub interval: String,
    pub serial: Option<String>,
    pub include_system_apps: bool,
    pub database: Option<PathBuf>,
    pub notify: NotifyMode,

    /// JSON inventory used instead of adb (command line only)
    #[serde(skip)]
    pub inventory: Option<PathBuf>,
    #[serde(skip)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            interval: "7d".to_string(),
            serial: None,
            include_system_apps: true,
            database: None,
            notify: NotifyMode::default(),
            inventory: None,
            verbose: false,
        }
    }
}

/// Older configs stored the interval as a bare number of hours.
fn interval_value<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Text(String),
        Hours(u64),
    }

    Ok(match Value::deserialize(deserializer)? {
        Value::Text(text) => text,
        Value::Hours(hours) => hours.to_string(),
    })
}

impl Config {
    /// Read a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let mut config = match args.config.clone().or_else(platform::default_config_path) {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        };

        if let Some(db) = &args.db {
            config.database = Some(db.clone());
        }
        if let Some(serial) = &args.serial {
            config.serial = Some(serial.clone());
        }
        if let Some(notify) = args.notify {
            config.notify = notify;
        }
        if args.user_apps_only {
            config.include_system_apps = false;
        }
        config.inventory = args.from_file.clone();
        config.verbose = args.verbose;

        Ok(config)
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => platform::default_db_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.interval, "7d");
        assert!(config.include_system_apps);
        assert_eq!(config.notify, NotifyMode::Console);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str("notify = \"log\"\nfuture_key = 1\n").unwrap();
        assert_eq!(config.notify, NotifyMode::Log);
        assert_eq!(config.interval, "7d");
    }

    #[test]
    fn legacy_numeric_interval_is_accepted() {
        let config: Config = toml::from_str("interval = 24").unwrap();
        assert_eq!(config.interval, "24");
        assert_eq!(crate::interval::parse_interval(&config.interval).as_secs(), 24 * 3_600);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "interval = [").unwrap();
        assert!(matches!(Config::load(&path), Err(crate::Error::Config(_))));
    }

    #[test]
    fn command_line_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "serial = \"from-file\"\ninclude_system_apps = true\n").unwrap();

        let args = GlobalArgs {
            config: Some(path),
            db: Some(dir.path().join("x.db")),
            serial: Some("emulator-5554".to_string()),
            from_file: None,
            notify: None,
            user_apps_only: true,
            verbose: false,
        };
        let config = Config::from_args(&args).unwrap();

        assert_eq!(config.serial.as_deref(), Some("emulator-5554"));
        assert!(!config.include_system_apps);
        assert_eq!(config.db_path().unwrap(), dir.path().join("x.db"));
    }
}

use std::path::PathBuf;
use std::process::Command;

use crate::error::{Error, Result};

/// adb binary to invoke. `ADB` overrides the PATH lookup, matching the
/// variable the Android SDK tools themselves honour.
pub fn adb_program() -> PathBuf {
    std::env::var_os("ADB")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("adb"))
}

pub fn adb_available() -> bool {
    Command::new(adb_program())
        .arg("version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "sdkwatch")
}

/// Default database path (~/.local/share/sdkwatch/sdkwatch.db or platform equivalent)
pub fn default_db_path() -> Result<PathBuf> {
    let dirs = project_dirs().ok_or(Error::DataDir("data"))?;
    Ok(dirs.data_dir().join("sdkwatch.db"))
}

/// Default config path (~/.config/sdkwatch/config.toml or platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

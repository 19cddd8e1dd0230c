//! adb-backed package source.
//!
//! Runs `adb shell dumpsys package packages` and parses each
//! `Package [name] (hash):` block for:
//! - versionCode, minSdk, targetSdk (one line, space separated)
//! - versionName
//! - lastUpdateTime (device local time, `YYYY-MM-DD HH:MM:SS`)
//! - flags (SYSTEM / UPDATED_SYSTEM_APP decide user vs system app)
//!
//! Blocks without a versionCode or targetSdk are skipped. Parsing stops at
//! the "Hidden system packages:" section, which repeats the factory copies
//! of updated system apps.

use std::process::Command;

use chrono::{Local, NaiveDateTime, TimeZone};
use tracing::debug;

use super::{InstalledPackage, PackageSource};
use crate::error::{Error, Result};
use crate::platform;

pub struct AdbSource {
    serial: Option<String>,
    include_system_apps: bool,
}

impl AdbSource {
    pub fn new(serial: Option<String>, include_system_apps: bool) -> Self {
        AdbSource {
            serial,
            include_system_apps,
        }
    }

    fn shell(&self, args: &[&str]) -> Result<String> {
        let mut command = Command::new(platform::adb_program());
        if let Some(serial) = &self.serial {
            command.arg("-s").arg(serial);
        }
        command.arg("shell").args(args);

        let output = command
            .output()
            .map_err(|e| Error::Source(format!("failed to run adb: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            if stderr.contains("no devices/emulators found") {
                return Err(Error::Source("no device connected".to_string()));
            }

            if stderr.contains("unauthorized") {
                return Err(Error::Source(
                    "device unauthorized (accept the USB debugging prompt)".to_string(),
                ));
            }

            if stderr.contains("offline") {
                return Err(Error::Source("device offline".to_string()));
            }

            return Err(Error::Source(format!("adb command failed: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn keep(&self, package: &InstalledPackage) -> bool {
        self.include_system_apps || package.is_user_app
    }

    /// Filters a full dumpsys listing. A device always has packages, so an
    /// empty parse means the output format was not understood; an empty
    /// result after dropping system apps is a valid snapshot.
    fn installed_from(&self, output: &str) -> Result<Vec<InstalledPackage>> {
        let parsed = parse_dumpsys(output);
        if parsed.is_empty() {
            return Err(Error::Source("dumpsys returned no packages".to_string()));
        }

        Ok(parsed.into_iter().filter(|p| self.keep(p)).collect())
    }
}

impl PackageSource for AdbSource {
    fn name(&self) -> &'static str {
        "adb"
    }

    fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let output = self.shell(&["dumpsys", "package", "packages"])?;
        self.installed_from(&output)
    }

    fn get_package(&self, package_name: &str) -> Result<Option<InstalledPackage>> {
        let output = self.shell(&["dumpsys", "package", package_name])?;
        Ok(parse_dumpsys(&output)
            .into_iter()
            .find(|p| p.package_name == package_name)
            .filter(|p| self.keep(p)))
    }
}

#[derive(Default)]
struct PartialPackage {
    name: String,
    version_code: Option<i64>,
    version_name: String,
    target_sdk: Option<i32>,
    min_sdk: i32,
    last_update_time: i64,
    system: bool,
}

impl PartialPackage {
    fn finish(self) -> Option<InstalledPackage> {
        let (Some(version_code), Some(target_sdk)) = (self.version_code, self.target_sdk) else {
            debug!(package = %self.name, "skipping package with incomplete metadata");
            return None;
        };

        Some(InstalledPackage {
            package_name: self.name,
            version_code,
            version_name: self.version_name,
            target_sdk,
            min_sdk: self.min_sdk,
            last_update_time: self.last_update_time,
            is_user_app: !self.system,
        })
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Parse the output of `dumpsys package` into complete packages.
pub fn parse_dumpsys(output: &str) -> Vec<InstalledPackage> {
    let mut packages = Vec::new();
    let mut current: Option<(usize, PartialPackage)> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("Hidden system packages:") {
            break;
        }

        if let Some(name) = package_header(trimmed) {
            if let Some((_, partial)) = current.take() {
                packages.extend(partial.finish());
            }
            let partial = PartialPackage {
                name: name.to_string(),
                ..PartialPackage::default()
            };
            current = Some((indent_of(line), partial));
            continue;
        }

        // a line at or left of the header's indent closes the block
        let closes = match &current {
            Some((header_indent, _)) => indent_of(line) <= *header_indent,
            None => continue,
        };
        if closes {
            if let Some((_, partial)) = current.take() {
                packages.extend(partial.finish());
            }
            continue;
        }
        let Some((_, partial)) = current.as_mut() else { continue };

        if let Some(flags) = trimmed.strip_prefix("flags=[").or_else(|| trimmed.strip_prefix("pkgFlags=[")) {
            partial.system |= flags
                .split_whitespace()
                .any(|f| f == "SYSTEM" || f == "UPDATED_SYSTEM_APP");
        } else if let Some(name) = trimmed.strip_prefix("versionName=") {
            partial.version_name = name.to_string();
        } else if let Some(time) = trimmed.strip_prefix("lastUpdateTime=") {
            partial.last_update_time = parse_device_time(time).unwrap_or(0);
        } else if trimmed.starts_with("versionCode=") {
            for token in trimmed.split_whitespace() {
                let Some((key, value)) = token.split_once('=') else { continue };
                match key {
                    "versionCode" => partial.version_code = value.parse().ok(),
                    "minSdk" => partial.min_sdk = value.parse().unwrap_or(0),
                    "targetSdk" => partial.target_sdk = value.parse().ok(),
                    _ => {}
                }
            }
        }
    }

    if let Some((_, partial)) = current {
        packages.extend(partial.finish());
    }

    packages
}

fn package_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("Package [")?;
    let end = rest.find(']')?;
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

/// Device timestamps carry no zone; they are read as host local time.
fn parse_device_time(value: &str) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M:%S").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

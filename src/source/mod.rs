//! Package inventory sources.
//!
//! A source produces a fresh snapshot of the installed packages on every
//! call. Two sources ship with the crate:
//! - adb: parses `dumpsys package` from a connected device
//! - static: an in-memory inventory, optionally loaded from a JSON file

pub mod adb;

use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One installed package as reported by the device at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub package_name: String,
    pub version_code: i64,
    #[serde(default)]
    pub version_name: String,
    pub target_sdk: i32,
    #[serde(default)]
    pub min_sdk: i32,
    /// epoch millis of the last install or update
    #[serde(default)]
    pub last_update_time: i64,
    #[serde(default = "default_user_app")]
    pub is_user_app: bool,
}

fn default_user_app() -> bool {
    true
}

pub trait PackageSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Full inventory. An error here means no snapshot could be taken at all.
    fn list_installed(&self) -> Result<Vec<InstalledPackage>>;

    /// Single package lookup. `Ok(None)` when the package is not installed.
    fn get_package(&self, package_name: &str) -> Result<Option<InstalledPackage>>;
}

/// In-memory inventory. The contents can be swapped between runs.
#[derive(Default)]
pub struct StaticSource {
    packages: Mutex<Vec<InstalledPackage>>,
}

impl StaticSource {
    pub fn new(packages: Vec<InstalledPackage>) -> Self {
        StaticSource {
            packages: Mutex::new(packages),
        }
    }

    /// Load an inventory from a JSON array of packages.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let packages: Vec<InstalledPackage> = serde_json::from_str(&contents)?;
        Ok(StaticSource::new(packages))
    }

    pub fn replace(&self, packages: Vec<InstalledPackage>) {
        *self.packages.lock() = packages;
    }

    /// Insert or replace a single package, matched by name.
    pub fn upsert(&self, package: InstalledPackage) {
        let mut packages = self.packages.lock();
        match packages.iter_mut().find(|p| p.package_name == package.package_name) {
            Some(existing) => *existing = package,
            None => packages.push(package),
        }
    }

    pub fn remove(&self, package_name: &str) {
        self.packages.lock().retain(|p| p.package_name != package_name);
    }
}

impl PackageSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        Ok(self.packages.lock().clone())
    }

    fn get_package(&self, package_name: &str) -> Result<Option<InstalledPackage>> {
        Ok(self
            .packages
            .lock()
            .iter()
            .find(|p| p.package_name == package_name)
            .cloned())
    }
}

//! Persistent app registry and target SDK history.
//!
//! Two record kinds:
//! - apps: one row per package ever seen, created once, never updated
//! - versions: append-only, one row per observed target SDK transition
//!
//! Removing an app always removes its versions with it (see `Store::prune`).

pub mod sqlite;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;

pub use sqlite::SqliteStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppRecord {
    pub package_name: String,
    pub title: String,
    /// ARGB, passed through to whatever renders the app list
    pub background_color: u32,
    pub is_from_play_store: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    pub package_name: String,
    pub version: i64,
    pub version_name: String,
    pub target_sdk: i32,
    pub last_update_time: i64,
}

pub trait AppRegistry {
    fn get_app(&self, package_name: &str) -> Result<Option<AppRecord>>;
    fn insert_app(&self, app: &AppRecord) -> Result<()>;
    fn delete_app(&self, package_name: &str) -> Result<()>;
    fn list_apps(&self) -> Result<Vec<AppRecord>>;
}

pub trait VersionStore {
    /// The most recently inserted record for the package.
    fn latest_version(&self, package_name: &str) -> Result<Option<VersionRecord>>;
    fn insert_version(&self, version: &VersionRecord) -> Result<()>;
    fn delete_versions(&self, package_name: &str) -> Result<()>;
    fn list_versions(&self) -> Result<Vec<VersionRecord>>;
    /// All records for a package, newest `last_update_time` first.
    fn history(&self, package_name: &str) -> Result<Vec<VersionRecord>>;
}

pub trait Store: AppRegistry + VersionStore + Send + Sync {
    /// Insert a new app together with its first version, or neither.
    ///
    /// The default inserts one after the other and deletes the app again if
    /// the version insert fails.
    fn register_first_version(&self, app: &AppRecord, version: &VersionRecord) -> Result<()> {
        self.insert_app(app)?;
        if let Err(e) = self.insert_version(version) {
            if let Err(undo) = self.delete_app(&app.package_name) {
                warn!(package = %app.package_name, error = %undo, "failed to undo app registration");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove a package's versions and then its app record.
    ///
    /// Versions go first so a failure part way never leaves versions without
    /// a parent app.
    fn prune(&self, package_name: &str) -> Result<()> {
        self.delete_versions(package_name)?;
        self.delete_app(package_name)
    }
}

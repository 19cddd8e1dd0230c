use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{AppRecord, AppRegistry, Store, VersionRecord, VersionStore};
use crate::error::Result;

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS apps (
            package_name TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            background_color INTEGER NOT NULL,
            is_from_play_store INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS versions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_name TEXT NOT NULL,
            version INTEGER NOT NULL,
            version_name TEXT NOT NULL,
            target_sdk INTEGER NOT NULL,
            last_update_time INTEGER NOT NULL,
            FOREIGN KEY(package_name) REFERENCES apps(package_name) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_versions_package_name ON versions(package_name)",
        [],
    )?;

    Ok(())
}

/// Database handle. The connection sits behind a mutex so one store can be
/// shared between the scheduled pass and event-driven syncs.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

impl AppRegistry for SqliteStore {
    fn get_app(&self, package_name: &str) -> Result<Option<AppRecord>> {
        let conn = self.conn.lock();
        let app = conn
            .query_row(
                "SELECT package_name, title, background_color, is_from_play_store
                 FROM apps
                 WHERE package_name = ?1",
                params![package_name],
                app_from_row,
            )
            .optional()?;
        Ok(app)
    }

    fn insert_app(&self, app: &AppRecord) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO apps (package_name, title, background_color, is_from_play_store)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                app.package_name,
                app.title,
                i64::from(app.background_color),
                app.is_from_play_store
            ],
        )?;
        Ok(())
    }

    fn delete_app(&self, package_name: &str) -> Result<()> {
        self.conn
            .lock()
            .execute("DELETE FROM apps WHERE package_name = ?1", params![package_name])?;
        Ok(())
    }

    fn list_apps(&self) -> Result<Vec<AppRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT package_name, title, background_color, is_from_play_store
             FROM apps
             ORDER BY title COLLATE NOCASE, package_name",
        )?;

        let apps = stmt
            .query_map([], app_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(apps)
    }
}

impl VersionStore for SqliteStore {
    fn latest_version(&self, package_name: &str) -> Result<Option<VersionRecord>> {
        let conn = self.conn.lock();
        let version = conn
            .query_row(
                "SELECT package_name, version, version_name, target_sdk, last_update_time
                 FROM versions
                 WHERE package_name = ?1
                 ORDER BY id DESC
                 LIMIT 1",
                params![package_name],
                version_from_row,
            )
            .optional()?;
        Ok(version)
    }

    fn insert_version(&self, version: &VersionRecord) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO versions (package_name, version, version_name, target_sdk, last_update_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                version.package_name,
                version.version,
                version.version_name,
                version.target_sdk,
                version.last_update_time
            ],
        )?;
        Ok(())
    }

    fn delete_versions(&self, package_name: &str) -> Result<()> {
        self.conn
            .lock()
            .execute("DELETE FROM versions WHERE package_name = ?1", params![package_name])?;
        Ok(())
    }

    fn list_versions(&self) -> Result<Vec<VersionRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT package_name, version, version_name, target_sdk, last_update_time
             FROM versions
             ORDER BY id",
        )?;

        let versions = stmt
            .query_map([], version_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(versions)
    }

    fn history(&self, package_name: &str) -> Result<Vec<VersionRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT package_name, version, version_name, target_sdk, last_update_time
             FROM versions
             WHERE package_name = ?1
             ORDER BY last_update_time DESC, id DESC",
        )?;

        let versions = stmt
            .query_map(params![package_name], version_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(versions)
    }
}

impl Store for SqliteStore {
    fn register_first_version(&self, app: &AppRecord, version: &VersionRecord) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO apps (package_name, title, background_color, is_from_play_store)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                app.package_name,
                app.title,
                i64::from(app.background_color),
                app.is_from_play_store
            ],
        )?;
        tx.execute(
            "INSERT INTO versions (package_name, version, version_name, target_sdk, last_update_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                version.package_name,
                version.version,
                version.version_name,
                version.target_sdk,
                version.last_update_time
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn prune(&self, package_name: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM versions WHERE package_name = ?1", params![package_name])?;
        tx.execute("DELETE FROM apps WHERE package_name = ?1", params![package_name])?;

        tx.commit()?;
        Ok(())
    }
}

fn app_from_row(row: &rusqlite::Row) -> rusqlite::Result<AppRecord> {
    Ok(AppRecord {
        package_name: row.get(0)?,
        title: row.get(1)?,
        background_color: row.get::<_, i64>(2)? as u32,
        is_from_play_store: row.get(3)?,
    })
}

fn version_from_row(row: &rusqlite::Row) -> rusqlite::Result<VersionRecord> {
    Ok(VersionRecord {
        package_name: row.get(0)?,
        version: row.get(1)?,
        version_name: row.get(2)?,
        target_sdk: row.get(3)?,
        last_update_time: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str) -> AppRecord {
        AppRecord {
            package_name: name.to_string(),
            title: name.to_string(),
            background_color: 0xFF33_6699,
            is_from_play_store: true,
        }
    }

    fn version(name: &str, sdk: i32, updated: i64) -> VersionRecord {
        VersionRecord {
            package_name: name.to_string(),
            version: i64::from(sdk) * 100,
            version_name: format!("{sdk}.0"),
            target_sdk: sdk,
            last_update_time: updated,
        }
    }

    #[test]
    fn app_round_trip_keeps_color() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_app(&app("com.example.a")).unwrap();

        let loaded = store.get_app("com.example.a").unwrap().unwrap();
        assert_eq!(loaded.background_color, 0xFF33_6699);
        assert!(store.get_app("com.example.missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_app_insert_fails() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_app(&app("com.example.a")).unwrap();
        assert!(store.insert_app(&app("com.example.a")).is_err());
    }

    #[test]
    fn version_requires_parent_app() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.insert_version(&version("com.example.orphan", 30, 1)).is_err());
    }

    #[test]
    fn latest_is_last_inserted_not_newest_timestamp() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_app(&app("com.example.a")).unwrap();
        store.insert_version(&version("com.example.a", 30, 2_000)).unwrap();
        store.insert_version(&version("com.example.a", 33, 1_000)).unwrap();

        let latest = store.latest_version("com.example.a").unwrap().unwrap();
        assert_eq!(latest.target_sdk, 33);
    }

    #[test]
    fn history_orders_by_update_time_descending() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_app(&app("com.example.a")).unwrap();
        store.insert_version(&version("com.example.a", 28, 1_000)).unwrap();
        store.insert_version(&version("com.example.a", 30, 3_000)).unwrap();
        store.insert_version(&version("com.example.a", 29, 2_000)).unwrap();

        let sdks: Vec<_> = store
            .history("com.example.a")
            .unwrap()
            .iter()
            .map(|v| v.target_sdk)
            .collect();
        assert_eq!(sdks, vec![30, 29, 28]);
    }

    #[test]
    fn prune_removes_app_and_versions() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_app(&app("com.example.a")).unwrap();
        store.insert_app(&app("com.example.b")).unwrap();
        store.insert_version(&version("com.example.a", 30, 1)).unwrap();
        store.insert_version(&version("com.example.a", 33, 2)).unwrap();
        store.insert_version(&version("com.example.b", 34, 3)).unwrap();

        store.prune("com.example.a").unwrap();

        assert!(store.get_app("com.example.a").unwrap().is_none());
        let remaining = store.list_versions().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].package_name, "com.example.b");
    }

    #[test]
    fn first_registration_writes_app_and_version() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .register_first_version(&app("com.example.a"), &version("com.example.a", 33, 1))
            .unwrap();

        assert!(store.get_app("com.example.a").unwrap().is_some());
        assert_eq!(store.latest_version("com.example.a").unwrap().unwrap().target_sdk, 33);
    }

    #[test]
    fn failed_first_registration_leaves_no_app() {
        let store = SqliteStore::open_in_memory().unwrap();
        // version points at an app that does not exist, so its insert fails
        let result = store.register_first_version(&app("com.example.a"), &version("com.example.other", 33, 1));

        assert!(result.is_err());
        assert!(store.get_app("com.example.a").unwrap().is_none());
        assert!(store.list_versions().unwrap().is_empty());
    }

    #[test]
    fn prune_unknown_package_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.prune("com.example.never").unwrap();
    }

    #[test]
    fn on_disk_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sdkwatch.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_app(&app("com.example.a")).unwrap();
            store.insert_version(&version("com.example.a", 31, 5)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.list_apps().unwrap().len(), 1);
        assert_eq!(store.latest_version("com.example.a").unwrap().unwrap().target_sdk, 31);
    }
}

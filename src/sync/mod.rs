//! Reconciliation of the device inventory against the stored history.
//!
//! A full pass:
//! 1. takes a snapshot from the package source (failure aborts the pass)
//! 2. prunes apps that are no longer installed
//! 3. registers new apps, records target SDK transitions, notifies changes
//!
//! Per-package failures are logged and counted; the package is picked up
//! again on the next pass. Every package is synced while holding its entry
//! in `PackageLocks`, so a scheduled pass and an install/update event for
//! the same package cannot both record the same transition.

pub mod change;
pub mod locks;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::labels::{AppLabeler, PackageNameLabeler};
use crate::notify::Notifier;
use crate::source::{InstalledPackage, PackageSource};
use crate::store::{AppRecord, AppRegistry, Store, VersionRecord, VersionStore};
use change::{Decision, SdkChange};
use locks::PackageLocks;

/// What an install/update/uninstall event asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ChangeKind {
    Insert,
    Update,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Snapshot lacked a usable name or target SDK.
    Skipped,
    Unchanged,
    /// First version recorded for the package, no notification.
    FirstSeen,
    Changed(SdkChange),
    Removed,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub packages_seen: usize,
    pub apps_registered: usize,
    pub versions_recorded: usize,
    pub notifications_sent: usize,
    pub pruned: usize,
    pub failures: usize,
    pub changes: Vec<SdkChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

struct Applied {
    registered: bool,
    notified: bool,
    outcome: Outcome,
}

impl Applied {
    fn quiet(outcome: Outcome) -> Self {
        Applied {
            registered: false,
            notified: false,
            outcome,
        }
    }
}

pub struct Reconciler {
    source: Arc<dyn PackageSource>,
    store: Arc<dyn Store>,
    labeler: Box<dyn AppLabeler>,
    notifier: Arc<dyn Notifier>,
    locks: PackageLocks,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn PackageSource>,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Reconciler {
            source,
            store,
            labeler: Box::new(PackageNameLabeler),
            notifier,
            locks: PackageLocks::new(),
        }
    }

    pub fn with_labeler(mut self, labeler: Box<dyn AppLabeler>) -> Self {
        self.labeler = labeler;
        self
    }

    pub fn reconcile_all(&self) -> Result<SyncReport> {
        let start = Instant::now();
        let mut report = SyncReport::default();

        let installed = self.source.list_installed()?;
        let known = self.store.list_apps()?;
        report.packages_seen = installed.len();

        let installed_names: HashSet<&str> =
            installed.iter().map(|p| p.package_name.as_str()).collect();

        for app in known
            .iter()
            .filter(|app| !installed_names.contains(app.package_name.as_str()))
        {
            match self.prune_stale(&app.package_name) {
                Ok(true) => report.pruned += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(package = %app.package_name, error = %e, "failed to prune, will retry next pass");
                    report.failures += 1;
                }
            }
        }

        for package in &installed {
            match self.apply(package) {
                Ok(applied) => {
                    if applied.registered {
                        report.apps_registered += 1;
                    }
                    if applied.notified {
                        report.notifications_sent += 1;
                    }
                    match applied.outcome {
                        Outcome::FirstSeen => report.versions_recorded += 1,
                        Outcome::Changed(change) => {
                            report.versions_recorded += 1;
                            report.changes.push(change);
                        }
                        _ => {}
                    }
                }
                Err(e) => {
                    warn!(package = %package.package_name, error = %e, "failed to sync package");
                    report.failures += 1;
                }
            }
        }

        report.duration_ms = Some(start.elapsed().as_millis());
        info!(
            source = self.source.name(),
            seen = report.packages_seen,
            registered = report.apps_registered,
            recorded = report.versions_recorded,
            pruned = report.pruned,
            failures = report.failures,
            "sync complete"
        );

        Ok(report)
    }

    pub fn reconcile_one(&self, package: &InstalledPackage) -> Result<Outcome> {
        self.apply(package).map(|applied| applied.outcome)
    }

    pub fn reconcile_single(&self, package_name: &str, kind: ChangeKind) -> Result<Outcome> {
        match kind {
            ChangeKind::Insert | ChangeKind::Update => match self.source.get_package(package_name)? {
                Some(package) => self.reconcile_one(&package),
                None => {
                    debug!(package = %package_name, "package gone before it could be synced, removing");
                    self.remove(package_name)
                }
            },
            ChangeKind::Remove => self.remove(package_name),
        }
    }

    fn remove(&self, package_name: &str) -> Result<Outcome> {
        {
            let lock = self.locks.for_package(package_name);
            let _guard = lock.lock();
            self.store.prune(package_name)?;
        }
        self.locks.release(package_name);

        debug!(package = %package_name, "pruned");
        Ok(Outcome::Removed)
    }

    /// Prune a package missing from the snapshot, unless it was installed
    /// again (and synced by an event) since the snapshot was taken.
    fn prune_stale(&self, package_name: &str) -> Result<bool> {
        {
            let lock = self.locks.for_package(package_name);
            let _guard = lock.lock();

            if self.source.get_package(package_name)?.is_some() {
                debug!(package = %package_name, "reinstalled since snapshot, keeping");
                return Ok(false);
            }
            self.store.prune(package_name)?;
        }
        self.locks.release(package_name);

        debug!(package = %package_name, "pruned");
        Ok(true)
    }

    fn apply(&self, package: &InstalledPackage) -> Result<Applied> {
        let name = package.package_name.as_str();
        if name.trim().is_empty() || package.target_sdk < 1 {
            debug!(package = %name, target_sdk = package.target_sdk, "skipping incomplete snapshot");
            return Ok(Applied::quiet(Outcome::Skipped));
        }

        let lock = self.locks.for_package(name);
        let _guard = lock.lock();

        let version = VersionRecord {
            package_name: name.to_string(),
            version: package.version_code,
            version_name: package.version_name.clone(),
            target_sdk: package.target_sdk,
            last_update_time: package.last_update_time,
        };

        let Some(app) = self.store.get_app(name)? else {
            let label = self.labeler.resolve(package)?;
            let app = AppRecord {
                package_name: name.to_string(),
                title: label.title,
                background_color: label.background_color,
                is_from_play_store: package.is_user_app,
            };
            self.store.register_first_version(&app, &version)?;
            debug!(package = %name, title = %app.title, target_sdk = package.target_sdk, "registered app");
            return Ok(Applied {
                registered: true,
                notified: false,
                outcome: Outcome::FirstSeen,
            });
        };

        let previous = self.store.latest_version(name)?.map(|v| v.target_sdk);

        let decision = change::decide(previous, package.target_sdk);
        if decision == Decision::Unchanged {
            return Ok(Applied::quiet(Outcome::Unchanged));
        }

        self.store.insert_version(&version)?;

        let Decision::Changed { old, new } = decision else {
            debug!(package = %name, target_sdk = package.target_sdk, "first version recorded");
            return Ok(Applied::quiet(Outcome::FirstSeen));
        };

        let change = SdkChange {
            app_label: app.title,
            package_name: name.to_string(),
            old_sdk: old,
            new_sdk: new,
        };

        // the version is already recorded; a failed notification is not retried
        let notified = match self.notifier.notify_sdk_change(&change) {
            Ok(()) => true,
            Err(e) => {
                warn!(package = %name, error = %e, "failed to send change notification");
                false
            }
        };

        Ok(Applied {
            registered: false,
            notified,
            outcome: Outcome::Changed(change),
        })
    }
}

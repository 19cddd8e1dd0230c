pub mod table;
pub mod json;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::sdk;
use crate::store::{AppRegistry, VersionStore};
use crate::sync::SyncReport;

/// A tracked app joined with its latest recorded version.
#[derive(Debug, Clone, Serialize)]
pub struct AppRow {
    pub package_name: String,
    pub title: String,
    pub is_from_play_store: bool,
    pub target_sdk: Option<i32>,
    pub version_name: Option<String>,
    pub last_update_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdkCount {
    pub target_sdk: i32,
    pub android_version: Option<&'static str>,
    pub apps: usize,
}

pub fn app_rows<S: AppRegistry + VersionStore + ?Sized>(store: &S) -> Result<Vec<AppRow>> {
    let mut rows = Vec::new();

    for app in store.list_apps()? {
        let latest = store.latest_version(&app.package_name)?;
        rows.push(AppRow {
            target_sdk: latest.as_ref().map(|v| v.target_sdk),
            version_name: latest.as_ref().map(|v| v.version_name.clone()),
            last_update_time: latest.map(|v| v.last_update_time),
            package_name: app.package_name,
            title: app.title,
            is_from_play_store: app.is_from_play_store,
        });
    }

    Ok(rows)
}

/// Apps per current target SDK, highest API level first.
pub fn sdk_distribution(rows: &[AppRow]) -> Vec<SdkCount> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for sdk in rows.iter().filter_map(|r| r.target_sdk) {
        *counts.entry(sdk).or_default() += 1;
    }

    counts
        .into_iter()
        .rev()
        .map(|(target_sdk, apps)| SdkCount {
            target_sdk,
            android_version: sdk::android_version_name(target_sdk),
            apps,
        })
        .collect()
}

pub fn format_date(epoch_millis: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_millis.div_euclid(1000), 0)
        .filter(|_| epoch_millis > 0)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn sync_summary(report: &SyncReport) -> String {
    let mut summary = format!(
        "synced {} packages: {} new apps, {} versions recorded, {} changes, {} removed",
        report.packages_seen,
        report.apps_registered,
        report.versions_recorded,
        report.changes.len(),
        report.pruned
    );

    if report.failures > 0 {
        summary.push_str(&format!(", {} failed (see logs)", report.failures));
    }
    if let Some(ms) = report.duration_ms {
        summary.push_str(&format!(" in {:.2}s", ms as f64 / 1000.0));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, sdk: Option<i32>) -> AppRow {
        AppRow {
            package_name: name.to_string(),
            title: name.to_string(),
            is_from_play_store: true,
            target_sdk: sdk,
            version_name: None,
            last_update_time: None,
        }
    }

    #[test]
    fn distribution_counts_and_orders() {
        let rows = vec![row("a", Some(33)), row("b", Some(30)), row("c", Some(33)), row("d", None)];
        let counts = sdk_distribution(&rows);

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].target_sdk, 33);
        assert_eq!(counts[0].apps, 2);
        assert_eq!(counts[0].android_version, Some("Android 13"));
        assert_eq!(counts[1].target_sdk, 30);
    }

    #[test]
    fn zero_timestamp_is_unknown() {
        assert_eq!(format_date(0), "unknown");
        assert_ne!(format_date(1_700_000_000_000), "unknown");
    }

    #[test]
    fn summary_mentions_failures_only_when_present() {
        let mut report = SyncReport {
            packages_seen: 3,
            ..SyncReport::default()
        };
        assert!(!sync_summary(&report).contains("failed"));

        report.failures = 1;
        assert!(sync_summary(&report).contains("1 failed"));
    }
}

//! Periodic and event-driven sync.
//!
//! The scheduler runs a full pass right away and then once per interval.
//! Package events arrive as text lines, one per event:
//!
//! ```text
//! update com.android.chrome
//! removed org.fdroid.fdroid
//! android.intent.action.PACKAGE_ADDED com.example.notes
//! ```

use std::io::BufRead;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::interval::format_interval;
use crate::sync::{ChangeKind, Reconciler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub package_name: String,
}

impl ChangeEvent {
    pub fn parse(line: &str) -> Option<ChangeEvent> {
        let mut parts = line.split_whitespace();
        let kind = parts.next()?;
        let package_name = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let kind = kind.strip_prefix("android.intent.action.PACKAGE_").unwrap_or(kind);
        let kind = match kind.to_ascii_lowercase().as_str() {
            "insert" | "added" | "install" => ChangeKind::Insert,
            "update" | "replaced" | "changed" => ChangeKind::Update,
            "remove" | "removed" | "uninstall" | "fully_removed" => ChangeKind::Remove,
            _ => return None,
        };

        Some(ChangeEvent {
            kind,
            package_name: package_name.strip_prefix("package:").unwrap_or(package_name).to_string(),
        })
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub failed_ticks: u64,
}

pub struct Scheduler {
    interval: Duration,
    max_ticks: Option<u64>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Scheduler {
            interval,
            max_ticks: None,
        }
    }

    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Runs until `max_ticks` passes have been made, or forever without it.
    /// A failed pass is logged and retried at the next tick.
    pub fn run(&self, reconciler: &Reconciler) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(interval = %format_interval(self.interval), "scheduler started");

        loop {
            if self.max_ticks.is_some_and(|max| summary.ticks >= max) {
                return summary;
            }
            if summary.ticks > 0 {
                std::thread::sleep(self.interval);
            }

            summary.ticks += 1;
            if let Err(e) = reconciler.reconcile_all() {
                summary.failed_ticks += 1;
                warn!(error = %e, "sync pass failed, retrying next tick");
            }
        }
    }
}

/// Applies events read from `reader` until it is exhausted. Returns the
/// number of events that synced without error.
pub fn watch_events<R: BufRead>(reader: R, reconciler: &Reconciler) -> Result<usize> {
    let mut applied = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let Some(event) = ChangeEvent::parse(&line) else {
            warn!(line = %line.trim(), "ignoring unrecognised event");
            continue;
        };

        match reconciler.reconcile_single(&event.package_name, event.kind) {
            Ok(outcome) => {
                debug!(package = %event.package_name, ?outcome, "event applied");
                applied += 1;
            }
            Err(e) => warn!(package = %event.package_name, error = %e, "event sync failed"),
        }
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_broadcast_forms() {
        assert_eq!(
            ChangeEvent::parse("update com.android.chrome"),
            Some(ChangeEvent {
                kind: ChangeKind::Update,
                package_name: "com.android.chrome".to_string()
            })
        );
        assert_eq!(
            ChangeEvent::parse("android.intent.action.PACKAGE_REMOVED package:org.fdroid.fdroid")
                .map(|e| (e.kind, e.package_name)),
            Some((ChangeKind::Remove, "org.fdroid.fdroid".to_string()))
        );
        assert_eq!(ChangeEvent::parse("  ADDED a.b  ").map(|e| e.kind), Some(ChangeKind::Insert));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(ChangeEvent::parse("update"), None);
        assert_eq!(ChangeEvent::parse("reboot com.example"), None);
        assert_eq!(ChangeEvent::parse("update a.b extra"), None);
    }
}

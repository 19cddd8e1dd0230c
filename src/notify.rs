use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::sync::change::SdkChange;

pub trait Notifier: Send + Sync {
    fn notify_sdk_change(&self, change: &SdkChange) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    #[default]
    Console,
    Log,
}

impl NotifyMode {
    pub fn notifier(self, target: ConsoleTarget) -> Arc<dyn Notifier> {
        match self {
            NotifyMode::Console => match target {
                ConsoleTarget::Stdout => Arc::new(ConsoleNotifier::new(Box::new(std::io::stdout()))),
                ConsoleTarget::Stderr => Arc::new(ConsoleNotifier::new(Box::new(std::io::stderr()))),
            },
            NotifyMode::Log => Arc::new(LogNotifier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

impl ConsoleTarget {
    /// Change lines stay off stdout when stdout carries a JSON document.
    pub fn for_output(json: bool) -> Self {
        if json {
            ConsoleTarget::Stderr
        } else {
            ConsoleTarget::Stdout
        }
    }
}

/// Writes one line per change.
pub struct ConsoleNotifier<W = Box<dyn Write + Send>> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        ConsoleNotifier { out: Mutex::new(out) }
    }
}

impl<W: Write + Send> Notifier for ConsoleNotifier<W> {
    fn notify_sdk_change(&self, change: &SdkChange) -> Result<()> {
        let mut out = self.out.lock();
        writeln!(out, "{}", change.describe())
            .and_then(|()| out.flush())
            .map_err(|e| Error::Notify(e.to_string()))
    }
}

/// Emits changes as tracing events, for running under a log collector.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_sdk_change(&self, change: &SdkChange) -> Result<()> {
        info!(
            package = %change.package_name,
            label = %change.app_label,
            old_sdk = change.old_sdk,
            new_sdk = change.new_sdk,
            direction = change.direction().as_str(),
            "target sdk changed"
        );
        Ok(())
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::notify::NotifyMode;
use crate::sync::ChangeKind;

#[derive(Parser)]
#[command(name = "sdkwatch")]
#[command(about = "Track target SDK changes of installed Android apps")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// adb device serial, when more than one device is attached
    #[arg(long, short = 's', global = true)]
    pub serial: Option<String>,

    /// Read the package inventory from a JSON file instead of adb
    #[arg(long, global = true)]
    pub from_file: Option<PathBuf>,

    /// Where target SDK changes are reported
    #[arg(long, value_enum, global = true)]
    pub notify: Option<NotifyMode>,

    /// Ignore system and updated system apps
    #[arg(long, global = true, default_value_t = false)]
    pub user_apps_only: bool,

    /// Show info level logs
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sync the installed packages once, or a single package
    Sync(SyncArgs),

    /// Sync on an interval, optionally applying package events from stdin
    Watch(WatchArgs),

    /// List tracked apps with their current target SDK
    Apps(OutputArgs),

    /// Show the target SDK history of one app
    History(HistoryArgs),

    /// Count tracked apps per target SDK
    Stats(OutputArgs),
}

#[derive(Parser)]
pub struct SyncArgs {
    /// Only sync this package
    #[arg(long)]
    pub package: Option<String>,

    /// Event that triggered a single package sync
    #[arg(long, value_enum, default_value_t = ChangeKind::Update, requires = "package")]
    pub event: ChangeKind,

    /// Print the report of a full sync as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct WatchArgs {
    /// Interval between syncs, e.g. 30m, 6h, 7d (overrides the config file)
    #[arg(long)]
    pub interval: Option<String>,

    /// Read `<event> <package>` lines from stdin and sync those packages as they arrive
    #[arg(long, default_value_t = false)]
    pub events_stdin: bool,

    /// Stop after this many scheduled passes
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub ticks: Option<u64>,
}

#[derive(Parser)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Package name, e.g. com.android.chrome
    pub package: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

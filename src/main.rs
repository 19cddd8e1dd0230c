use std::sync::Arc;

use clap::Parser;
use sdkwatch::cli::{Cli, Command, SyncArgs, WatchArgs};
use sdkwatch::config::Config;
use sdkwatch::interval;
use sdkwatch::notify::ConsoleTarget;
use sdkwatch::platform;
use sdkwatch::report;
use sdkwatch::schedule::{self, Scheduler};
use sdkwatch::source::adb::AdbSource;
use sdkwatch::source::{PackageSource, StaticSource};
use sdkwatch::store::{SqliteStore, VersionStore};
use sdkwatch::sync::{Outcome, Reconciler};
use sdkwatch::{Error, Result};
use tracing::info;

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_source(config: &Config) -> Result<Arc<dyn PackageSource>> {
    if let Some(path) = &config.inventory {
        let source = StaticSource::from_json_file(path)?;
        if !config.include_system_apps {
            let user_apps = source
                .list_installed()?
                .into_iter()
                .filter(|p| p.is_user_app)
                .collect();
            source.replace(user_apps);
        }
        return Ok(Arc::new(source));
    }

    if !platform::adb_available() {
        return Err(Error::Source(
            "adb not found (install platform-tools, set ADB, or use --from-file)".to_string(),
        ));
    }

    Ok(Arc::new(AdbSource::new(
        config.serial.clone(),
        config.include_system_apps,
    )))
}

fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let path = config.db_path()?;
    info!(path = %path.display(), "opening database");
    Ok(Arc::new(SqliteStore::open(&path)?))
}

fn reconciler(config: &Config, store: Arc<SqliteStore>, target: ConsoleTarget) -> Result<Reconciler> {
    Ok(Reconciler::new(open_source(config)?, store, config.notify.notifier(target)))
}

fn run_sync(config: &Config, args: &SyncArgs) -> Result<()> {
    let target = ConsoleTarget::for_output(args.json);
    let reconciler = reconciler(config, open_store(config)?, target)?;

    if let Some(package) = &args.package {
        let outcome = reconciler.reconcile_single(package, args.event)?;
        let message = match outcome {
            Outcome::Skipped => format!("{package}: skipped (incomplete package info)"),
            Outcome::Unchanged => format!("{package}: target SDK unchanged"),
            Outcome::FirstSeen => format!("{package}: now tracked"),
            Outcome::Changed(change) => change.describe(),
            Outcome::Removed => format!("{package}: removed"),
        };
        println!("{message}");
        return Ok(());
    }

    let result = reconciler.reconcile_all()?;
    if args.json {
        println!("{}", report::json::render(&result));
    } else {
        println!("{}", report::sync_summary(&result));
    }
    Ok(())
}

fn run_watch(config: &Config, args: &WatchArgs) -> Result<()> {
    let interval = interval::effective_interval(args.interval.as_deref().unwrap_or(&config.interval));
    let reconciler = Arc::new(reconciler(config, open_store(config)?, ConsoleTarget::Stdout)?);

    if args.events_stdin {
        let events = Arc::clone(&reconciler);
        // detached: the process exits when the scheduler stops, even if stdin is still open
        std::thread::spawn(move || {
            if let Err(e) = schedule::watch_events(std::io::stdin().lock(), &events) {
                eprintln!("event reader stopped: {e}");
            }
        });
    }

    let mut scheduler = Scheduler::new(interval);
    if let Some(ticks) = args.ticks {
        scheduler = scheduler.with_max_ticks(ticks);
    }

    let summary = scheduler.run(&reconciler);
    println!("{} passes, {} failed", summary.ticks, summary.failed_ticks);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_args(&cli.global)?;

    match cli.command {
        Command::Sync(args) => run_sync(&config, &args),
        Command::Watch(args) => run_watch(&config, &args),
        Command::Apps(args) => {
            let rows = report::app_rows(open_store(&config)?.as_ref())?;
            if args.json {
                println!("{}", report::json::render(&rows));
            } else {
                print!("{}", report::table::render_apps(&rows));
            }
            Ok(())
        }
        Command::History(args) => {
            let versions = open_store(&config)?.history(&args.package)?;
            if args.json {
                println!("{}", report::json::render(&versions));
            } else {
                print!("{}", report::table::render_history(&args.package, &versions));
            }
            Ok(())
        }
        Command::Stats(args) => {
            let rows = report::app_rows(open_store(&config)?.as_ref())?;
            let counts = report::sdk_distribution(&rows);
            if args.json {
                println!("{}", report::json::render(&counts));
            } else {
                print!("{}", report::table::render_stats(&counts));
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

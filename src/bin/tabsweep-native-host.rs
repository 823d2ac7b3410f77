//! Native Messaging Host for tabsweep
//!
//! This binary runs as a standalone native messaging host for the tabsweep browser extension.
//! It communicates via stdin/stdout using Chrome's native messaging protocol, so all
//! logging goes to stderr.

use log::{error, info, warn};
use std::sync::{Arc, Mutex};
use tabsweep_lib::{
    get_db_path,
    native_host::{NativeHost, OutgoingMessage, TriggerReason},
    open_database,
    scheduler::{CleanupScheduler, SchedulerConfig},
    settings_store::SettingsStore,
};
use tracing_subscriber::EnvFilter;

/// Overrides the interval between scheduled cleanups.
const INTERVAL_ENV: &str = "TABSWEEP_INTERVAL_SECS";

fn init_logging() {
    // Bridge `log` records from the library into tracing
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::warn!("log bridge already installed: {e}");
    }
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        tracing::warn!("tracing subscriber already installed: {e}");
    }
}

fn scheduler_config() -> SchedulerConfig {
    let mut config = SchedulerConfig::default();
    if let Ok(raw) = std::env::var(INTERVAL_ENV) {
        match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => config.interval_secs = secs,
            Ok(_) | Err(_) => warn!("Ignoring invalid {INTERVAL_ENV}={raw}"),
        }
    }
    config
}

fn main() {
    init_logging();

    let db = match get_db_path().and_then(|path| open_database(&path)) {
        Ok(db) => Arc::new(Mutex::new(db)),
        Err(e) => {
            error!("Initialization error: {e}");
            std::process::exit(1);
        }
    };

    let mut host = NativeHost::new(std::io::stdin(), std::io::stdout(), SettingsStore::new(db));

    let scheduler = CleanupScheduler::new(scheduler_config());
    let sender = host.sender();
    let scheduler_handle = scheduler.start(move || {
        let request = OutgoingMessage::RequestSnapshot { reason: TriggerReason::Timer };
        if let Err(e) = sender.send(&request) {
            warn!("Failed to request scheduled snapshot: {e}");
        }
    });
    info!("tabsweep native host started");

    // This will read from stdin and write to stdout until the connection is closed
    let result = host.run();

    scheduler.stop();
    if scheduler_handle.join().is_err() {
        warn!("Scheduler thread panicked");
    }

    if let Err(e) = result {
        // Only report unexpected errors; EOF is expected when the browser closes the connection
        if e.kind() != std::io::ErrorKind::UnexpectedEof {
            error!("Native host error: {e}");
            std::process::exit(1);
        }
    }
    info!("Extension disconnected, exiting");
}

//! Host plumbing shared by the demos
//!
//! On a host the critical sections come from `critical-section/std` and
//! the tick is a plain sleep. Log output goes to stdout; set `RTL_LOG` to
//! `trace`, `debug`, `info`, `warn` or `error` to pick the level.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{LevelFilter, Log, Metadata, Record};

/// Main loop period
pub const TICK: Duration = Duration::from_millis(10);

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            println!("[{:<5}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the stdout logger at the level named by `RTL_LOG`
pub fn init_logging() {
    let level = std::env::var("RTL_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::Info);

    match log::set_logger(&LOGGER) {
        Ok(()) => log::set_max_level(level),
        Err(err) => eprintln!("logger already installed: {}", err),
    }
}

/// Flag that turns false once Ctrl-C is pressed
pub fn stop_flag() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);

    if let Err(err) = ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    }) {
        log::warn!("Ctrl-C handler not installed: {}", err);
    }

    running
}

/// Whether the loop should keep going
pub fn keep_running(flag: &AtomicBool) -> bool {
    flag.load(Ordering::SeqCst)
}

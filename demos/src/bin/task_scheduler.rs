//! Preemptive-by-position task list on the host
//!
//! Three tasks share one scheduler:
//! - a keypad poller near the head that cuts the pass short when a key
//!   arrives,
//! - a blinker that toggles an LED every half second,
//! - a slow housekeeping task at the tail that only runs on quiet ticks.
//!
//! A host watchdog counts the feeds and complains if a pass never comes.

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

use rtl_core::{RtlResult, Watchdog};
use rtl_demos::{init_logging, keep_running, stop_flag, TICK};
use rtl_tasks::{FnTask, Task, TaskScheduler};

const MAX_TICKS: u32 = 500;

/// Watchdog that only logs instead of resetting the host
struct HostWatchdog {
    last_feed: Instant,
    timeout: Duration,
    feeds: u64,
}

impl HostWatchdog {
    fn new(timeout: Duration) -> Self {
        Self {
            last_feed: Instant::now(),
            timeout,
            feeds: 0,
        }
    }
}

impl Watchdog for HostWatchdog {
    fn feed(&mut self) {
        let starved = self.last_feed.elapsed();
        if starved > self.timeout {
            log::warn!("watchdog starved for {:?}", starved);
        }
        self.last_feed = Instant::now();
        self.feeds += 1;
    }
}

/// Fake keypad: a key arrives every 70 ticks
struct Keypad<'t> {
    tick: &'t Cell<u32>,
    pressed: u32,
}

impl Task for Keypad<'_> {
    fn execute(&mut self) -> bool {
        if self.tick.get() % 70 != 0 {
            return false;
        }

        self.pressed += 1;
        log::info!("key {} pressed, skipping the rest of the pass", self.pressed);
        true
    }

    fn name(&self) -> &'static str {
        "Keypad"
    }
}

fn main() -> RtlResult<()> {
    init_logging();
    let running = stop_flag();

    let tick = Cell::new(0u32);
    let led = Cell::new(false);
    let housekeeping = Cell::new(0u32);

    let mut keypad = Keypad {
        tick: &tick,
        pressed: 0,
    };
    let mut blinker = FnTask(|| {
        if tick.get() % 50 == 0 {
            led.set(!led.get());
            log::debug!("led {}", if led.get() { "on" } else { "off" });
        }
        false
    });
    let mut janitor = FnTask(|| {
        housekeeping.set(housekeeping.get() + 1);
        false
    });

    let mut scheduler: TaskScheduler<'_, 4, HostWatchdog> =
        TaskScheduler::with_watchdog(HostWatchdog::new(Duration::from_millis(100)));

    scheduler.schedule(&mut janitor)?;
    let keypad = scheduler.register(&mut keypad)?;
    scheduler.insert_at(keypad, 1);
    let blinker = scheduler.register(&mut blinker)?;
    scheduler.insert_after(blinker, keypad);
    scheduler.dump("scheduled tasks");

    let mut preempted = 0;
    while keep_running(&running) && tick.get() < MAX_TICKS {
        if scheduler.dispatch() {
            preempted += 1;
        }
        tick.set(tick.get() + 1);
        thread::sleep(TICK);
    }

    log::info!(
        "{} ticks, {} preempted, housekeeping ran {} times, {} watchdog feeds",
        tick.get(),
        preempted,
        housekeeping.get(),
        scheduler.watchdog().feeds
    );
    Ok(())
}

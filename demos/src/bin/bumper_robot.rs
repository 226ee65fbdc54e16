//! Bumper robot
//!
//! Cruises forward until a bumper switch closes, backs up for a while and
//! then cruises again.
//!
//! Bumper presses are simulated. Each press is delivered twice:
//! - straight away through the event bus to the telemetry listeners,
//! - through the global event queue to whichever behaviour state is current.
//!
//! A state asks for a mode change through the manager's `StateRequest`,
//! which is applied at the end of the tick.

use std::cell::Cell;
use std::thread;

use rtl_demos::{init_logging, keep_running, stop_flag, TICK};
use rtl_events::queue;
use rtl_events::{
    DefaultEventBus, Event, EventCode, EventId, EventListener, EventSource, RtlResult,
    SourceCategory,
};
use rtl_tasks::{
    Pollable, StateBase, StateHandle, StateHandler, StateRequest, TaskBase, TaskListSwitch,
    TaskManager, TaskState,
};

const BUMP: EventId = EventId::compose(SourceCategory::SWITCH, EventCode::DETECT);

const CRUISE_SPEED: i16 = 100;
const REVERSE_SPEED: i16 = -40;
const BACKUP_TICKS: u32 = 25;
const MAX_TICKS: u32 = 1_000;

/// Handles of the behaviour states, filled in once they are registered
#[derive(Default)]
struct Modes {
    cruise: Cell<Option<StateHandle>>,
    backup: Cell<Option<StateHandle>>,
}

impl Modes {
    fn switch_to(&self, request: &StateRequest, mode: &Cell<Option<StateHandle>>) {
        if let Some(state) = mode.get() {
            request.request_state(state);
        }
    }
}

/// Simulated bumper switches
struct Bumpers {
    left: EventSource,
    right: EventSource,
}

impl Bumpers {
    fn pressed(&self, tick: u32) -> Option<EventSource> {
        if tick % 97 == 40 {
            Some(self.left)
        } else if tick % 131 == 90 {
            Some(self.right)
        } else {
            None
        }
    }
}

/// Counts presses on every bumper it is attached to
struct BumpTally<'c> {
    count: &'c Cell<u32>,
}

impl EventListener for BumpTally<'_> {
    fn on_event(&mut self, _event: &Event) {
        self.count.set(self.count.get() + 1);
    }
}

fn announce(event: &Event) {
    if let Some(source) = event.source {
        log::info!("bumper {} pressed at tick {}", source, event.payload);
    }
}

/// Integrates the motor speed into a travelled distance
struct Odometer<'m> {
    speed: &'m Cell<i16>,
    distance: i32,
    polls: u32,
}

impl Pollable for Odometer<'_> {
    fn poll(&mut self) {
        self.distance += i32::from(self.speed.get());
        self.polls += 1;
        if self.polls % 100 == 0 {
            log::info!("odometer: {} units", self.distance);
        }
    }

    fn state_changing(&mut self, next: TaskState) {
        log::debug!("odometer: {}", next);
    }

    fn name(&self) -> Option<&'static str> {
        Some("Odometer")
    }
}

struct Cruise<'s> {
    speed: &'s Cell<i16>,
    modes: &'s Modes,
    request: &'s StateRequest,
}

impl Pollable for Cruise<'_> {
    fn state_changing(&mut self, next: TaskState) {
        if next == TaskState::Resuming {
            log::info!("cruising");
            self.speed.set(CRUISE_SPEED);
        }
    }

    fn name(&self) -> Option<&'static str> {
        Some("Cruise")
    }
}

impl StateHandler for Cruise<'_> {
    fn on_event(&mut self, event: &Event) {
        if event.id == BUMP {
            self.modes.switch_to(self.request, &self.modes.backup);
        }
    }
}

struct BackUp<'s> {
    speed: &'s Cell<i16>,
    modes: &'s Modes,
    request: &'s StateRequest,
    remaining: u32,
}

impl Pollable for BackUp<'_> {
    fn poll(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.modes.switch_to(self.request, &self.modes.cruise);
        }
    }

    fn state_changing(&mut self, next: TaskState) {
        match next {
            TaskState::Resuming => {
                log::info!("backing up");
                self.remaining = BACKUP_TICKS;
                self.speed.set(REVERSE_SPEED);
            }
            _ => self.speed.set(0),
        }
    }

    fn name(&self) -> Option<&'static str> {
        Some("BackUp")
    }
}

impl StateHandler for BackUp<'_> {
    fn on_event(&mut self, event: &Event) {
        log::debug!("already backing up, ignoring {}", event.id);
    }
}

fn main() -> RtlResult<()> {
    init_logging();
    let running = stop_flag();

    let speed = Cell::new(0);
    let modes = Modes::default();
    let request = StateRequest::new();
    let bumps = Cell::new(0);

    let mut tally = BumpTally { count: &bumps };
    let mut odometer = TaskBase::new(Odometer {
        speed: &speed,
        distance: 0,
        polls: 0,
    });
    let mut cruise = StateBase::new(Cruise {
        speed: &speed,
        modes: &modes,
        request: &request,
    });
    let mut backup = StateBase::new(BackUp {
        speed: &speed,
        modes: &modes,
        request: &request,
        remaining: 0,
    });

    let mut bus = DefaultEventBus::new();
    let left = bus.add_source()?;
    let right = bus.add_source()?;
    let tally = bus.register_listener(&mut tally)?;
    for bumper in [left, right] {
        bus.attach_listener(bumper, tally)?;
        bus.attach_fn(bumper, announce)?;
    }

    let mut manager: TaskManager = TaskManager::new();
    let odometer = manager.register_task(&mut odometer)?;
    let cruising = manager.register_state(&mut cruise)?;
    let backing_up = manager.register_state(&mut backup)?;
    modes.cruise.set(Some(cruising));
    modes.backup.set(Some(backing_up));
    manager.set_state_request(&request);

    let tasks = [odometer];
    manager.set_task_list(Some(&tasks), TaskListSwitch::default());
    manager.set_current_state(Some(cruising));
    manager.dump_task_list("robot tasks");

    let events = queue::global();
    let bumpers = Bumpers { left, right };
    let mut tick = 0;

    while keep_running(&running) && tick < MAX_TICKS {
        if let Some(bumper) = bumpers.pressed(tick) {
            bus.dispatch(bumper, BUMP, tick);
            if let Err(err) = bumper.queue_event(events, BUMP, tick) {
                log::warn!("{}: {}", bumper, err);
            }
        }

        manager.dispatch(events);

        tick += 1;
        thread::sleep(TICK);
    }

    log::info!("stopped after {} ticks and {} bumps", tick, bumps.get());
    Ok(())
}

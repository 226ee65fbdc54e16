#![no_std]
#![forbid(unsafe_code)]

//! # RTL Tasks
//!
//! Two ways of running cooperative work from the main loop:
//!
//! - [`TaskScheduler`]: an ordered list of [`Task`]s. Each pass walks the
//!   list from the head and stops at the first task that reports a change,
//!   so tasks near the head effectively preempt the ones behind them on the
//!   next tick.
//! - [`TaskManager`]: runs every task of the active task list, feeds queued
//!   events to the current state and then runs that state. Tasks and states
//!   carry the [`TaskState`] lifecycle of [`TaskBase`].
//!
//! Neither owns its tasks. Both are plain values the host builds before the
//! first tick and drives once per loop iteration.

pub mod lifecycle;
pub mod manager;
pub mod scheduler;

pub use lifecycle::*;
pub use manager::*;
pub use scheduler::*;

/// Default number of tasks a scheduler or manager can hold
pub const DEFAULT_MAX_TASKS: usize = 16;

/// Default number of states a manager can hold
pub const DEFAULT_MAX_STATES: usize = 8;

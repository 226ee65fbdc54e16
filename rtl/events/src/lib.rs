#![no_std]
#![forbid(unsafe_code)]

//! # RTL Events
//!
//! Event delivery for the RTL runtime:
//!
//! - [`EventQueue`]: a bounded FIFO that interrupt handlers and the main loop
//!   can both post to. The main loop drains it once per tick.
//! - [`EventBus`]: the multicast side. Each [`EventSource`] owns a chain of
//!   bindings and every binding forwards to one listener object or function.
//!
//! A typical tick looks like:
//!
//! ```rust,ignore
//! static EVENTS: EventQueue<8> = EventQueue::new();
//!
//! loop {
//!     EVENTS.dispatch(&mut bus);
//! }
//! ```

pub mod binding;
pub mod bus;
pub mod queue;
pub mod source;

pub use binding::*;
pub use bus::*;
pub use queue::{EventDispatch, EventQueue};
pub use rtl_core::*;
pub use source::*;

/// Default number of slots in an event queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Default number of sources an [`EventBus`] can register
pub const DEFAULT_MAX_SOURCES: usize = 8;

/// Default size of an [`EventBus`] binding arena
pub const DEFAULT_MAX_BINDINGS: usize = 16;

/// Default number of listener objects an [`EventBus`] can hold
pub const DEFAULT_MAX_LISTENERS: usize = 8;

#![no_std]
#![forbid(unsafe_code)]

//! # RTL Core
//!
//! Value types shared by every layer of the RTL dispatch runtime: the
//! [`Event`] record, its 16-bit [`EventId`], the fixed-size [`Variant`]
//! payload, the event code tables and the [`Watchdog`] hook.
//!
//! Nothing in this crate allocates. Every type is `Copy` so events can sit
//! in a pre-allocated queue and be copied in and out of it.

use core::fmt;

pub mod codes;
pub mod event;
pub mod hal;
pub mod variant;

pub use codes::*;
pub use event::*;
pub use hal::*;
pub use variant::*;

/// RTL runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the RTL runtime
pub type RtlResult<T> = Result<T, RtlError>;

/// Error types for RTL runtime operations
///
/// Only capacity problems are errors. Structural lookups that find nothing
/// (detaching an unknown binding, removing an unlinked task) are reported
/// through a `bool` return and never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtlError {
    /// Event queue is full, the event was dropped
    QueueFull,
    /// A fixed-size table has no free slot left
    CapacityExhausted,
    /// Handle was not issued by this container
    InvalidHandle,
}

impl fmt::Display for RtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtlError::QueueFull => write!(f, "Event queue is full"),
            RtlError::CapacityExhausted => write!(f, "No free slot left"),
            RtlError::InvalidHandle => write!(f, "Unknown handle"),
        }
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for RtlError {}

#[cfg(feature = "defmt")]
impl defmt::Format for RtlError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            RtlError::QueueFull => defmt::write!(fmt, "QueueFull"),
            RtlError::CapacityExhausted => defmt::write!(fmt, "CapacityExhausted"),
            RtlError::InvalidHandle => defmt::write!(fmt, "InvalidHandle"),
        }
    }
}

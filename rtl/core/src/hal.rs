//! Hooks the runtime needs from the board support layer
//!
//! Interrupt masking is not modelled here: the queue uses the
//! `critical-section` crate, whose implementation the board (or
//! `critical-section/std` on a host) provides.

/// Hardware watchdog that resets the device unless it is fed in time
///
/// The task scheduler feeds it once per task visited, so a task that never
/// returns ends in a watchdog reset.
pub trait Watchdog {
    /// Acknowledge the watchdog
    fn feed(&mut self);
}

/// Watchdog for targets that have none
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWatchdog;

impl Watchdog for NoWatchdog {
    #[inline]
    fn feed(&mut self) {}
}

impl<W: Watchdog + ?Sized> Watchdog for &mut W {
    fn feed(&mut self) {
        (**self).feed();
    }
}

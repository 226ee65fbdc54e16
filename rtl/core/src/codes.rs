//! Source categories and generic event codes
//!
//! An [`EventId`](crate::EventId) is built from a [`SourceCategory`] in the
//! high byte and an [`EventCode`] in the low byte, so the two never overlap.

use core::fmt;

/// Device class that raised an event (high byte of an event id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceCategory(pub u8);

impl SourceCategory {
    pub const TIMER: SourceCategory = SourceCategory(0x01);
    pub const SWITCH: SourceCategory = SourceCategory(0x02);
    pub const IR_SENSOR: SourceCategory = SourceCategory(0x03);
    pub const IR_PROXIMITY: SourceCategory = SourceCategory(0x04);
    pub const IR_PROXIMITY_ARRAY: SourceCategory = SourceCategory(0x05);
    pub const SONAR_SENSOR: SourceCategory = SourceCategory(0x06);
    pub const SONAR_PLATFORM: SourceCategory = SourceCategory(0x07);
    pub const DC_MOTOR_CONTROLLER: SourceCategory = SourceCategory(0x08);
    pub const STEPPER_MOTOR_CONTROLLER: SourceCategory = SourceCategory(0x09);
    pub const MOVEMENT: SourceCategory = SourceCategory(0x0A);
    /// Older name of [`SourceCategory::MOVEMENT`]
    #[deprecated(note = "use SourceCategory::MOVEMENT")]
    pub const MOVEMENT_CONTROLLER: SourceCategory = SourceCategory::MOVEMENT;
    pub const INERTIAL_REFERENCE: SourceCategory = SourceCategory(0x0B);
    pub const NAVIGATION: SourceCategory = SourceCategory(0x0C);
    pub const TASK: SourceCategory = SourceCategory(0x0D);
    pub const KEYPAD: SourceCategory = SourceCategory(0x0E);
    /// First category available to applications
    pub const CUSTOM: SourceCategory = SourceCategory(0xF0);

    /// Create a category from a raw value
    pub const fn new(category: u8) -> Self {
        SourceCategory(category)
    }

    /// Get the raw category value
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category({:#04x})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SourceCategory {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Category({=u8:#x})", self.0);
    }
}

/// Generic meaning of an event (low byte of an event id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventCode(pub u8);

impl EventCode {
    /// Default event of a source
    pub const DEFAULT: EventCode = EventCode(0x00);
    pub const DEBUG_INFO: EventCode = EventCode(0x01);
    pub const DETECT: EventCode = EventCode(0x02);
    /// Something fired, such as a timer
    pub const TRIGGER: EventCode = EventCode(0x03);
    /// Binary state flipped
    pub const TOGGLE: EventCode = EventCode(0x04);
    pub const UPDATE: EventCode = EventCode(0x05);
    pub const COMMAND: EventCode = EventCode(0x06);
    pub const COMMAND_REPEAT: EventCode = EventCode(0x07);
    pub const COMMAND_END: EventCode = EventCode(0x08);
    pub const OBSTACLE: EventCode = EventCode(0x09);
    pub const START_MOTION: EventCode = EventCode(0x0A);
    pub const STOP_MOTION: EventCode = EventCode(0x0B);
    pub const TURN_BEGIN: EventCode = EventCode(0x0C);
    pub const TURN_END: EventCode = EventCode(0x0D);
    pub const MOVED: EventCode = EventCode(0x0E);
    pub const TURNED: EventCode = EventCode(0x0F);
    pub const STARTED: EventCode = EventCode(0x10);
    pub const COMPLETE: EventCode = EventCode(0x11);
    pub const ABORTED: EventCode = EventCode(0x12);
    pub const RESPONSE: EventCode = EventCode(0x13);
    pub const NOTIFY: EventCode = EventCode(0x14);
    pub const SPIN_BEGIN: EventCode = EventCode(0x15);
    pub const SPIN_END: EventCode = EventCode(0x16);
    pub const BACKUP_BEGIN: EventCode = EventCode(0x17);
    pub const BACKUP_END: EventCode = EventCode(0x18);
    pub const KEY_PRESSED: EventCode = EventCode(0x19);
    pub const SPIN_ABORT: EventCode = EventCode(0x1A);
    pub const TURN_ABORT: EventCode = EventCode(0x1B);

    /// Create a code from a raw value
    pub const fn new(code: u8) -> Self {
        EventCode(code)
    }

    /// Get the raw code value
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({:#04x})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventCode {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Code({=u8:#x})", self.0);
    }
}

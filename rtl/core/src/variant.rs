//! Fixed-size tagged payload carried by events

use core::fmt;

/// Payload of an [`Event`](crate::Event)
///
/// A copyable tagged union of the primitive kinds sensors and drivers post.
/// Pointers are carried as plain addresses so the payload stays `Send` and
/// can live in an interrupt-shared queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant {
    Int(i16),
    UnsignedInt(u16),
    Long(i32),
    UnsignedLong(u32),
    Bool(bool),
    Float(f32),
    /// Opaque address, never dereferenced by the runtime
    Pointer(usize),
}

impl Variant {
    /// Widen any integer kind to `i32`
    ///
    /// `UnsignedLong` values above `i32::MAX` and non-integer kinds yield `None`.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Variant::Int(v) => Some(v as i32),
            Variant::UnsignedInt(v) => Some(v as i32),
            Variant::Long(v) => Some(v),
            Variant::UnsignedLong(v) => i32::try_from(v).ok(),
            _ => None,
        }
    }

    /// Widen any unsigned integer kind to `u32`
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Variant::UnsignedInt(v) => Some(v as u32),
            Variant::UnsignedLong(v) => Some(v),
            Variant::Int(v) => u32::try_from(v).ok(),
            Variant::Long(v) => u32::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Variant::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Variant::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<usize> {
        match *self {
            Variant::Pointer(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Long(0)
    }
}

macro_rules! variant_from {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl From<$ty> for Variant {
                fn from(value: $ty) -> Self {
                    Variant::$kind(value)
                }
            }
        )*
    };
}

variant_from! {
    i16 => Int,
    u16 => UnsignedInt,
    i32 => Long,
    u32 => UnsignedLong,
    bool => Bool,
    f32 => Float,
}

impl<T> From<*const T> for Variant {
    fn from(ptr: *const T) -> Self {
        Variant::Pointer(ptr as usize)
    }
}

impl<T> From<*mut T> for Variant {
    fn from(ptr: *mut T) -> Self {
        Variant::Pointer(ptr as usize)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Int(v) => write!(f, "{}", v),
            Variant::UnsignedInt(v) => write!(f, "{}u", v),
            Variant::Long(v) => write!(f, "{}L", v),
            Variant::UnsignedLong(v) => write!(f, "{}uL", v),
            Variant::Bool(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}f", v),
            Variant::Pointer(v) => write!(f, "{:#x}", v),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Variant {
    fn format(&self, fmt: defmt::Formatter) {
        match *self {
            Variant::Int(v) => defmt::write!(fmt, "Int({=i16})", v),
            Variant::UnsignedInt(v) => defmt::write!(fmt, "UnsignedInt({=u16})", v),
            Variant::Long(v) => defmt::write!(fmt, "Long({=i32})", v),
            Variant::UnsignedLong(v) => defmt::write!(fmt, "UnsignedLong({=u32})", v),
            Variant::Bool(v) => defmt::write!(fmt, "Bool({=bool})", v),
            Variant::Float(v) => defmt::write!(fmt, "Float({=f32})", v),
            Variant::Pointer(v) => defmt::write!(fmt, "Pointer({=usize:#x})", v),
        }
    }
}

//! Wire type tags.
//!
//! Each encoded value starts with one of these. Scalars have a fixed payload
//! width; objects and arrays are followed by an element list.

use std::fmt;

use bilbinary_tree::is_integral;

/// Width of a key code after the tag of a mapping member.
pub const KEY_WIDTH: usize = 2;

/// Width of the length prefix of an element list.
pub const ELIST_HEADER: usize = 2;

/// Largest element list, prefix included.
pub const MAX_ELIST_LEN: usize = u16::MAX as usize;

/// Value type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    /// IEEE-754 single precision, little endian.
    Number = 0x01,
    /// Dictionary code, little endian.
    Keyword = 0x02,
    /// Mapping element list.
    Object = 0x03,
    /// Sequence element list.
    Array = 0x04,
    /// Signed 8-bit integer.
    Int8 = 0x05,
    /// Signed 16-bit integer, little endian.
    Int16 = 0x06,
    /// Signed 32-bit integer, little endian. Never produced by the encoder;
    /// accepted on decode for forward compatibility with writers that emit it.
    Int32 = 0x07,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl TypeTag {
    /// Parse a tag byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(TypeTag::Number),
            0x02 => Some(TypeTag::Keyword),
            0x03 => Some(TypeTag::Object),
            0x04 => Some(TypeTag::Array),
            0x05 => Some(TypeTag::Int8),
            0x06 => Some(TypeTag::Int16),
            0x07 => Some(TypeTag::Int32),
            _ => None,
        }
    }

    /// Payload width of a scalar tag. `None` for element lists.
    pub fn payload_width(self) -> Option<usize> {
        match self {
            TypeTag::Int8 => Some(1),
            TypeTag::Keyword | TypeTag::Int16 => Some(2),
            TypeTag::Number | TypeTag::Int32 => Some(4),
            TypeTag::Object | TypeTag::Array => None,
        }
    }

    /// The narrowest tag for a number.
    ///
    /// Integers in the 8-bit then 16-bit range use the integer tags; anything
    /// else, including wider integers, becomes a single-precision float.
    pub fn for_number(n: f64) -> Self {
        if !is_integral(n) {
            return TypeTag::Number;
        }
        if (f64::from(i8::MIN)..=f64::from(i8::MAX)).contains(&n) {
            TypeTag::Int8
        } else if (f64::from(i16::MIN)..=f64::from(i16::MAX)).contains(&n) {
            TypeTag::Int16
        } else {
            TypeTag::Number
        }
    }
}

/// Bytes in front of a value's payload.
pub fn header_width(keyed: bool) -> usize {
    if keyed { 1 + KEY_WIDTH } else { 1 }
}

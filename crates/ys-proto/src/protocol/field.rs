//! Field descriptors and decoded field values.
//!
//! A [`FieldDescriptor`] says where one field lives inside a fixed-size
//! record: its byte offset, its width, how the bytes are interpreted and
//! whether the field carries meaning at all.  All multi-byte values are
//! little-endian.
//!
//! # Named fields versus placeholders (for beginners)
//!
//! The legacy wire format is a C struct copied straight out of memory.  Some
//! byte ranges in it have a known meaning (`fuel`, `heading`, ...) and some do
//! not: either the legacy authors never documented them (`u2`, `u3`, ...)
//! or the compiler inserted alignment padding.  We call the second group
//! *placeholders*.  The codec copies placeholder bytes verbatim so that a
//! packet decoded and then re-encoded comes out byte-for-byte identical, even
//! if a future protocol revision starts using those bytes.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How the bytes of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Two's-complement integer, 1, 2 or 4 bytes.
    SignedInt,
    /// Unsigned integer, 1, 2 or 4 bytes.
    UnsignedInt,
    /// IEEE-754 binary32, always 4 bytes.
    Float,
    /// Uninterpreted bytes of any non-zero width.
    RawBytes,
}

impl FieldType {
    /// Returns `true` if `width` is a legal width for this type.
    pub fn accepts_width(self, width: usize) -> bool {
        match self {
            FieldType::SignedInt | FieldType::UnsignedInt => matches!(width, 1 | 2 | 4),
            FieldType::Float => width == 4,
            FieldType::RawBytes => width > 0,
        }
    }
}

/// What a field means to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRole {
    /// A field with a known semantic label, decoded into a typed [`Value`].
    Named,
    /// An undocumented region of the legacy format, preserved verbatim.
    Reserved,
    /// Compiler alignment filler, also preserved verbatim.
    Padding,
}

/// Describes one field of a fixed-size record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Semantic label, as spelled in the legacy struct definition.
    pub name: &'static str,
    /// Byte offset from the start of the record.
    pub offset: usize,
    /// Width in bytes.
    pub width: usize,
    /// Interpretation of the bytes.
    pub ty: FieldType,
    /// Whether the field is named or a placeholder.
    pub role: FieldRole,
}

impl FieldDescriptor {
    /// A named signed integer field.
    pub const fn signed(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            offset,
            width,
            ty: FieldType::SignedInt,
            role: FieldRole::Named,
        }
    }

    /// A named unsigned integer field.
    pub const fn unsigned(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            offset,
            width,
            ty: FieldType::UnsignedInt,
            role: FieldRole::Named,
        }
    }

    /// A named 32-bit float field.
    pub const fn float(name: &'static str, offset: usize) -> Self {
        Self {
            name,
            offset,
            width: 4,
            ty: FieldType::Float,
            role: FieldRole::Named,
        }
    }

    /// A named field whose bytes are handed to the application uninterpreted.
    pub const fn bytes(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            offset,
            width,
            ty: FieldType::RawBytes,
            role: FieldRole::Named,
        }
    }

    /// An undocumented region that must survive a round-trip untouched.
    pub const fn reserved(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            offset,
            width,
            ty: FieldType::RawBytes,
            role: FieldRole::Reserved,
        }
    }

    /// Alignment filler inserted by the compiler of the legacy client.
    pub const fn padding(offset: usize, width: usize) -> Self {
        Self {
            name: "(pad)",
            offset,
            width,
            ty: FieldType::RawBytes,
            role: FieldRole::Padding,
        }
    }

    /// Returns `true` for reserved and padding regions.
    pub fn is_placeholder(&self) -> bool {
        !matches!(self.role, FieldRole::Named)
    }

    /// One past the last byte of the field, or `None` on overflow.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.width)
    }

    /// Byte range covered by the field.
    ///
    /// Only meaningful for descriptors that passed layout validation, which
    /// guarantees `offset + width` does not overflow.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset.saturating_add(self.width)
    }

    /// Returns `true` if the two fields share at least one byte.
    pub fn overlaps(&self, other: &FieldDescriptor) -> bool {
        let a = self.range();
        let b = other.range();
        a.start < b.end && b.start < a.end
    }
}

/// A decoded value of a named field.
///
/// Equality on [`Value::F32`] compares bit patterns, so a NaN read off the
/// wire still compares equal to itself after a round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    U8(u8),
    U16(u16),
    U32(u32),
    F32(f32),
    Bytes(Vec<u8>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// The field type this value encodes as.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::I8(_) | Value::I16(_) | Value::I32(_) => FieldType::SignedInt,
            Value::U8(_) | Value::U16(_) | Value::U32(_) => FieldType::UnsignedInt,
            Value::F32(_) => FieldType::Float,
            Value::Bytes(_) => FieldType::RawBytes,
        }
    }

    /// Encoded width in bytes.
    pub fn width(&self) -> usize {
        match self {
            Value::I8(_) | Value::U8(_) => 1,
            Value::I16(_) | Value::U16(_) => 2,
            Value::I32(_) | Value::U32(_) | Value::F32(_) => 4,
            Value::Bytes(b) => b.len(),
        }
    }

    /// Returns `true` if this value can be written into `field`.
    pub fn fits(&self, field: &FieldDescriptor) -> bool {
        self.field_type() == field.ty && self.width() == field.width
    }

    /// Interprets `bytes` as a little-endian value of type `ty`.
    ///
    /// Returns `None` if the slice length is not a legal width for `ty`.
    pub fn from_le_slice(ty: FieldType, bytes: &[u8]) -> Option<Value> {
        let value = match (ty, bytes) {
            (FieldType::SignedInt, &[a]) => Value::I8(i8::from_le_bytes([a])),
            (FieldType::SignedInt, &[a, b]) => Value::I16(i16::from_le_bytes([a, b])),
            (FieldType::SignedInt, &[a, b, c, d]) => Value::I32(i32::from_le_bytes([a, b, c, d])),
            (FieldType::UnsignedInt, &[a]) => Value::U8(a),
            (FieldType::UnsignedInt, &[a, b]) => Value::U16(u16::from_le_bytes([a, b])),
            (FieldType::UnsignedInt, &[a, b, c, d]) => {
                Value::U32(u32::from_le_bytes([a, b, c, d]))
            }
            (FieldType::Float, &[a, b, c, d]) => Value::F32(f32::from_le_bytes([a, b, c, d])),
            (FieldType::RawBytes, b) if !b.is_empty() => Value::Bytes(b.to_vec()),
            _ => return None,
        };
        Some(value)
    }

    /// Writes the little-endian representation into `out`.
    ///
    /// Returns `false` without touching `out` if the lengths differ.
    pub fn write_le(&self, out: &mut [u8]) -> bool {
        if out.len() != self.width() {
            return false;
        }
        match self {
            Value::I8(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::I16(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::I32(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::U8(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::U16(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::U32(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::F32(v) => out.copy_from_slice(&v.to_le_bytes()),
            Value::Bytes(b) => out.copy_from_slice(b),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths_are_one_two_or_four() {
        for ty in [FieldType::SignedInt, FieldType::UnsignedInt] {
            assert!(ty.accepts_width(1));
            assert!(ty.accepts_width(2));
            assert!(ty.accepts_width(4));
            assert!(!ty.accepts_width(0));
            assert!(!ty.accepts_width(3));
            assert!(!ty.accepts_width(8));
        }
    }

    #[test]
    fn test_float_width_is_four() {
        assert!(FieldType::Float.accepts_width(4));
        assert!(!FieldType::Float.accepts_width(2));
    }

    #[test]
    fn test_raw_bytes_accept_any_non_zero_width() {
        assert!(FieldType::RawBytes.accepts_width(1));
        assert!(FieldType::RawBytes.accepts_width(13));
        assert!(!FieldType::RawBytes.accepts_width(0));
    }

    #[test]
    fn test_placeholder_constructors_are_raw_bytes() {
        let reserved = FieldDescriptor::reserved("u2", 36, 8);
        let pad = FieldDescriptor::padding(10, 2);
        assert!(reserved.is_placeholder());
        assert!(pad.is_placeholder());
        assert_eq!(reserved.ty, FieldType::RawBytes);
        assert_eq!(pad.ty, FieldType::RawBytes);
        assert!(!FieldDescriptor::signed("fuel", 44, 2).is_placeholder());
    }

    #[test]
    fn test_end_detects_overflow() {
        let field = FieldDescriptor::reserved("huge", usize::MAX, 2);
        assert_eq!(field.end(), None);
        assert_eq!(FieldDescriptor::float("x", 12).end(), Some(16));
    }

    #[test]
    fn test_adjacent_fields_do_not_overlap() {
        let x = FieldDescriptor::float("x", 12);
        let z = FieldDescriptor::float("z", 16);
        assert!(!x.overlaps(&z));
        assert!(!z.overlaps(&x));
    }

    #[test]
    fn test_straddling_fields_overlap() {
        let x = FieldDescriptor::float("x", 12);
        let bad = FieldDescriptor::signed("bad", 14, 4);
        assert!(x.overlaps(&bad));
        assert!(bad.overlaps(&x));
    }

    #[test]
    fn test_signed_values_use_twos_complement() {
        assert_eq!(
            Value::from_le_slice(FieldType::SignedInt, &[0xFF]),
            Some(Value::I8(-1))
        );
        assert_eq!(
            Value::from_le_slice(FieldType::SignedInt, &[0x00, 0x80]),
            Some(Value::I16(i16::MIN))
        );
        assert_eq!(
            Value::from_le_slice(FieldType::UnsignedInt, &[0x00, 0x80]),
            Some(Value::U16(0x8000))
        );
    }

    #[test]
    fn test_float_is_ieee754_little_endian() {
        let bytes = 120.5f32.to_le_bytes();
        assert_eq!(
            Value::from_le_slice(FieldType::Float, &bytes),
            Some(Value::F32(120.5))
        );
    }

    #[test]
    fn test_illegal_slice_length_is_rejected() {
        assert_eq!(Value::from_le_slice(FieldType::SignedInt, &[1, 2, 3]), None);
        assert_eq!(Value::from_le_slice(FieldType::Float, &[1, 2]), None);
        assert_eq!(Value::from_le_slice(FieldType::RawBytes, &[]), None);
    }

    #[test]
    fn test_nan_compares_equal_to_itself_bitwise() {
        let nan = Value::F32(f32::from_bits(0x7FC0_0001));
        assert_eq!(nan, nan.clone());
        assert_ne!(Value::F32(0.0), Value::F32(-0.0));
    }

    #[test]
    fn test_write_le_refuses_wrong_length() {
        let mut out = [0u8; 4];
        assert!(!Value::I16(7).write_le(&mut out));
        assert_eq!(out, [0; 4]);
        assert!(Value::I32(7).write_le(&mut out));
        assert_eq!(out, [7, 0, 0, 0]);
    }

    #[test]
    fn test_value_fits_checks_type_and_width() {
        let fuel = FieldDescriptor::signed("fuel", 44, 2);
        assert!(Value::I16(10).fits(&fuel));
        assert!(!Value::U16(10).fits(&fuel));
        assert!(!Value::I32(10).fits(&fuel));
    }
}

//! Wire tags: the `(field_number, wire_type)` pair encoded as a single
//! varint at the start of every field.

use crate::error::DecodeError;

/// The 3-bit suffix of an encoded tag describing the shape of the payload
/// that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
#[repr(u8)]
pub enum WireType {
  Varint = 0,
  Fixed64 = 1,
  Delimited = 2,
  StartGroup = 3,
  EndGroup = 4,
  Fixed32 = 5,
}

impl WireType {
  /// Recovers a `WireType` from its raw 3-bit value, or `None` for the two
  /// values (6, 7) protobuf never assigns.
  #[inline]
  pub fn from_u8(v: u8) -> Option<WireType> {
    match v {
      0 => Some(WireType::Varint),
      1 => Some(WireType::Fixed64),
      2 => Some(WireType::Delimited),
      3 => Some(WireType::StartGroup),
      4 => Some(WireType::EndGroup),
      5 => Some(WireType::Fixed32),
      _ => None,
    }
  }

  #[inline]
  pub fn as_u8(self) -> u8 { self as u8 }
}

/// Smallest legal field number. Field `0` is reserved and never valid.
pub const MIN_FIELD_NUMBER: u32 = 1;
/// Largest field number a tag varint can carry while staying within the
/// standard 29-bit field-number space.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;
/// Field numbers in this range are reserved for implementation use and are
/// rejected by [`validate_field_number`].
pub const RESERVED_FIELD_RANGE: std::ops::RangeInclusive<u32> = 19000..=19999;

/// `tag = field_number * 8 + wire_type`.
///
/// Multiplication, not a shift, is used so the result stays correct and
/// stays within an unsigned 32-bit value even at `field_number = 2^29 - 1`.
#[inline]
pub fn make_tag(field_number: u32, wire_type: WireType) -> u32 {
  debug_assert!(field_number >= MIN_FIELD_NUMBER && field_number <= MAX_FIELD_NUMBER);
  field_number * 8 + wire_type.as_u8() as u32
}

/// Splits a decoded tag varint back into field number and wire type.
/// Returns `InvalidTag` for `wire_type > 5` or `field_number == 0`.
#[inline]
pub fn parse_tag(tag: u32) -> Result<(u32, WireType), DecodeError> {
  let field_number = tag >> 3;
  let wire_type = (tag & 0x7) as u8;
  let wire_type = WireType::from_u8(wire_type).ok_or(DecodeError::InvalidTag { tag })?;
  if field_number == 0 {
    return Err(DecodeError::InvalidTag { tag });
  }
  Ok((field_number, wire_type))
}

/// Whether `field_number` falls in the range reserved for internal use
/// (`[19000, 19999]`). Generated code is expected to call this at schema
/// validation time, not on the hot read/write path.
#[inline]
pub fn is_reserved_field_number(field_number: u32) -> bool {
  RESERVED_FIELD_RANGE.contains(&field_number)
}

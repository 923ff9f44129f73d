//! Error types for the decoder and encoder.
//!
//! Plain enums with hand-written `Display` and `Error` impls, no
//! `thiserror` macro.

use std::fmt;

/// Everything that can go wrong while decoding a byte stream.
///
/// Reaching any of these puts the [`crate::reader::Reader`] that produced it
/// into a terminal error state; there is no recovery, only reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
  /// The byte-source normalizer was given a representation it does not
  /// accept.
  InvalidInput { reason: &'static str },
  /// A tag's wire type was greater than 5, or its field number was zero.
  InvalidTag { tag: u32 },
  /// A varint ran past 10 bytes without a terminating byte, or the stream
  /// ended mid-varint.
  InvalidVarint,
  /// A length prefix decoded to a negative number.
  NegativeLength { raw: i64 },
  /// A read would move the cursor past the current `end`.
  ReadPastEnd { cursor: usize, end: usize, width: usize },
  /// A sub-message's declared length did not match the bytes its handler
  /// actually consumed.
  MessageLengthMismatch { expected_end: usize, actual_end: usize },
  /// The stream ended while a group was still open.
  UnmatchedStartGroupEof { field_number: u32 },
  /// An `END_GROUP` tag appeared with no matching open `START_GROUP`.
  UnmatchedEndGroup { field_number: u32 },
  /// A group's handler returned without consuming its `END_GROUP` tag.
  GroupDidNotEnd { field_number: u32 },
  /// Message-set parsing failed one of its structural invariants.
  MalformedMessageSet { reason: &'static str },
  /// A typed read's wire type did not match the tag's wire type.
  WireTypeMismatch { field_number: u32, expected: crate::tag::WireType, actual: crate::tag::WireType },
}

impl fmt::Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      DecodeError::InvalidInput { reason } => write!(f, "invalid byte-source input: {reason}"),
      DecodeError::InvalidTag { tag } => write!(f, "invalid tag {tag}"),
      DecodeError::InvalidVarint => write!(f, "malformed varint"),
      DecodeError::NegativeLength { raw } => write!(f, "negative length prefix: {raw}"),
      DecodeError::ReadPastEnd { cursor, end, width } => {
        write!(f, "read of {width} bytes at {cursor} would pass end {end}")
      }
      DecodeError::MessageLengthMismatch { expected_end, actual_end } => write!(
        f,
        "sub-message length mismatch: expected to end at {expected_end}, handler left cursor at {actual_end}"
      ),
      DecodeError::UnmatchedStartGroupEof { field_number } => {
        write!(f, "stream ended inside group (field {field_number})")
      }
      DecodeError::UnmatchedEndGroup { field_number } => {
        write!(f, "end_group tag for field {field_number} has no matching start_group")
      }
      DecodeError::GroupDidNotEnd { field_number } => {
        write!(f, "group handler for field {field_number} returned without consuming end_group")
      }
      DecodeError::MalformedMessageSet { reason } => write!(f, "malformed message set: {reason}"),
      DecodeError::WireTypeMismatch { field_number, expected, actual } => write!(
        f,
        "field {field_number}: expected wire type {expected:?}, found {actual:?}"
      ),
    }
  }
}

impl std::error::Error for DecodeError {}

/// Programmer errors surfaced by the field-aware [`crate::writer::Writer`].
///
/// These indicate a misuse of the writer's own API, not malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
  /// `end_group(field)` was called with a field number that does not match
  /// the innermost open `begin_group`.
  MismatchedEndGroup { expected: u32, actual: u32 },
  /// `into_inner` (or an equivalent top-level end) was called while one or
  /// more `begin_sub_message`/`begin_group` frames were still open.
  UnclosedFrame { depth: usize },
}

impl fmt::Display for EncodeError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      EncodeError::MismatchedEndGroup { expected, actual } => {
        write!(f, "end_group({actual}) does not match open begin_group({expected})")
      }
      EncodeError::UnclosedFrame { depth } => {
        write!(f, "{depth} sub-message/group frame(s) still open at end of writing")
      }
    }
  }
}

impl std::error::Error for EncodeError {}

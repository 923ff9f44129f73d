//! Field-aware writer (C6): wraps the low-level [`Encoder`] with tagging,
//! length-delimited sub-message/packed-repeated framing, and groups.

use crate::encode::Encoder;
use crate::error::EncodeError;
use crate::split64::Split64;
use crate::tag::{make_tag, WireType};

enum Frame {
  /// An open `begin_sub_message`/`begin_packed` frame: the buffer position
  /// where its payload started, to be backfilled with a length varint on
  /// close.
  Length { pos: usize },
  /// An open `begin_group` frame.
  Group { field_number: u32 },
}

/// Writes a single protobuf message (or a standalone stream of fields) into
/// an internal buffer.
///
/// A `Writer` is a single-use value: build one, issue writes in field
/// order, then call [`Writer::into_inner`] to take the finished bytes. It
/// has no notion of a particular message schema; callers (or generated
/// code built on top of it) decide which field number and wire type to use
/// for each value.
pub struct Writer {
  enc: Encoder,
  pending: Vec<Frame>,
}

impl Default for Writer {
  fn default() -> Writer { Writer::new() }
}

impl Writer {
  pub fn new() -> Writer { Writer { enc: Encoder::new(), pending: Vec::new() } }

  #[inline]
  pub fn len(&self) -> usize { self.enc.len() }
  #[inline]
  pub fn is_empty(&self) -> bool { self.enc.is_empty() }

  /// Transfers ownership of the written bytes to the caller and resets this
  /// writer to empty, in one step. Fails if a `begin_sub_message`,
  /// `begin_packed`, or `begin_group` frame was never closed.
  pub fn into_inner(&mut self) -> Result<Vec<u8>, EncodeError> {
    if !self.pending.is_empty() {
      return Err(EncodeError::UnclosedFrame { depth: self.pending.len() });
    }
    Ok(self.enc.into_inner())
  }

  fn write_tag(&mut self, field_number: u32, wire_type: WireType) {
    self.enc.write_varint32(make_tag(field_number, wire_type));
  }

  pub fn write_varint32_field(&mut self, field_number: u32, v: u32) {
    self.write_tag(field_number, WireType::Varint);
    self.enc.write_varint32(v);
  }

  pub fn write_signed_varint32_field(&mut self, field_number: u32, v: i32) {
    self.write_tag(field_number, WireType::Varint);
    self.enc.write_signed_varint32(v);
  }

  pub fn write_varint64_field(&mut self, field_number: u32, pair: Split64) {
    self.write_tag(field_number, WireType::Varint);
    self.enc.write_varint64(pair);
  }

  pub fn write_enum_field(&mut self, field_number: u32, v: i32) {
    self.write_signed_varint32_field(field_number, v);
  }

  pub fn write_bool_field(&mut self, field_number: u32, v: bool) {
    self.write_tag(field_number, WireType::Varint);
    self.enc.write_bool(v);
  }

  pub fn write_fixed32_field(&mut self, field_number: u32, v: u32) {
    self.write_tag(field_number, WireType::Fixed32);
    self.enc.write_fixed32(v);
  }

  pub fn write_fixed64_field(&mut self, field_number: u32, pair: Split64) {
    self.write_tag(field_number, WireType::Fixed64);
    self.enc.write_fixed64(pair);
  }

  pub fn write_float_field(&mut self, field_number: u32, v: f32) {
    self.write_tag(field_number, WireType::Fixed32);
    self.enc.write_float(v);
  }

  pub fn write_double_field(&mut self, field_number: u32, v: f64) {
    self.write_tag(field_number, WireType::Fixed64);
    self.enc.write_double(v);
  }

  /// Writes a length-delimited byte field in one call. Unlike
  /// [`Writer::begin_sub_message`], the length is known up front, so no
  /// splice is needed.
  pub fn write_bytes_field(&mut self, field_number: u32, data: &[u8]) {
    self.write_tag(field_number, WireType::Delimited);
    self.enc.write_varint32(data.len() as u32);
    self.enc.write_bytes(data);
  }

  pub fn write_str_field(&mut self, field_number: u32, s: &str) {
    self.write_bytes_field(field_number, s.as_bytes());
  }

  /// Writes a sub-message's tag and opens a length-delimited frame. Callers
  /// write the sub-message's own fields directly against `self`, then call
  /// [`Writer::end_sub_message`].
  pub fn begin_sub_message(&mut self, field_number: u32) {
    self.write_tag(field_number, WireType::Delimited);
    self.pending.push(Frame::Length { pos: self.enc.len() });
  }

  /// Closes the innermost open sub-message frame, backfilling its length
  /// varint at the position recorded by `begin_sub_message`.
  pub fn end_sub_message(&mut self) {
    match self.pending.pop() {
      Some(Frame::Length { pos }) => {
        let payload_len = self.enc.len() - pos;
        self.enc.splice_varint_at(pos, payload_len as u32);
      }
      other => {
        debug_assert!(false, "end_sub_message with no matching begin_sub_message frame open");
        if let Some(frame) = other {
          self.pending.push(frame);
        }
      }
    }
  }

  /// A packed repeated field shares sub-message framing; elements are
  /// written without their own tags between `begin_packed`/`end_packed`.
  #[inline]
  pub fn begin_packed(&mut self, field_number: u32) { self.begin_sub_message(field_number); }
  #[inline]
  pub fn end_packed(&mut self) { self.end_sub_message(); }

  pub fn begin_group(&mut self, field_number: u32) {
    self.write_tag(field_number, WireType::StartGroup);
    self.pending.push(Frame::Group { field_number });
  }

  /// Closes the innermost open group. `field_number` must match the one
  /// passed to the corresponding `begin_group`; a mismatch is a programmer
  /// error, reported rather than silently corrected.
  pub fn end_group(&mut self, field_number: u32) -> Result<(), EncodeError> {
    match self.pending.pop() {
      Some(Frame::Group { field_number: expected }) if expected == field_number => {
        self.write_tag(field_number, WireType::EndGroup);
        Ok(())
      }
      Some(Frame::Group { field_number: expected }) => {
        self.pending.push(Frame::Group { field_number: expected });
        Err(EncodeError::MismatchedEndGroup { expected, actual: field_number })
      }
      other => {
        if let Some(frame) = other {
          self.pending.push(frame);
        }
        Err(EncodeError::MismatchedEndGroup { expected: 0, actual: field_number })
      }
    }
  }
}

impl Drop for Writer {
  fn drop(&mut self) {
    // A writer dropped mid-frame leaves its buffer content undefined; in a
    // debug build, surface the programmer error loudly instead of
    // producing a silently corrupt buffer.
    debug_assert!(self.pending.is_empty(), "Writer dropped with {} frame(s) still open", self.pending.len());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(" ")
  }

  #[test]
  fn writes_varint_field_with_tag() {
    let mut w = Writer::new();
    w.write_varint32_field(1, 150);
    // tag = 1*8+0 = 0x08, then varint(150) = 96 01
    assert_eq!(hex(&w.into_inner().unwrap()), "08 96 01");
  }

  #[test]
  fn writes_string_field() {
    let mut w = Writer::new();
    w.write_str_field(2, "testing");
    // tag = 2*8+2 = 0x12, len=7, then ascii bytes
    assert_eq!(hex(&w.into_inner().unwrap()), "12 07 74 65 73 74 69 6E 67");
  }

  #[test]
  fn sub_message_framing_backfills_length() {
    let mut w = Writer::new();
    w.begin_sub_message(3);
    w.write_varint32_field(1, 5);
    w.end_sub_message();
    let bytes = w.into_inner().unwrap();
    // tag(3, DELIMITED) = 3*8+2 = 26 = 0x1A, length = 2, payload = 08 05
    assert_eq!(hex(&bytes), "1A 02 08 05");
  }

  #[test]
  fn nested_sub_messages_splice_independently() {
    let mut w = Writer::new();
    w.begin_sub_message(1);
    w.begin_sub_message(2);
    w.write_varint32_field(1, 42);
    w.end_sub_message();
    w.end_sub_message();
    let bytes = w.into_inner().unwrap();

    let mut r = crate::reader::Reader::new(&bytes);
    assert!(r.next_field().unwrap());
    assert_eq!(r.field_number(), 1);
    let inner_bytes = r.read_bytes().unwrap().to_vec();
    let mut inner = crate::reader::Reader::new(&inner_bytes);
    assert!(inner.next_field().unwrap());
    assert_eq!(inner.field_number(), 2);
    let innermost_bytes = inner.read_bytes().unwrap().to_vec();
    let mut innermost = crate::reader::Reader::new(&innermost_bytes);
    assert!(innermost.next_field().unwrap());
    assert_eq!(innermost.read_varint32().unwrap(), 42);
  }

  #[test]
  fn groups_round_trip() {
    let mut w = Writer::new();
    w.begin_group(5);
    w.write_varint32_field(1, 7);
    w.end_group(5).unwrap();
    let bytes = w.into_inner().unwrap();

    let mut r = crate::reader::Reader::new(&bytes);
    assert!(r.next_field().unwrap());
    assert_eq!(r.field_number(), 5);
    let mut seen = None;
    r.read_group(5, |inner| {
      while inner.next_field()? {
        seen = Some(inner.read_varint32()?);
      }
      Ok(())
    })
    .unwrap();
    assert_eq!(seen, Some(7));
  }

  #[test]
  fn mismatched_end_group_is_reported() {
    let mut w = Writer::new();
    w.begin_group(5);
    let err = w.end_group(6).unwrap_err();
    assert_eq!(err, EncodeError::MismatchedEndGroup { expected: 5, actual: 6 });
    // close it correctly so Drop doesn't trip its debug assertion.
    w.end_group(5).unwrap();
  }

  #[test]
  fn unclosed_frame_is_reported_at_drain() {
    let mut w = Writer::new();
    w.begin_sub_message(1);
    assert_eq!(w.into_inner(), Err(EncodeError::UnclosedFrame { depth: 1 }));
    w.end_sub_message();
  }
}

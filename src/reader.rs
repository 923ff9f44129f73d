//! Field-aware reader (C7): wraps the low-level [`Decoder`] with a
//! field-iteration state machine, wire-type checking, sub-message/group
//! bounds, and skip dispatch.

use crate::decode::Decoder;
use crate::error::DecodeError;
use crate::split64::{join_float64, Split64};
use crate::tag::{parse_tag, WireType};
use crate::zigzag::{from_zigzag32, from_zigzag64};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Init,
  HasTag,
  Done,
  Error,
}

/// Walks a byte buffer field by field.
///
/// ```text
///           +--- next_field true ---> HasTag ---+
/// Init ---->+                                   |
///           +--- next_field false --> Done       |
///                                               \
///             typed_read / skip / read_sub / read_group
///                              |
///                              v
///                           Init
/// ```
///
/// Any read operation from `HasTag` returns to `Init`. Reaching `Error` from
/// any state is terminal; every subsequent call returns the same error.
pub struct Reader<'a> {
  dec: Decoder<'a>,
  state: State,
  field_number: u32,
  wire_type: WireType,
  field_start_cursor: usize,
  /// Field numbers of groups currently open, innermost last. Shared between
  /// [`Reader::read_group`] and [`Reader::skip_field`]'s group-skipping
  /// path so both recognize the same matching `END_GROUP`.
  group_stack: Vec<u32>,
  /// Set by `next_field` when it silently consumes an `END_GROUP` tag that
  /// closes the top of `group_stack`; consumed by whichever of
  /// `read_group`/internal skip pushed that frame.
  last_closed_group: Option<u32>,
  last_error: Option<DecodeError>,
}

impl<'a> Reader<'a> {
  pub fn new(bytes: &'a [u8]) -> Reader<'a> {
    Reader {
      dec: Decoder::new(bytes),
      state: State::Init,
      field_number: 0,
      wire_type: WireType::Varint,
      field_start_cursor: 0,
      group_stack: Vec::new(),
      last_closed_group: None,
      last_error: None,
    }
  }

  #[inline]
  pub fn field_number(&self) -> u32 { self.field_number }
  #[inline]
  pub fn wire_type(&self) -> WireType { self.wire_type }
  #[inline]
  pub fn cursor(&self) -> usize { self.dec.cursor() }

  fn check_ok(&self) -> Result<(), DecodeError> {
    match &self.last_error {
      Some(e) => Err(e.clone()),
      None => Ok(()),
    }
  }

  fn fail(&mut self, e: DecodeError) -> DecodeError {
    self.last_error = Some(e.clone());
    self.state = State::Error;
    e
  }

  /// Returns `true` and exposes the next field's number/wire type, or
  /// `false` when the buffer (or, inside a group, the matching `END_GROUP`)
  /// has been reached.
  pub fn next_field(&mut self) -> Result<bool, DecodeError> {
    self.check_ok()?;
    loop {
      if !self.dec.has_remaining() {
        if let Some(&open) = self.group_stack.last() {
          return Err(self.fail(DecodeError::UnmatchedStartGroupEof { field_number: open }));
        }
        self.state = State::Done;
        return Ok(false);
      }
      self.field_start_cursor = self.dec.cursor();
      let tag = match self.dec.read_varint32() {
        Ok(t) => t,
        Err(e) => return Err(self.fail(e)),
      };
      let (field_number, wire_type) = match parse_tag(tag) {
        Ok(parsed) => parsed,
        Err(e) => return Err(self.fail(e)),
      };
      if wire_type == WireType::EndGroup {
        match self.group_stack.last() {
          Some(&open) if open == field_number => {
            self.group_stack.pop();
            self.last_closed_group = Some(field_number);
            self.state = State::Init;
            return Ok(false);
          }
          _ => return Err(self.fail(DecodeError::UnmatchedEndGroup { field_number })),
        }
      }
      self.field_number = field_number;
      self.wire_type = wire_type;
      self.state = State::HasTag;
      return Ok(true);
    }
  }

  fn assert_wire_type(&mut self, expected: WireType) -> Result<(), DecodeError> {
    self.check_ok()?;
    if self.wire_type != expected {
      return Err(self.fail(DecodeError::WireTypeMismatch {
        field_number: self.field_number,
        expected,
        actual: self.wire_type,
      }));
    }
    Ok(())
  }

  pub fn read_varint32(&mut self) -> Result<u32, DecodeError> {
    self.assert_wire_type(WireType::Varint)?;
    let v = self.dec.read_varint32().map_err(|e| self.fail(e))?;
    self.state = State::Init;
    Ok(v)
  }

  pub fn read_varint64(&mut self) -> Result<Split64, DecodeError> {
    self.assert_wire_type(WireType::Varint)?;
    let v = self.dec.read_varint64().map_err(|e| self.fail(e))?;
    self.state = State::Init;
    Ok(v)
  }

  #[inline]
  pub fn read_int32(&mut self) -> Result<i32, DecodeError> { Ok(self.read_varint32()? as i32) }
  #[inline]
  pub fn read_int64(&mut self) -> Result<i64, DecodeError> { Ok(self.read_varint64()?.to_i64()) }
  #[inline]
  pub fn read_uint64(&mut self) -> Result<u64, DecodeError> { Ok(self.read_varint64()?.to_u64()) }
  #[inline]
  pub fn read_sint32(&mut self) -> Result<i32, DecodeError> { Ok(from_zigzag32(self.read_varint32()?)) }
  #[inline]
  pub fn read_sint64(&mut self) -> Result<i64, DecodeError> {
    Ok(from_zigzag64(self.read_varint64()?).to_i64())
  }
  #[inline]
  pub fn read_bool(&mut self) -> Result<bool, DecodeError> { Ok(self.read_varint32()? != 0) }
  #[inline]
  pub fn read_enum(&mut self) -> Result<i32, DecodeError> { self.read_int32() }

  pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
    self.assert_wire_type(WireType::Fixed32)?;
    let v = self.dec.read_fixed32().map_err(|e| self.fail(e))?;
    self.state = State::Init;
    Ok(v)
  }

  pub fn read_fixed64(&mut self) -> Result<Split64, DecodeError> {
    self.assert_wire_type(WireType::Fixed64)?;
    let v = self.dec.read_fixed64().map_err(|e| self.fail(e))?;
    self.state = State::Init;
    Ok(v)
  }

  #[inline]
  pub fn read_float(&mut self) -> Result<f32, DecodeError> { Ok(f32::from_bits(self.read_fixed32()?)) }
  #[inline]
  pub fn read_double(&mut self) -> Result<f64, DecodeError> { Ok(join_float64(self.read_fixed64()?)) }

  pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
    self.assert_wire_type(WireType::Delimited)?;
    let v = self.dec.read_bytes().map_err(|e| self.fail(e))?;
    self.state = State::Init;
    Ok(v)
  }

  pub fn read_str(&mut self) -> Result<&'a str, DecodeError> {
    self.assert_wire_type(WireType::Delimited)?;
    let v = self.dec.read_str().map_err(|e| self.fail(e))?;
    self.state = State::Init;
    Ok(v)
  }

  /// Descends into a length-delimited sub-message. `handler` is handed a
  /// `Reader` bounded to exactly the sub-message's payload and must iterate
  /// it to exhaustion (via its own `next_field` loop); afterward the outer
  /// bound is restored regardless of the handler's outcome.
  pub fn read_sub_message<F>(&mut self, handler: F) -> Result<(), DecodeError>
  where
    F: FnOnce(&mut Reader<'a>) -> Result<(), DecodeError>,
  {
    self.assert_wire_type(WireType::Delimited)?;
    let len = self.dec.read_length().map_err(|e| self.fail(e))?;
    let outer_end = self.dec.end();
    let sub_end = self.dec.cursor() + len;
    if sub_end > outer_end {
      return Err(self.fail(DecodeError::MessageLengthMismatch { expected_end: sub_end, actual_end: outer_end }));
    }
    self.dec.set_end(sub_end);
    self.state = State::Init;
    let result = handler(self);
    let actual_end = self.dec.cursor();
    self.dec.set_end(outer_end);
    match result {
      Ok(()) if actual_end == sub_end => Ok(()),
      Ok(()) => Err(self.fail(DecodeError::MessageLengthMismatch { expected_end: sub_end, actual_end })),
      Err(e) => Err(self.fail(e)),
    }
  }

  /// Descends into a legacy group. The current field must be the group's
  /// `START_GROUP` tag (already exposed by `next_field`). `handler` must
  /// loop its own `next_field` until the matching `END_GROUP` is silently
  /// consumed (signaled by `next_field` returning `Ok(false)`); returning
  /// before that point is reported as [`DecodeError::GroupDidNotEnd`].
  pub fn read_group<F>(&mut self, field_number: u32, handler: F) -> Result<(), DecodeError>
  where
    F: FnOnce(&mut Reader<'a>) -> Result<(), DecodeError>,
  {
    self.assert_wire_type(WireType::StartGroup)?;
    self.state = State::Init;
    self.group_stack.push(field_number);
    let depth_before = self.group_stack.len();
    let result = handler(self);
    match result {
      Ok(()) if self.group_stack.len() + 1 == depth_before && self.last_closed_group == Some(field_number) => {
        self.last_closed_group = None;
        Ok(())
      }
      Ok(()) => {
        self.group_stack.truncate(depth_before - 1);
        Err(self.fail(DecodeError::GroupDidNotEnd { field_number }))
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  fn skip_group(&mut self, field_number: u32) -> Result<(), DecodeError> {
    self.group_stack.push(field_number);
    loop {
      match self.next_field() {
        Ok(true) => {
          self.skip_field()?;
        }
        Ok(false) => {
          return if self.last_closed_group == Some(field_number) {
            self.last_closed_group = None;
            Ok(())
          } else {
            Err(self.fail(DecodeError::GroupDidNotEnd { field_number }))
          };
        }
        Err(e) => return Err(e),
      }
    }
  }

  /// Advances past the current field's payload without interpreting it,
  /// dispatching purely on wire type, and returns the exact
  /// `[field_start_cursor, cursor_after_skip)` byte range so callers can
  /// preserve unknown fields verbatim.
  pub fn skip_field(&mut self) -> Result<&'a [u8], DecodeError> {
    self.check_ok()?;
    debug_assert_eq!(self.state, State::HasTag, "skip_field called with no current field");
    let start = self.field_start_cursor;
    match self.wire_type {
      WireType::Varint => self.dec.skip_varint().map_err(|e| self.fail(e))?,
      WireType::Fixed32 => self.dec.skip_fixed32().map_err(|e| self.fail(e))?,
      WireType::Fixed64 => self.dec.skip_fixed64().map_err(|e| self.fail(e))?,
      WireType::Delimited => self.dec.skip_delimited().map_err(|e| self.fail(e))?,
      WireType::StartGroup => {
        let field = self.field_number;
        self.state = State::Init;
        self.skip_group(field)?;
      }
      WireType::EndGroup => {
        return Err(self.fail(DecodeError::UnmatchedEndGroup { field_number: self.field_number }));
      }
    }
    self.state = State::Init;
    Ok(self.dec.raw_slice(start, self.dec.cursor()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::writer::Writer;

  #[test]
  fn read_int32_field_value_150() {
    let buf = [0x08, 0x96, 0x01];
    let mut r = Reader::new(&buf);
    assert!(r.next_field().unwrap());
    assert_eq!(r.field_number(), 1);
    assert_eq!(r.wire_type(), WireType::Varint);
    assert_eq!(r.read_int32().unwrap(), 150);
    assert!(!r.next_field().unwrap());
  }

  #[test]
  fn read_string_field() {
    let buf = [0x12, 0x07, b't', b'e', b's', b't', b'i', b'n', b'g'];
    let mut r = Reader::new(&buf);
    assert!(r.next_field().unwrap());
    assert_eq!(r.field_number(), 2);
    assert_eq!(r.read_str().unwrap(), "testing");
  }

  #[test]
  fn wire_type_mismatch_is_reported() {
    let buf = [0x08, 0x01]; // field 1, VARINT
    let mut r = Reader::new(&buf);
    assert!(r.next_field().unwrap());
    let err = r.read_fixed32().unwrap_err();
    assert!(matches!(err, DecodeError::WireTypeMismatch { .. }));
  }

  #[test]
  fn sub_message_descent_and_containment() {
    let mut w = Writer::new();
    w.begin_sub_message(1);
    w.write_varint32_field(1, 5);
    w.write_str_field(2, "hi");
    w.end_sub_message();
    let bytes = w.into_inner().unwrap();

    let mut r = Reader::new(&bytes);
    assert!(r.next_field().unwrap());
    let mut seen_int = None;
    let mut seen_str = None;
    r.read_sub_message(|inner| {
      while inner.next_field()? {
        match inner.field_number() {
          1 => seen_int = Some(inner.read_int32()?),
          2 => seen_str = Some(inner.read_str()?.to_string()),
          _ => {
            inner.skip_field()?;
          }
        }
      }
      Ok(())
    })
    .unwrap();
    assert_eq!(seen_int, Some(5));
    assert_eq!(seen_str, Some("hi".to_string()));
    assert!(!r.next_field().unwrap());
  }

  #[test]
  fn sub_message_incomplete_handler_is_length_mismatch() {
    let mut w = Writer::new();
    w.begin_sub_message(1);
    w.write_varint32_field(1, 5);
    w.write_varint32_field(2, 6);
    w.end_sub_message();
    let bytes = w.into_inner().unwrap();

    let mut r = Reader::new(&bytes);
    assert!(r.next_field().unwrap());
    let err = r
      .read_sub_message(|inner| {
        // only consume the first field, leaving the second unread
        assert!(inner.next_field()?);
        inner.read_int32()?;
        Ok(())
      })
      .unwrap_err();
    assert!(matches!(err, DecodeError::MessageLengthMismatch { .. }));
  }

  #[test]
  fn nested_groups_sharing_a_field_number_are_legal() {
    let mut w = Writer::new();
    w.begin_group(5);
    w.begin_group(5);
    w.write_varint32_field(1, 42);
    w.end_group(5).unwrap();
    w.end_group(5).unwrap();
    let bytes = w.into_inner().unwrap();

    let mut r = Reader::new(&bytes);
    assert!(r.next_field().unwrap());
    let mut innermost_value = None;
    r.read_group(5, |outer| {
      while outer.next_field()? {
        if outer.wire_type() == WireType::StartGroup {
          let inner_field = outer.field_number();
          outer.read_group(inner_field, |inner| {
            while inner.next_field()? {
              if inner.field_number() == 1 {
                innermost_value = Some(inner.read_int32()?);
              } else {
                inner.skip_field()?;
              }
            }
            Ok(())
          })?;
        } else {
          outer.skip_field()?;
        }
      }
      Ok(())
    })
    .unwrap();
    assert_eq!(innermost_value, Some(42));
    assert!(!r.next_field().unwrap());
  }

  #[test]
  fn unmatched_end_group_is_reported() {
    // A lone END_GROUP tag for field 9 (tag = 9*8+4 = 76) with no open group.
    let buf = [76u8];
    let mut r = Reader::new(&buf);
    let err = r.next_field().unwrap_err();
    assert!(matches!(err, DecodeError::UnmatchedEndGroup { field_number: 9 }));
  }

  #[test]
  fn group_eof_without_end_is_reported() {
    let buf = [0x2B]; // tag for field 5, START_GROUP (5*8+3 = 43 = 0x2B)
    let mut r = Reader::new(&buf);
    assert!(r.next_field().unwrap());
    let err = r.read_group(5, |inner| {
      assert!(!inner.next_field()?);
      Ok(())
    });
    assert!(matches!(err, Err(DecodeError::UnmatchedStartGroupEof { field_number: 5 })));
  }

  #[test]
  fn skip_field_returns_exact_byte_range() {
    let mut w = Writer::new();
    w.write_varint32_field(9, 1234);
    w.write_str_field(1, "kept");
    let bytes = w.into_inner().unwrap();

    let mut r = Reader::new(&bytes);
    assert!(r.next_field().unwrap());
    assert_eq!(r.field_number(), 9);
    let raw = r.skip_field().unwrap().to_vec();

    // Replaying the captured range through a fresh reader reproduces the
    // same field.
    let mut replay = Reader::new(&raw);
    assert!(replay.next_field().unwrap());
    assert_eq!(replay.field_number(), 9);
    assert_eq!(replay.read_int32().unwrap(), 1234);

    assert!(r.next_field().unwrap());
    assert_eq!(r.field_number(), 1);
    assert_eq!(r.read_str().unwrap(), "kept");
  }

  #[test]
  fn skip_field_over_a_group_returns_the_whole_group_range() {
    let mut w = Writer::new();
    w.begin_group(9);
    w.write_varint32_field(1, 42);
    w.end_group(9).unwrap();
    w.write_str_field(1, "kept");
    let bytes = w.into_inner().unwrap();

    let mut r = Reader::new(&bytes);
    assert!(r.next_field().unwrap());
    assert_eq!(r.field_number(), 9);
    assert_eq!(r.wire_type(), WireType::StartGroup);
    let raw = r.skip_field().unwrap().to_vec();

    // The captured range spans the START_GROUP tag through the matching
    // END_GROUP tag, not just the trailing END_GROUP byte.
    let mut replay = Reader::new(&raw);
    assert!(replay.next_field().unwrap());
    assert_eq!(replay.field_number(), 9);
    let mut seen = None;
    replay
      .read_group(9, |inner| {
        while inner.next_field()? {
          seen = Some(inner.read_int32()?);
        }
        Ok(())
      })
      .unwrap();
    assert_eq!(seen, Some(42));

    assert!(r.next_field().unwrap());
    assert_eq!(r.field_number(), 1);
    assert_eq!(r.read_str().unwrap(), "kept");
  }

  #[test]
  fn error_state_is_sticky() {
    let buf = [0x08, 0x01];
    let mut r = Reader::new(&buf);
    assert!(r.next_field().unwrap());
    let first = r.read_fixed32().unwrap_err();
    let second = r.next_field().unwrap_err();
    assert_eq!(first, second);
  }
}

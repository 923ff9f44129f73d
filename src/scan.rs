//! Single-pass scan counters.
//!
//! These let a reader size a repeated-field array in one pass over a
//! contiguous run of same-field, same-wire-type entries before a second
//! pass actually populates it, without ever materializing the values
//! themselves.

use crate::decode::Decoder;
use crate::tag::{make_tag, WireType};

/// Counts varints in `buf[start..end]` without decoding any of them, using
/// the identity that every varint's non-terminal bytes (and no others) have
/// their continuation bit set: `count = (end - start) - continuation_bytes`.
pub fn count_varints(buf: &[u8], start: usize, end: usize) -> usize {
  let continuation_bytes: usize = buf[start..end].iter().map(|&b| (b >> 7) as usize).sum();
  (end - start) - continuation_bytes
}

/// Counts the number of contiguous `(field, VARINT)` entries starting at
/// `start`, stopping at the first tag that doesn't match.
pub fn count_varint_fields(buf: &[u8], start: usize, end: usize, field: u32) -> usize {
  let expected = make_tag(field, WireType::Varint);
  let mut d = Decoder::new(&buf[start..end]);
  let mut count = 0;
  while d.has_remaining() {
    let tag = match d.read_varint32() {
      Ok(t) => t,
      Err(_) => break,
    };
    if tag != expected || d.skip_varint().is_err() {
      break;
    }
    count += 1;
  }
  count
}

/// Counts the number of contiguous `(field, FIXED32)` entries starting at
/// `start`.
pub fn count_fixed32_fields(buf: &[u8], start: usize, end: usize, field: u32) -> usize {
  let expected = make_tag(field, WireType::Fixed32);
  let mut d = Decoder::new(&buf[start..end]);
  let mut count = 0;
  while d.has_remaining() {
    let tag = match d.read_varint32() {
      Ok(t) => t,
      Err(_) => break,
    };
    if tag != expected || d.skip_fixed32().is_err() {
      break;
    }
    count += 1;
  }
  count
}

/// Counts the number of contiguous `(field, FIXED64)` entries starting at
/// `start`.
pub fn count_fixed64_fields(buf: &[u8], start: usize, end: usize, field: u32) -> usize {
  let expected = make_tag(field, WireType::Fixed64);
  let mut d = Decoder::new(&buf[start..end]);
  let mut count = 0;
  while d.has_remaining() {
    let tag = match d.read_varint32() {
      Ok(t) => t,
      Err(_) => break,
    };
    if tag != expected || d.skip_fixed64().is_err() {
      break;
    }
    count += 1;
  }
  count
}

/// Counts the number of contiguous `(field, DELIMITED)` entries starting at
/// `start`.
pub fn count_delimited_fields(buf: &[u8], start: usize, end: usize, field: u32) -> usize {
  let expected = make_tag(field, WireType::Delimited);
  let mut d = Decoder::new(&buf[start..end]);
  let mut count = 0;
  while d.has_remaining() {
    let tag = match d.read_varint32() {
      Ok(t) => t,
      Err(_) => break,
    };
    if tag != expected || d.skip_delimited().is_err() {
      break;
    }
    count += 1;
  }
  count
}

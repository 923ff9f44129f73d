//! Low-level, append-only byte encoder.
//!
//! This has no notion of fields or tags, only how to append typed values to
//! a growing buffer. [`crate::writer::Writer`] layers field awareness and
//! length-delimited framing on top of it.

use crate::split64::{split_float32, split_float64, Split64};

/// Values larger than this are copied in bounded chunks rather than one
/// `extend_from_slice` call, matching the bulk-copy convention most wire
/// encoders use to keep a single append bounded in cost.
const BULK_COPY_CHUNK: usize = 8 * 1024;

/// An append-only byte buffer with typed write primitives.
#[derive(Debug, Default)]
pub struct Encoder {
  buf: Vec<u8>,
}

impl Encoder {
  pub fn new() -> Encoder { Encoder { buf: Vec::new() } }

  pub fn with_capacity(capacity: usize) -> Encoder { Encoder { buf: Vec::with_capacity(capacity) } }

  /// Current length of the buffer, i.e. the position the next write will
  /// land at.
  #[inline]
  pub fn len(&self) -> usize { self.buf.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.buf.is_empty() }

  #[inline]
  pub fn as_slice(&self) -> &[u8] { &self.buf }

  /// Transfers ownership of the accumulated bytes to the caller and resets
  /// this encoder to empty, in one step.
  pub fn into_inner(&mut self) -> Vec<u8> { std::mem::take(&mut self.buf) }

  #[inline]
  pub fn write_byte(&mut self, b: u8) { self.buf.push(b); }

  /// Appends `data` verbatim.
  pub fn write_bytes(&mut self, data: &[u8]) {
    for chunk in data.chunks(BULK_COPY_CHUNK) {
      self.buf.extend_from_slice(chunk);
    }
  }

  /// Splices a varint encoding of `value` into the buffer at `pos`,
  /// shifting everything already at or after `pos` to the right. Used by
  /// the field-aware writer to backfill a sub-message length after its
  /// payload has been written.
  pub fn splice_varint_at(&mut self, pos: usize, value: u32) {
    let mut tmp = Encoder::new();
    tmp.write_varint32(value);
    let bytes = tmp.into_inner();
    self.buf.splice(pos..pos, bytes);
  }

  /// LSB-first base-128 varint, 7 payload bits per byte, continuation bit
  /// `0x80` set on every byte but the last.
  pub fn write_varint32(&mut self, mut v: u32) {
    while v > 0x7f {
      self.write_byte((v & 0x7f) as u8 | 0x80);
      v >>= 7;
    }
    self.write_byte(v as u8);
  }

  /// As [`Self::write_varint32`], but over the full 64-bit split pair,
  /// carrying the low-order bit shifted out of `high` into the top of
  /// `low` each iteration.
  pub fn write_varint64(&mut self, mut pair: Split64) {
    while pair.low > 0x7f || pair.high != 0 {
      self.write_byte((pair.low & 0x7f) as u8 | 0x80);
      let new_low = (pair.low >> 7) | (pair.high << 25);
      let new_high = pair.high >> 7;
      pair = Split64 { low: new_low, high: new_high };
    }
    self.write_byte(pair.low as u8);
  }

  /// A negative signed 32-bit varint is sign-extended to 64 bits before
  /// encoding, per protobuf's rule. The result is always exactly 10 bytes
  /// for a negative input (nine continuation bytes plus a final `0x01`).
  pub fn write_signed_varint32(&mut self, v: i32) {
    if v >= 0 {
      self.write_varint32(v as u32);
    } else {
      self.write_varint64(Split64::from_i64(v as i64));
    }
  }

  #[inline]
  pub fn write_fixed8(&mut self, v: u8) { self.write_byte(v); }
  #[inline]
  pub fn write_fixed16(&mut self, v: u16) { self.write_bytes(&v.to_le_bytes()); }
  #[inline]
  pub fn write_fixed32(&mut self, v: u32) { self.write_bytes(&v.to_le_bytes()); }
  #[inline]
  pub fn write_fixed64(&mut self, pair: Split64) {
    self.write_bytes(&pair.low.to_le_bytes());
    self.write_bytes(&pair.high.to_le_bytes());
  }

  #[inline]
  pub fn write_float(&mut self, v: f32) { self.write_fixed32(split_float32(v)); }
  #[inline]
  pub fn write_double(&mut self, v: f64) { self.write_fixed64(split_float64(v)); }

  #[inline]
  pub fn write_bool(&mut self, v: bool) { self.write_byte(if v { 0x01 } else { 0x00 }); }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(" ")
  }

  #[test]
  fn write_unsigned_varint32_300() {
    let mut e = Encoder::new();
    e.write_varint32(300);
    assert_eq!(hex(e.as_slice()), "AC 02");
  }

  #[test]
  fn write_signed_varint32_negative_one() {
    let mut e = Encoder::new();
    e.write_signed_varint32(-1);
    assert_eq!(hex(e.as_slice()), "FF FF FF FF FF FF FF FF FF 01");
  }

  #[test]
  fn varint64_all_ones_shares_ten_byte_shape_with_signed_negative_one() {
    // Sanity check: the raw varint64 writer hits the same all-ones-then-01
    // shape as a signed -1 when given the maximal split pair.
    let mut e = Encoder::new();
    e.write_varint64(Split64 { low: u32::MAX, high: u32::MAX });
    assert_eq!(hex(e.as_slice()), "FF FF FF FF FF FF FF FF FF 01");
  }

  #[test]
  fn write_zigzag_varint32_negative_one() {
    use crate::zigzag::to_zigzag32;
    let mut e = Encoder::new();
    e.write_varint32(to_zigzag32(-1));
    assert_eq!(hex(e.as_slice()), "01");
  }

  #[test]
  fn write_zigzag_varint64_i64_min() {
    use crate::zigzag::to_zigzag64;
    let mut e = Encoder::new();
    e.write_varint64(to_zigzag64(Split64::from_i64(i64::MIN)));
    assert_eq!(hex(e.as_slice()), "FF FF FF FF FF FF FF FF FF 01");
  }

  #[test]
  fn varint32_small_values_are_one_byte() {
    let mut e = Encoder::new();
    e.write_varint32(0);
    e.write_varint32(1);
    e.write_varint32(127);
    assert_eq!(hex(e.as_slice()), "00 01 7F");
  }

  #[test]
  fn fixed32_is_little_endian() {
    let mut e = Encoder::new();
    e.write_fixed32(0x0102_0304);
    assert_eq!(hex(e.as_slice()), "04 03 02 01");
  }

  #[test]
  fn into_inner_drains_and_resets() {
    let mut e = Encoder::new();
    e.write_byte(0xAB);
    let drained = e.into_inner();
    assert_eq!(drained, vec![0xAB]);
    assert_eq!(e.len(), 0);
  }

  #[test]
  fn splice_varint_backfills_length() {
    let mut e = Encoder::new();
    let pos = e.len();
    e.write_bytes(b"hi");
    e.splice_varint_at(pos, 2);
    assert_eq!(hex(e.as_slice()), "02 68 69");
  }

  #[test]
  fn bulk_copy_handles_large_input() {
    let data = vec![0x42u8; BULK_COPY_CHUNK * 3 + 17];
    let mut e = Encoder::new();
    e.write_bytes(&data);
    assert_eq!(e.as_slice(), data.as_slice());
  }
}

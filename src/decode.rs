//! Low-level, cursor-based byte decoder.
//!
//! Like [`crate::encode::Encoder`], this has no notion of fields or tags,
//! only a position in a byte slice and typed read primitives.
//! [`crate::reader::Reader`] layers field iteration, wire-type checking,
//! and sub-message/group bounds on top of it.

use crate::error::DecodeError;
use crate::split64::{join_float64, Split64};

/// A positioned cursor over a borrowed byte slice.
#[derive(Debug)]
pub struct Decoder<'a> {
  bytes: &'a [u8],
  cursor: usize,
  end: usize,
}

impl<'a> Decoder<'a> {
  pub fn new(bytes: &'a [u8]) -> Decoder<'a> {
    let end = bytes.len();
    Decoder { bytes, cursor: 0, end }
  }

  #[inline]
  pub fn cursor(&self) -> usize { self.cursor }
  #[inline]
  pub fn end(&self) -> usize { self.end }
  #[inline]
  pub fn remaining(&self) -> usize { self.end - self.cursor }
  #[inline]
  pub fn has_remaining(&self) -> bool { self.cursor < self.end }

  /// Used by the reader to descend into a bounded sub-view and to restore
  /// the outer bound afterward.
  #[inline]
  pub(crate) fn set_end(&mut self, end: usize) { self.end = end; }
  #[inline]
  pub(crate) fn set_cursor(&mut self, cursor: usize) { self.cursor = cursor; }

  /// A raw slice of the underlying buffer, ignoring the current `end`
  /// bound. Used by the reader to capture an exact tag-plus-payload byte
  /// range for unknown-field preservation.
  #[inline]
  pub(crate) fn raw_slice(&self, start: usize, end: usize) -> &'a [u8] { &self.bytes[start..end] }

  fn require(&self, width: usize) -> Result<(), DecodeError> {
    if self.cursor + width > self.end {
      Err(DecodeError::ReadPastEnd { cursor: self.cursor, end: self.end, width })
    } else {
      Ok(())
    }
  }

  fn read_exact(&mut self, width: usize) -> Result<&'a [u8], DecodeError> {
    self.require(width)?;
    let slice = &self.bytes[self.cursor..self.cursor + width];
    self.cursor += width;
    Ok(slice)
  }

  #[inline]
  pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
    self.require(1)?;
    let b = self.bytes[self.cursor];
    self.cursor += 1;
    Ok(b)
  }

  /// Reads a base-128 varint of up to 10 groups (enough for any sign-extended
  /// 64-bit value); the 10th byte must have its continuation bit clear.
  pub fn read_varint64(&mut self) -> Result<Split64, DecodeError> {
    let mut acc: u64 = 0;
    for i in 0..10u32 {
      let byte = self.read_byte()?;
      let payload = (byte & 0x7f) as u128;
      let shift = i * 7;
      acc = ((acc as u128) | (payload << shift)) as u64;
      if byte & 0x80 == 0 {
        return Ok(Split64::from_u64(acc));
      }
    }
    Err(DecodeError::InvalidVarint)
  }

  /// As [`Self::read_varint64`], truncated to the low 32 bits. Correct for a
  /// 32-bit field even when the producer emitted a 10-byte sign-extended
  /// varint (e.g. a negative value written through a 32-bit signed field).
  #[inline]
  pub fn read_varint32(&mut self) -> Result<u32, DecodeError> { Ok(self.read_varint64()?.low) }

  /// Reads a varint length prefix, rejecting values whose top bit would
  /// make them negative as a 32-bit signed quantity.
  pub fn read_length(&mut self) -> Result<usize, DecodeError> {
    let raw = self.read_varint32()?;
    if raw & 0x8000_0000 != 0 {
      return Err(DecodeError::NegativeLength { raw: raw as i32 as i64 });
    }
    Ok(raw as usize)
  }

  pub fn read_fixed8(&mut self) -> Result<u8, DecodeError> { self.read_byte() }

  pub fn read_fixed16(&mut self) -> Result<u16, DecodeError> {
    let b = self.read_exact(2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
  }

  pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
    let b = self.read_exact(4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
  }

  pub fn read_fixed64(&mut self) -> Result<Split64, DecodeError> {
    let low = self.read_fixed32()?;
    let high = self.read_fixed32()?;
    Ok(Split64 { low, high })
  }

  pub fn read_float(&mut self) -> Result<f32, DecodeError> { Ok(f32::from_bits(self.read_fixed32()?)) }

  pub fn read_double(&mut self) -> Result<f64, DecodeError> { Ok(join_float64(self.read_fixed64()?)) }

  pub fn read_bool(&mut self) -> Result<bool, DecodeError> { Ok(self.read_byte()? != 0) }

  /// Reads a length-prefixed byte range, returning a borrowed slice into the
  /// original buffer.
  pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
    let len = self.read_length()?;
    self.read_exact(len)
  }

  pub fn read_str(&mut self) -> Result<&'a str, DecodeError> {
    let bytes = self.read_bytes()?;
    std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidInput { reason: "field is not valid UTF-8" })
  }

  /// Advances past a varint without materializing its value.
  pub fn skip_varint(&mut self) -> Result<(), DecodeError> {
    for i in 0..10u32 {
      let byte = self.read_byte()?;
      if byte & 0x80 == 0 {
        return Ok(());
      }
      let _ = i;
    }
    Err(DecodeError::InvalidVarint)
  }

  pub fn skip_fixed32(&mut self) -> Result<(), DecodeError> {
    self.require(4)?;
    self.cursor += 4;
    Ok(())
  }

  pub fn skip_fixed64(&mut self) -> Result<(), DecodeError> {
    self.require(8)?;
    self.cursor += 8;
    Ok(())
  }

  /// Advances past a length-delimited payload (reads the length varint,
  /// then skips that many bytes).
  pub fn skip_delimited(&mut self) -> Result<(), DecodeError> {
    let len = self.read_length()?;
    self.require(len)?;
    self.cursor += len;
    Ok(())
  }
}

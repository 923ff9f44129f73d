//! Immutable, shared-ownership byte container (C8).
//!
//! Bridges the codec's byte-level world and a user-visible `bytes` field:
//! cheap to clone, compared by content rather than identity, and able to
//! hand out a base64 view computed once and cached thereafter.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::sync::{Arc, OnceLock};

struct Inner {
  bytes: Vec<u8>,
  base64: OnceLock<String>,
}

/// A reference-counted, immutable byte buffer.
///
/// `Clone` is an `Arc` bump, not a copy. Equality compares the underlying
/// bytes, not the `Arc` pointer.
#[derive(Clone)]
pub struct ByteString(Arc<Inner>);

impl ByteString {
  /// Takes ownership of `bytes`; no further copy is made.
  pub fn new(bytes: Vec<u8>) -> ByteString {
    ByteString(Arc::new(Inner { bytes, base64: OnceLock::new() }))
  }

  /// The shared empty instance.
  pub fn empty() -> ByteString {
    static EMPTY: OnceLock<ByteString> = OnceLock::new();
    EMPTY.get_or_init(|| ByteString::new(Vec::new())).clone()
  }

  #[inline]
  pub fn as_bytes(&self) -> &[u8] { &self.0.bytes }

  #[inline]
  pub fn len(&self) -> usize { self.0.bytes.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.0.bytes.is_empty() }

  /// The base64 encoding of this byte-string, computed on first call and
  /// cached for the lifetime of this (and any cloned) handle.
  pub fn to_base64(&self) -> &str { self.0.base64.get_or_init(|| STANDARD.encode(&self.0.bytes)) }
}

impl PartialEq for ByteString {
  fn eq(&self, other: &ByteString) -> bool { self.0.bytes == other.0.bytes }
}
impl Eq for ByteString {}

impl fmt::Debug for ByteString {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("ByteString").field("len", &self.len()).finish()
  }
}

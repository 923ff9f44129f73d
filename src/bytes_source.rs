//! Byte-source normalization (C1).
//!
//! Several different "give me some bytes" input shapes are accepted: one
//! constructor per form, plus a [`ByteSource`] sum type for callers that
//! only learn the input's shape at their own run time (e.g. a
//! generated-code layer deserializing a field that's typed to accept
//! either form).

use crate::byte_string::ByteString;
use crate::error::DecodeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

enum BytesRepr<'a> {
  Borrowed(&'a [u8]),
  Owned(Vec<u8>),
  Shared(ByteString),
}

/// The result of normalizing some caller-supplied byte representation: a
/// canonical byte view, whether the caller promised not to mutate it, and
/// (when the source was already a [`ByteString`]) the original handle, so
/// a reader can hand it back out without copying.
pub struct NormalizedBytes<'a> {
  repr: BytesRepr<'a>,
  is_immutable: bool,
}

impl<'a> NormalizedBytes<'a> {
  #[inline]
  pub fn as_bytes(&self) -> &[u8] {
    match &self.repr {
      BytesRepr::Borrowed(s) => s,
      BytesRepr::Owned(v) => v,
      BytesRepr::Shared(b) => b.as_bytes(),
    }
  }

  #[inline]
  pub fn is_immutable(&self) -> bool { self.is_immutable }

  #[inline]
  pub fn len(&self) -> usize { self.as_bytes().len() }
  #[inline]
  pub fn is_empty(&self) -> bool { self.as_bytes().is_empty() }

  /// The original [`ByteString`] this view was built from, if any.
  pub fn byte_string(&self) -> Option<ByteString> {
    match &self.repr {
      BytesRepr::Shared(b) => Some(b.clone()),
      _ => None,
    }
  }

  /// Decodes `s` as base64, producing an owned buffer. `immutable` records
  /// the caller's promise not to mutate it through any other handle.
  pub fn from_base64(s: &str, immutable: bool) -> Result<NormalizedBytes<'a>, DecodeError> {
    let decoded =
      STANDARD.decode(s).map_err(|_| DecodeError::InvalidInput { reason: "invalid base64 text" })?;
    Ok(NormalizedBytes { repr: BytesRepr::Owned(decoded), is_immutable: immutable })
  }

  /// Takes ownership of a freshly allocated buffer. `immutable` records the
  /// caller's promise not to mutate it through any other handle.
  pub fn from_vec(v: Vec<u8>, immutable: bool) -> NormalizedBytes<'a> {
    NormalizedBytes { repr: BytesRepr::Owned(v), is_immutable: immutable }
  }

  /// Borrows `s` with no copy. Always mutable from the normalizer's point of
  /// view; the caller retains the only handle capable of mutating it.
  pub fn from_slice(s: &'a [u8]) -> NormalizedBytes<'a> {
    NormalizedBytes { repr: BytesRepr::Borrowed(s), is_immutable: false }
  }

  /// Aliases an existing [`ByteString`]'s storage; always immutable.
  pub fn from_byte_string(b: ByteString) -> NormalizedBytes<'a> {
    NormalizedBytes { repr: BytesRepr::Shared(b), is_immutable: true }
  }
}

/// The set of byte-source shapes a caller might hold at their own run time.
///
/// Any type implementing `AsRef<[u8]>` converts to [`ByteSource::Borrowed`]
/// or [`ByteSource::Owned`] at the call site.
pub enum ByteSource<'a> {
  Base64(&'a str),
  Owned(Vec<u8>),
  Borrowed(&'a [u8]),
  Immutable(ByteString),
}

/// Normalizes a heterogeneous [`ByteSource`] in one dispatch, for callers
/// that receive more than one accepted shape and must switch on it once at
/// the boundary rather than per accessor call.
///
/// `treat_new_as_immutable` governs every freshly allocated form (`Base64`,
/// `Owned`); `Borrowed` is always mutable and `Immutable` is always
/// immutable, regardless of this flag.
pub fn from_source(src: ByteSource<'_>, treat_new_as_immutable: bool) -> Result<NormalizedBytes<'_>, DecodeError> {
  match src {
    ByteSource::Base64(s) => NormalizedBytes::from_base64(s, treat_new_as_immutable),
    ByteSource::Owned(v) => Ok(NormalizedBytes::from_vec(v, treat_new_as_immutable)),
    ByteSource::Borrowed(s) => Ok(NormalizedBytes::from_slice(s)),
    ByteSource::Immutable(b) => Ok(NormalizedBytes::from_byte_string(b)),
  }
}

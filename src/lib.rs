//! A protocol-buffer binary wire-format codec.
//!
//! This crate provides the low-level machinery generated message code is
//! built on top of: a field-aware [`Writer`] that emits tagged,
//! length-prefixed byte streams, and a field-aware [`Reader`] that walks
//! such streams as a stateful cursor. Both are built from smaller pieces,
//! all also exposed for callers building their own codec on top of a
//! different field-dispatch strategy: [`split64`] and [`zigzag`] for
//! lossless 64-bit arithmetic, [`encode`] and [`decode`] for the untagged
//! byte-level primitives, [`scan`] for presizing repeated fields in one
//! pass, and [`tag`] for the wire tag itself.
//!
//! This crate does not generate per-message code, parse schemas, or know
//! anything about a particular `.proto` file; it only implements the wire
//! format those things are built on.

pub mod byte_string;
pub mod bytes_source;
pub mod decode;
pub mod encode;
pub mod error;
pub mod reader;
pub mod scan;
pub mod split64;
pub mod tag;
pub mod writer;
pub mod zigzag;

pub use byte_string::ByteString;
pub use bytes_source::{ByteSource, NormalizedBytes};
pub use error::{DecodeError, EncodeError};
pub use reader::Reader;
pub use split64::{NumberOrString, Split64};
pub use tag::WireType;
pub use writer::Writer;

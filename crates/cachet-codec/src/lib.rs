//! Value codec for Cachet.
//!
//! Turns any `serde` value into the opaque payload the store keeps, and
//! back. The payload is self-describing: a two-byte header followed by a
//! zstd frame of the value's JSON encoding.

pub mod codec;
pub mod error;

pub use codec::{ValueCodec, COMPRESSION_LEVEL, FORMAT_VERSION, MAGIC};
pub use error::{CodecError, CodecResult};

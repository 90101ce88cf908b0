//! bilbinary codec - compacted script trees to bytes and back.
//!
//! Every value opens with a one-byte [`TypeTag`]. Mapping members also carry a
//! two-byte key code. Mappings and sequences are element lists: a two-byte
//! little-endian total length followed by the encoded members.

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod tag;

#[cfg(test)]
mod fixtures;

pub use codec::{Codec, CodecConfig};
pub use decoder::DecodingError;
pub use encoder::EncodingError;
pub use tag::TypeTag;

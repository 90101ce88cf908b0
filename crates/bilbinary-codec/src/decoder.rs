//! Decoder from the wire format back to compacted trees.
//!
//! Decoding restores the compacted shape only. Global indices and local slots
//! stay numeric.

use bilbinary_dict::{Dictionaries, KeywordCode};
use bilbinary_tree::{Mapping, Node};
use thiserror::Error;

use crate::tag::{ELIST_HEADER, TypeTag};

/// Decoding errors. Offsets point at the first byte of the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    #[error("truncated buffer at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unknown key code {code} at offset {offset}")]
    UnknownKeyCode { code: KeywordCode, offset: usize },

    #[error("unknown keyword code {code} at offset {offset}")]
    UnknownKeywordCode { code: KeywordCode, offset: usize },

    #[error("unsupported type tag 0x{tag:02x} at offset {offset}")]
    UnsupportedTypeTag { tag: u8, offset: usize },

    #[error("element at offset {offset} runs past the element list end {end}")]
    ElistOverrun { offset: usize, end: usize },

    #[error("{count} trailing bytes at offset {offset}")]
    TrailingBytes { offset: usize, count: usize },

    #[error("nesting deeper than {max_depth} levels")]
    NestingTooDeep { max_depth: usize },
}

/// Cursor over one buffer.
pub(crate) struct Decoder<'a> {
    dictionaries: &'a Dictionaries,
    max_depth: usize,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(dictionaries: &'a Dictionaries, max_depth: usize, buf: &'a [u8]) -> Self {
        Self {
            dictionaries,
            max_depth,
            buf,
            pos: 0,
        }
    }

    /// Decode a root object body and require the buffer to end with it.
    pub(crate) fn decode_root(mut self) -> Result<Node, DecodingError> {
        let map = self.object_body(0)?;
        if self.pos < self.buf.len() {
            return Err(DecodingError::TrailingBytes {
                offset: self.pos,
                count: self.buf.len() - self.pos,
            });
        }
        Ok(Node::Mapping(map))
    }

    fn payload(&mut self, tag: TypeTag, key: Option<&str>, depth: usize) -> Result<Node, DecodingError> {
        let node = match tag {
            TypeTag::Number => Node::Number(f64::from(f32::from_le_bytes(self.take()?))),
            TypeTag::Int8 => Node::Number(f64::from(i8::from_le_bytes(self.take()?))),
            TypeTag::Int16 => Node::Number(f64::from(i16::from_le_bytes(self.take()?))),
            TypeTag::Int32 => Node::Number(f64::from(i32::from_le_bytes(self.take()?))),
            TypeTag::Keyword => {
                let offset = self.pos;
                let code = KeywordCode::from_le_bytes(self.take()?);
                let text = self
                    .dictionaries
                    .value(key, code)
                    .ok_or(DecodingError::UnknownKeywordCode { code, offset })?;
                Node::Text(text.to_string())
            }
            TypeTag::Object => {
                let depth = self.descend(depth)?;
                Node::Mapping(self.object_body(depth)?)
            }
            TypeTag::Array => {
                let depth = self.descend(depth)?;
                Node::Sequence(self.array_body(depth)?)
            }
        };
        Ok(node)
    }

    fn descend(&self, depth: usize) -> Result<usize, DecodingError> {
        if depth >= self.max_depth {
            return Err(DecodingError::NestingTooDeep {
                max_depth: self.max_depth,
            });
        }
        Ok(depth + 1)
    }

    // ===========================================================================
    // Element Lists
    // ===========================================================================

    fn object_body(&mut self, depth: usize) -> Result<Mapping, DecodingError> {
        let end = self.elist_end()?;
        let mut map = Mapping::new();
        while self.pos < end {
            let offset = self.pos;
            let tag = self.tag()?;
            let key = self.key()?;
            let value = self.payload(tag, Some(key), depth)?;
            self.within(offset, end)?;
            map.insert(key.to_string(), value);
        }
        Ok(map)
    }

    fn array_body(&mut self, depth: usize) -> Result<Vec<Node>, DecodingError> {
        let end = self.elist_end()?;
        let mut items = Vec::new();
        while self.pos < end {
            let offset = self.pos;
            let tag = self.tag()?;
            items.push(self.payload(tag, None, depth)?);
            self.within(offset, end)?;
        }
        Ok(items)
    }

    /// Read an element list prefix and return the offset just past the list.
    fn elist_end(&mut self) -> Result<usize, DecodingError> {
        let start = self.pos;
        let len = usize::from(u16::from_le_bytes(self.take()?));
        let end = start + len;
        if len < ELIST_HEADER {
            return Err(DecodingError::ElistOverrun { offset: start, end });
        }
        if end > self.buf.len() {
            return Err(DecodingError::TruncatedBuffer {
                offset: start,
                needed: len,
                available: self.buf.len() - start,
            });
        }
        Ok(end)
    }

    fn within(&self, offset: usize, end: usize) -> Result<(), DecodingError> {
        if self.pos > end {
            return Err(DecodingError::ElistOverrun { offset, end });
        }
        Ok(())
    }

    // ===========================================================================
    // Primitive Reads
    // ===========================================================================

    fn tag(&mut self) -> Result<TypeTag, DecodingError> {
        let offset = self.pos;
        let [byte] = self.take()?;
        TypeTag::from_byte(byte).ok_or(DecodingError::UnsupportedTypeTag { tag: byte, offset })
    }

    fn key(&mut self) -> Result<&'a str, DecodingError> {
        let offset = self.pos;
        let code = KeywordCode::from_le_bytes(self.take()?);
        let dictionaries = self.dictionaries;
        dictionaries
            .key(code)
            .ok_or(DecodingError::UnknownKeyCode { code, offset })
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodingError> {
        let available = self.buf.len() - self.pos;
        let bytes: [u8; N] = self
            .buf
            .get(self.pos..self.pos + N)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(DecodingError::TruncatedBuffer {
                offset: self.pos,
                needed: N,
                available,
            })?;
        self.pos += N;
        Ok(bytes)
    }
}

//! Encoder from compacted trees to the wire format.

use bilbinary_dict::{Dictionaries, KeywordCode, NAME_KEY};
use bilbinary_tree::{Mapping, Node};
use thiserror::Error;

use crate::tag::{ELIST_HEADER, MAX_ELIST_LEN, TypeTag, header_width};

/// Encoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("no {dictionary} dictionary code for {keyword:?}")]
    UnresolvedKeyword {
        keyword: String,
        dictionary: &'static str,
    },

    #[error("numeric key {key} does not fit in 16 bits")]
    KeyCodeOverflow { key: String },

    #[error("element list of {len} bytes exceeds 65535")]
    SizeOverflow { len: usize },

    #[error("packed {tag} took {actual} bytes, expected {expected}")]
    InternalLengthMismatch {
        tag: TypeTag,
        expected: usize,
        actual: usize,
    },

    #[error("cannot encode a {found} as the root")]
    UnsupportedRoot { found: &'static str },

    #[error("nesting deeper than {max_depth} levels")]
    NestingTooDeep { max_depth: usize },
}

/// Placeholder for an element list length patched after its members.
const PLACEHOLDER: [u8; 2] = [0xFF, 0xFF];

/// Byte writer for one encode call.
pub(crate) struct Encoder<'a> {
    dictionaries: &'a Dictionaries,
    max_depth: usize,
    buf: Vec<u8>,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(dictionaries: &'a Dictionaries, max_depth: usize) -> Self {
        Self {
            dictionaries,
            max_depth,
            buf: Vec::new(),
        }
    }

    /// Encode a root value: an object body with no tag or key.
    ///
    /// A sequence root is written as an object body keyed by element index,
    /// so its first element carries key code 0.
    pub(crate) fn encode_root(mut self, node: &Node) -> Result<Vec<u8>, EncodingError> {
        match node {
            Node::Mapping(map) => {
                self.object_body(map, 0)?;
            }
            Node::Sequence(items) => {
                self.elist(|enc| {
                    items
                        .iter()
                        .enumerate()
                        .try_for_each(|(index, item)| enc.value(Some(&index.to_string()), item, 0))
                })?;
            }
            _ => {
                return Err(EncodingError::UnsupportedRoot {
                    found: node.type_name(),
                });
            }
        }
        Ok(self.buf)
    }

    /// Encode a single value, keyed or not.
    pub(crate) fn encode_value(mut self, key: Option<&str>, node: &Node) -> Result<Vec<u8>, EncodingError> {
        self.value(key, node, 0)?;
        Ok(self.buf)
    }

    fn value(&mut self, key: Option<&str>, node: &Node, depth: usize) -> Result<(), EncodingError> {
        match node {
            Node::Number(n) => self.number(key, *n),
            Node::Text(text) => self.keyword(key, text),
            Node::Sequence(items) => {
                let depth = self.descend(depth)?;
                self.container(TypeTag::Array, key, |enc| {
                    items.iter().try_for_each(|item| enc.value(None, item, depth))
                })
            }
            Node::Mapping(map) => {
                let depth = self.descend(depth)?;
                self.container(TypeTag::Object, key, |enc| {
                    map.iter()
                        .try_for_each(|(k, v)| enc.value(Some(k.as_str()), v, depth))
                })
            }
        }
    }

    fn descend(&self, depth: usize) -> Result<usize, EncodingError> {
        if depth >= self.max_depth {
            return Err(EncodingError::NestingTooDeep {
                max_depth: self.max_depth,
            });
        }
        Ok(depth + 1)
    }

    fn object_body(&mut self, map: &Mapping, depth: usize) -> Result<usize, EncodingError> {
        self.elist(|enc| {
            map.iter()
                .try_for_each(|(k, v)| enc.value(Some(k.as_str()), v, depth))
        })
    }

    // ===========================================================================
    // Scalars
    // ===========================================================================

    fn number(&mut self, key: Option<&str>, n: f64) -> Result<(), EncodingError> {
        let tag = TypeTag::for_number(n);
        // for_number only picks the integer tags for values in their range.
        match tag {
            TypeTag::Int8 => self.scalar(tag, key, &(n as i8).to_le_bytes()),
            TypeTag::Int16 => self.scalar(tag, key, &(n as i16).to_le_bytes()),
            _ => self.scalar(TypeTag::Number, key, &(n as f32).to_le_bytes()),
        }
    }

    fn keyword(&mut self, key: Option<&str>, text: &str) -> Result<(), EncodingError> {
        let code = self
            .dictionaries
            .value_code(key, text)
            .ok_or_else(|| EncodingError::UnresolvedKeyword {
                keyword: text.to_string(),
                dictionary: if key == Some(NAME_KEY) {
                    "instruction"
                } else {
                    "general"
                },
            })?;
        self.scalar(TypeTag::Keyword, key, &code.to_le_bytes())
    }

    fn scalar(&mut self, tag: TypeTag, key: Option<&str>, payload: &[u8]) -> Result<(), EncodingError> {
        let start = self.buf.len();
        self.header(tag, key)?;
        self.buf.extend_from_slice(payload);

        let expected = header_width(key.is_some()) + tag.payload_width().unwrap_or_default();
        self.check_length(tag, start, expected)
    }

    // ===========================================================================
    // Element Lists
    // ===========================================================================

    fn container<F>(&mut self, tag: TypeTag, key: Option<&str>, members: F) -> Result<(), EncodingError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodingError>,
    {
        let start = self.buf.len();
        self.header(tag, key)?;
        let body = self.elist(members)?;
        self.check_length(tag, start, header_width(key.is_some()) + body)
    }

    /// Write a length-prefixed element list and return its total length.
    fn elist<F>(&mut self, members: F) -> Result<usize, EncodingError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodingError>,
    {
        let start = self.buf.len();
        self.buf.extend_from_slice(&PLACEHOLDER);
        members(self)?;

        let len = self.buf.len() - start;
        if len > MAX_ELIST_LEN {
            return Err(EncodingError::SizeOverflow { len });
        }
        self.buf[start..start + ELIST_HEADER].copy_from_slice(&(len as u16).to_le_bytes());
        Ok(len)
    }

    // ===========================================================================
    // Headers
    // ===========================================================================

    fn header(&mut self, tag: TypeTag, key: Option<&str>) -> Result<(), EncodingError> {
        self.buf.push(tag as u8);
        if let Some(key) = key {
            let code = self.key_code(key)?;
            self.buf.extend_from_slice(&code.to_le_bytes());
        }
        Ok(())
    }

    /// Code for a mapping key.
    ///
    /// Keys missing from the dictionary may be written as their own decimal
    /// value, e.g. a port number or a root element index. "0" maps to code 0,
    /// which no dictionary assigns.
    fn key_code(&self, key: &str) -> Result<KeywordCode, EncodingError> {
        if let Some(code) = self.dictionaries.key_code(key) {
            return Ok(code);
        }
        let canonical = !key.is_empty()
            && key.bytes().all(|b| b.is_ascii_digit())
            && (key == "0" || !key.starts_with('0'));
        if !canonical {
            return Err(EncodingError::UnresolvedKeyword {
                keyword: key.to_string(),
                dictionary: "general",
            });
        }
        key.parse::<KeywordCode>()
            .map_err(|_| EncodingError::KeyCodeOverflow {
                key: key.to_string(),
            })
    }

    fn check_length(&self, tag: TypeTag, start: usize, expected: usize) -> Result<(), EncodingError> {
        let actual = self.buf.len() - start;
        if actual != expected {
            return Err(EncodingError::InternalLengthMismatch {
                tag,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{dictionaries, node};
    use serde_json::json;

    fn encode(value: serde_json::Value) -> Result<Vec<u8>, EncodingError> {
        Encoder::new(&dictionaries(), 128).encode_root(&node(value))
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(encode(json!({})).unwrap(), [0x02, 0x00]);
        assert_eq!(encode(json!([])).unwrap(), [0x02, 0x00]);
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(encode(json!({ "x": 2 })).unwrap(), [0x06, 0x00, 0x05, 0x22, 0x00, 0x02]);
        assert_eq!(encode(json!({ "x": 127 })).unwrap(), [0x06, 0x00, 0x05, 0x22, 0x00, 0x7f]);
        assert_eq!(encode(json!({ "x": -128 })).unwrap(), [0x06, 0x00, 0x05, 0x22, 0x00, 0x80]);
        assert_eq!(encode(json!({ "x": 128 })).unwrap(), [0x07, 0x00, 0x06, 0x22, 0x00, 0x80, 0x00]);
        assert_eq!(encode(json!({ "x": -129 })).unwrap(), [0x07, 0x00, 0x06, 0x22, 0x00, 0x7f, 0xff]);
        assert_eq!(encode(json!({ "x": 32767 })).unwrap(), [0x07, 0x00, 0x06, 0x22, 0x00, 0xff, 0x7f]);
        assert_eq!(encode(json!({ "x": -32768 })).unwrap(), [0x07, 0x00, 0x06, 0x22, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn test_wide_integers_become_floats() {
        let cases: [(i64, [u8; 4]); 7] = [
            (32768, [0x00, 0x00, 0x00, 0x47]),
            (-32769, [0x00, 0x01, 0x00, 0xc7]),
            (8388607, [0xfe, 0xff, 0xff, 0x4a]),
            (-8388608, [0x00, 0x00, 0x00, 0xcb]),
            (2147483647, [0x00, 0x00, 0x00, 0x4f]),
            (-2147483648, [0x00, 0x00, 0x00, 0xcf]),
            (2147483648, [0x00, 0x00, 0x00, 0x4f]),
        ];
        for (n, bits) in cases {
            let mut expected = vec![0x09, 0x00, 0x01, 0x22, 0x00];
            expected.extend_from_slice(&bits);
            assert_eq!(encode(json!({ "x": n })).unwrap(), expected, "x = {}", n);
        }
    }

    #[test]
    fn test_fractions() {
        assert_eq!(
            encode(json!({ "name": "wait", "secs": 0.6 })).unwrap(),
            [0x0e, 0x00, 0x02, 0x0d, 0x00, 0x06, 0x00, 0x01, 0x11, 0x00, 0x9a, 0x99, 0x19, 0x3f]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(encode(json!({ "x": "x" })).unwrap(), [0x07, 0x00, 0x02, 0x22, 0x00, 0x22, 0x00]);
        assert_eq!(encode(json!({ "x": "y" })).unwrap(), [0x07, 0x00, 0x02, 0x22, 0x00, 0x23, 0x00]);
        // "name" values come from the instruction dictionary.
        assert_eq!(encode(json!({ "name": "wait" })).unwrap(), [0x07, 0x00, 0x02, 0x0d, 0x00, 0x06, 0x00]);
    }

    #[test]
    fn test_nested() {
        assert_eq!(encode(json!({ "x": {} })).unwrap(), [0x07, 0x00, 0x03, 0x22, 0x00, 0x02, 0x00]);
        assert_eq!(encode(json!({ "x": [] })).unwrap(), [0x07, 0x00, 0x04, 0x22, 0x00, 0x02, 0x00]);
        assert_eq!(
            encode(json!({ "x": { "y": 1 } })).unwrap(),
            [0x0b, 0x00, 0x03, 0x22, 0x00, 0x06, 0x00, 0x05, 0x23, 0x00, 0x01]
        );
        assert_eq!(
            encode(json!({ "x": [8] })).unwrap(),
            [0x09, 0x00, 0x04, 0x22, 0x00, 0x04, 0x00, 0x05, 0x08]
        );
    }

    #[test]
    fn test_unresolved_keyword() {
        assert_eq!(
            encode(json!({ "x": "nowhere" })).unwrap_err(),
            EncodingError::UnresolvedKeyword {
                keyword: "nowhere".to_string(),
                dictionary: "general",
            }
        );
        // Instruction names are not looked up in the general dictionary.
        assert_eq!(
            encode(json!({ "name": "x" })).unwrap_err(),
            EncodingError::UnresolvedKeyword {
                keyword: "x".to_string(),
                dictionary: "instruction",
            }
        );
        assert!(matches!(
            encode(json!({ "nowhere": 1 })).unwrap_err(),
            EncodingError::UnresolvedKeyword { dictionary: "general", .. }
        ));
    }

    #[test]
    fn test_numeric_keys() {
        assert_eq!(encode(json!({ "300": 1 })).unwrap(), [0x06, 0x00, 0x05, 0x2c, 0x01, 0x01]);
        assert_eq!(encode(json!({ "0": 1 })).unwrap(), [0x06, 0x00, 0x05, 0x00, 0x00, 0x01]);
        assert_eq!(
            encode(json!({ "65536": 1 })).unwrap_err(),
            EncodingError::KeyCodeOverflow {
                key: "65536".to_string()
            }
        );
        let dicts = dictionaries();
        for key in ["", "00", "07", "-1", "+7"] {
            let tree: Node = [(key, Node::from(1))].into_iter().collect();
            assert!(
                matches!(
                    Encoder::new(&dicts, 8).encode_root(&tree).unwrap_err(),
                    EncodingError::UnresolvedKeyword { .. }
                ),
                "key {}",
                key
            );
        }
    }

    #[test]
    fn test_sequence_root_keyed_by_index() {
        #[rustfmt::skip]
        let expected = [
            0x10, 0x00,
            0x05, 0x00, 0x00, 0x01,
            0x02, 0x01, 0x00, 0x22, 0x00,
            0x03, 0x02, 0x00, 0x02, 0x00,
        ];
        assert_eq!(encode(json!([1, "x", {}])).unwrap(), expected);
    }

    #[test]
    fn test_unsupported_root() {
        assert_eq!(
            encode(json!("x")).unwrap_err(),
            EncodingError::UnsupportedRoot { found: "text" }
        );
        assert_eq!(
            encode(json!(3)).unwrap_err(),
            EncodingError::UnsupportedRoot { found: "number" }
        );
    }

    #[test]
    fn test_size_overflow() {
        // 13108 five-byte members plus the prefix exceed 65535.
        let items = vec![json!(1000.5); 13108];
        let err = encode(json!({ "x": items })).unwrap_err();
        assert!(matches!(err, EncodingError::SizeOverflow { len } if len > MAX_ELIST_LEN));
    }

    #[test]
    fn test_depth_limit() {
        let mut value = json!(1);
        for _ in 0..5 {
            value = json!([value]);
        }
        let tree = node(json!({ "x": value }));
        let dicts = dictionaries();
        assert!(Encoder::new(&dicts, 5).encode_root(&tree).is_ok());
        assert_eq!(
            Encoder::new(&dicts, 4).encode_root(&tree).unwrap_err(),
            EncodingError::NestingTooDeep { max_depth: 4 }
        );
    }

    #[test]
    fn test_unkeyed_value() {
        let dicts = dictionaries();
        let bytes = Encoder::new(&dicts, 8).encode_value(None, &Node::from(-50)).unwrap();
        assert_eq!(bytes, [0x05, 0xce]);
        let bytes = Encoder::new(&dicts, 8).encode_value(Some("x"), &Node::from(200)).unwrap();
        assert_eq!(bytes, [0x06, 0x22, 0x00, 0xc8, 0x00]);
    }
}

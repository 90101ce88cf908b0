//! bilbinary - compact block scripts and pack them into a binary encoding.
//!
//! Scripts authored as a tree of named blocks are first compacted, replacing
//! symbolic names with integer indices, and then encoded into a
//! self-describing binary form for a resource-constrained target.
//!
//! # Example
//!
//! ```
//! use bilbinary::{Node, Translator};
//!
//! let translator = Translator::from_json(
//!     r#"{"name": 13, "secs": 17, "blocks": 26, "scripts": 33,
//!        "port-settings": 32, "port-parameters": 85}"#,
//!     r#"{"when-green-flag-clicked": 1, "wait": 6}"#,
//! )
//! .unwrap();
//!
//! let document: Node = serde_json::from_str(
//!     r#"{"scripts": [{"name": "when-green-flag-clicked",
//!                    "blocks": [{"name": "wait", "secs": 1}]}]}"#,
//! )
//! .unwrap();
//!
//! let bytes = translator.translate(&document).unwrap();
//! assert_eq!(usize::from(u16::from_le_bytes([bytes[0], bytes[1]])), bytes.len());
//! ```

pub use bilbinary_codec as codec;
pub use bilbinary_compactor as compactor;
pub use bilbinary_dict as dict;
pub use bilbinary_tree as tree;

// Re-export commonly used types
pub use bilbinary_codec::{Codec, CodecConfig, DecodingError, EncodingError, TypeTag};
pub use bilbinary_compactor::{SymbolResolutionError, SymbolTable, compact};
pub use bilbinary_dict::{Dictionaries, Dictionary, DictionaryError, KeywordCode};
pub use bilbinary_tree::{BlockKind, Category, Mapping, Node};

use thiserror::Error;

/// Error type for translation.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("compact error: {0}")]
    Compact(#[from] SymbolResolutionError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodingError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodingError),
}

/// Compact a document and encode it with `codec`.
pub fn serialize(document: &Node, codec: &Codec) -> Result<Vec<u8>, TranslateError> {
    let compacted = compact(document)?;
    Ok(codec.encode(&compacted)?)
}

/// A codec together with the compaction step in front of it.
#[derive(Debug, Clone)]
pub struct Translator {
    codec: Codec,
}

impl Translator {
    pub fn new(dictionaries: Dictionaries) -> Self {
        Self::with_codec(Codec::new(dictionaries))
    }

    pub fn with_codec(codec: Codec) -> Self {
        Self { codec }
    }

    /// Load both dictionaries from their JSON object form.
    pub fn from_json(general: &str, instructions: &str) -> Result<Self, TranslateError> {
        let dictionaries = Dictionaries::new(
            Dictionary::from_json(general)?,
            Dictionary::from_json(instructions)?,
        );
        Ok(Self::new(dictionaries))
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Compact and encode an authoring document.
    pub fn translate(&self, document: &Node) -> Result<Vec<u8>, TranslateError> {
        serialize(document, &self.codec)
    }

    /// Encode an already compacted tree.
    pub fn serialize(&self, compacted: &Node) -> Result<Vec<u8>, TranslateError> {
        Ok(self.codec.encode(compacted)?)
    }

    /// Decode bytes back into a compacted tree.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Node, TranslateError> {
        Ok(self.codec.decode(bytes)?)
    }
}

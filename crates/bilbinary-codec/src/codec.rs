//! Codec configuration and entry points.

use std::sync::Arc;

use bilbinary_dict::Dictionaries;
use bilbinary_tree::Node;

use crate::decoder::{Decoder, DecodingError};
use crate::encoder::{Encoder, EncodingError};

/// Default bound on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Codec configuration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Deepest container nesting accepted by encode and decode.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Encoder and decoder bound to a pair of dictionaries.
///
/// The dictionaries are shared and never mutated, so a codec can be cloned
/// cheaply and used from several threads at once.
#[derive(Debug, Clone)]
pub struct Codec {
    dictionaries: Arc<Dictionaries>,
    config: CodecConfig,
}

impl Codec {
    pub fn new(dictionaries: Dictionaries) -> Self {
        Self::with_config(dictionaries, CodecConfig::default())
    }

    pub fn with_config(dictionaries: Dictionaries, config: CodecConfig) -> Self {
        Self {
            dictionaries: Arc::new(dictionaries),
            config,
        }
    }

    pub fn dictionaries(&self) -> &Dictionaries {
        &self.dictionaries
    }

    pub fn config(&self) -> CodecConfig {
        self.config
    }

    /// Encode a root mapping.
    pub fn encode(&self, node: &Node) -> Result<Vec<u8>, EncodingError> {
        Encoder::new(&self.dictionaries, self.config.max_depth).encode_root(node)
    }

    /// Encode a single value with its tag and, when `key` is given, its key code.
    pub fn encode_value(&self, key: Option<&str>, node: &Node) -> Result<Vec<u8>, EncodingError> {
        Encoder::new(&self.dictionaries, self.config.max_depth).encode_value(key, node)
    }

    /// Decode a buffer produced by [`Codec::encode`].
    pub fn decode(&self, bytes: &[u8]) -> Result<Node, DecodingError> {
        Decoder::new(&self.dictionaries, self.config.max_depth, bytes).decode_root()
    }
}

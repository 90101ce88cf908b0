//! Script tree nodes.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::block::{BlockKind, keys};

/// String-keyed mapping that keeps insertion order.
pub type Mapping = IndexMap<String, Node>;

/// A script tree node.
///
/// The authoring tool produces these as JSON; `true`, `false` and `null` have
/// no counterpart and are rejected on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Number(f64),
    Text(String),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

impl Node {
    /// An empty mapping.
    pub fn empty_mapping() -> Self {
        Node::Mapping(Mapping::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Member of a mapping, if this is one and the key is present.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// The instruction name of a block, i.e. its `name` text.
    pub fn block_name(&self) -> Option<&str> {
        self.get(keys::NAME).and_then(Node::as_str)
    }

    /// Block kind of a mapping. Anything without a name is [`BlockKind::Other`].
    pub fn block_kind(&self) -> BlockKind {
        self.block_name()
            .map_or(BlockKind::Other, BlockKind::from_name)
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Number(_) => "number",
            Node::Text(_) => "text",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }
}

/// Whether `n` is finite with no fractional part.
pub fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Number(n)
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Number(f64::from(n))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Self {
        Node::Mapping(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Node {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Node::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Number(n) => write!(f, "{}", n),
            Node::Text(s) => write!(f, "{:?}", s),
            Node::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Node::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

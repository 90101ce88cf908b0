//! bilbinary tree - the script node type and the block kind table.
//!
//! Scripts arrive from the authoring tool as JSON-shaped trees. The same
//! [`Node`] type carries both the symbolic form and the compacted form, where
//! names have been replaced by integer indices.

pub mod block;
pub mod node;

pub use block::{BlockKind, Category, keys};
pub use node::{Mapping, Node, is_integral};

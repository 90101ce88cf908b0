//! bilbinary compactor - symbolic names to integer indices.
//!
//! This crate turns the authoring tool's symbolic script tree into the
//! compacted tree the binary codec expects: global names become 0-based
//! indices, parameters and locals become negative slots, and a function's
//! parameter list becomes its arity.

pub mod compactor;
pub mod document;
pub mod symbol_table;

pub use compactor::{Compactor, SymbolResolutionError, compact_scripts, strip_annotations};
pub use document::{compact, select_port_parameters};
pub use symbol_table::{GlobalIndex, GlobalNames, LocalScope, LocalSlot, SymbolTable};

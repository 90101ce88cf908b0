//! Two-phase name compaction for scripts.
//!
//! Phase 1: Resolve parameters and locals inside each function and handler
//! Phase 2: Resolve global names and call-site arguments across the tree

use bilbinary_tree::{BlockKind, Category, Mapping, Node, keys};
use thiserror::Error;

use crate::symbol_table::{LocalScope, SymbolTable};

/// Name resolution errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolResolutionError {
    #[error("{name:?} is already defined in {scope}")]
    DuplicateLocal { scope: String, name: String },

    #[error("unknown {category}: {name}")]
    UnknownSymbol { category: Category, name: String },

    #[error("function {function:?} has no parameter {name:?}")]
    UnknownParameter { function: String, name: String },
}

/// Keys dropped from every mapping before compaction.
const ANNOTATION_KEYS: &[&str] = &[keys::PYTHON_INFO];

/// Compacts script trees against one symbol table.
pub struct Compactor<'a> {
    table: &'a SymbolTable,
}

impl<'a> Compactor<'a> {
    /// Create a compactor for a table.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Compact a list of scripts (or any sub-tree of one).
    pub fn compact(&self, scripts: &Node) -> Result<Node, SymbolResolutionError> {
        let stripped = strip_annotations(scripts);
        let scoped = self.resolve_scopes(&stripped)?;
        self.resolve_globals(&scoped)
    }

    // ===========================================================================
    // Phase 1: Local Scopes
    // ===========================================================================

    fn resolve_scopes(&self, node: &Node) -> Result<Node, SymbolResolutionError> {
        match node {
            Node::Sequence(items) => items
                .iter()
                .map(|item| self.resolve_scopes(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Node::Sequence),
            Node::Mapping(map) => match node.block_kind() {
                BlockKind::Function => {
                    let name = node.get(keys::FUNCTION).and_then(Node::as_str).unwrap_or_default();
                    let scope = self.table.function_locals(name).ok_or_else(|| {
                        SymbolResolutionError::UnknownSymbol {
                            category: Category::Function,
                            name: name.to_string(),
                        }
                    })?;
                    Ok(Node::Mapping(bind_declaration(map, scope)))
                }
                BlockKind::WhenGreenFlagClicked => {
                    Ok(Node::Mapping(bind_declaration(map, self.table.handler_locals())))
                }
                _ => Ok(node.clone()),
            },
            _ => Ok(node.clone()),
        }
    }

    // ===========================================================================
    // Phase 2: Globals and Call Sites
    // ===========================================================================

    fn resolve_globals(&self, node: &Node) -> Result<Node, SymbolResolutionError> {
        match node {
            Node::Number(_) | Node::Text(_) => Ok(node.clone()),
            Node::Sequence(items) => items
                .iter()
                .map(|item| self.resolve_globals(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Node::Sequence),
            Node::Mapping(map) => {
                let kind = node.block_kind();
                let field = kind.environment_field();
                let mut out = Mapping::with_capacity(map.len());
                for (key, value) in map {
                    let category = field.filter(|c| c.key() == key.as_str());
                    let resolved = match (value, category) {
                        (Node::Sequence(args), _)
                            if kind == BlockKind::CallFunction && key == keys::ARGS =>
                        {
                            let callee = node.get(keys::FUNCTION).and_then(Node::as_str);
                            self.resolve_call_args(callee, args)?
                        }
                        (Node::Text(name), Some(category)) => {
                            let index = self.table.global(category, name).ok_or_else(|| {
                                SymbolResolutionError::UnknownSymbol {
                                    category,
                                    name: name.clone(),
                                }
                            })?;
                            Node::Number(f64::from(index))
                        }
                        _ => self.resolve_globals(value)?,
                    };
                    out.insert(key.clone(), resolved);
                }
                Ok(Node::Mapping(out))
            }
        }
    }

    /// Resolve the argument entries of a call.
    ///
    /// An entry's `variable` names a parameter of the callee, so it takes the
    /// callee's slot. Its `value` was already scoped to the caller in phase 1.
    fn resolve_call_args(
        &self,
        callee: Option<&str>,
        args: &[Node],
    ) -> Result<Node, SymbolResolutionError> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            let Node::Mapping(entry) = arg else {
                out.push(self.resolve_globals(arg)?);
                continue;
            };
            let mut resolved = Mapping::with_capacity(entry.len());
            for (key, value) in entry {
                let value = match value {
                    Node::Text(param) if key == keys::VARIABLE => {
                        Node::Number(f64::from(self.parameter_slot(callee, param)?))
                    }
                    _ => self.resolve_globals(value)?,
                };
                resolved.insert(key.clone(), value);
            }
            out.push(Node::Mapping(resolved));
        }
        Ok(Node::Sequence(out))
    }

    fn parameter_slot(&self, callee: Option<&str>, param: &str) -> Result<i32, SymbolResolutionError> {
        let function = callee.unwrap_or_default();
        let scope = self.table.function_locals(function).ok_or_else(|| {
            SymbolResolutionError::UnknownSymbol {
                category: Category::Function,
                name: function.to_string(),
            }
        })?;
        scope
            .slot(param)
            .ok_or_else(|| SymbolResolutionError::UnknownParameter {
                function: function.to_string(),
                name: param.to_string(),
            })
    }
}

/// Compact scripts against a prebuilt table.
pub fn compact_scripts(scripts: &Node, table: &SymbolTable) -> Result<Node, SymbolResolutionError> {
    Compactor::new(table).compact(scripts)
}

/// Rewrite a function or handler declaration under its own scope.
///
/// `args` collapses to its arity, `locals` entries take their slots, and
/// variable accessors in `locals` and `blocks` that name a local take its slot.
fn bind_declaration(decl: &Mapping, scope: &LocalScope) -> Mapping {
    decl.iter()
        .map(|(key, value)| {
            let bound = match key.as_str() {
                keys::ARGS => match value {
                    Node::Sequence(args) => Node::Number(args.len() as f64),
                    _ => value.clone(),
                },
                keys::LOCALS => bind_local_entries(value, scope),
                keys::BLOCKS => bind_accessors(value, scope),
                _ => value.clone(),
            };
            (key.clone(), bound)
        })
        .collect()
}

fn bind_local_entries(locals: &Node, scope: &LocalScope) -> Node {
    let Node::Sequence(entries) = locals else {
        return bind_accessors(locals, scope);
    };
    let entries = entries
        .iter()
        .map(|entry| match entry {
            Node::Mapping(map) => Node::Mapping(
                map.iter()
                    .map(|(key, value)| {
                        let bound = match value {
                            Node::Text(name) if key == keys::VARIABLE => scope
                                .slot(name)
                                .map_or_else(|| value.clone(), |slot| Node::Number(f64::from(slot))),
                            _ => bind_accessors(value, scope),
                        };
                        (key.clone(), bound)
                    })
                    .collect(),
            ),
            _ => bind_accessors(entry, scope),
        })
        .collect();
    Node::Sequence(entries)
}

/// Replace local names on variable accessors anywhere under `node`.
fn bind_accessors(node: &Node, scope: &LocalScope) -> Node {
    match node {
        Node::Number(_) | Node::Text(_) => node.clone(),
        Node::Sequence(items) => Node::Sequence(items.iter().map(|i| bind_accessors(i, scope)).collect()),
        Node::Mapping(map) => {
            let accessor = node.block_kind().is_variable_accessor();
            Node::Mapping(
                map.iter()
                    .map(|(key, value)| {
                        let slot = match value {
                            Node::Text(name) if accessor && key == keys::VARIABLE => scope.slot(name),
                            _ => None,
                        };
                        let bound = match slot {
                            Some(slot) => Node::Number(f64::from(slot)),
                            None => bind_accessors(value, scope),
                        };
                        (key.clone(), bound)
                    })
                    .collect(),
            )
        }
    }
}

/// Drop authoring-only annotations at every depth.
pub fn strip_annotations(node: &Node) -> Node {
    match node {
        Node::Number(_) | Node::Text(_) => node.clone(),
        Node::Sequence(items) => Node::Sequence(items.iter().map(strip_annotations).collect()),
        Node::Mapping(map) => Node::Mapping(
            map.iter()
                .filter(|(key, _)| !ANNOTATION_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), strip_annotations(value)))
                .collect(),
        ),
    }
}

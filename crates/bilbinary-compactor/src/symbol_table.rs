//! Symbol table for resolving script names to indices.
//!
//! Global names (functions, variables, lists, images) get 0-based indices in
//! declaration order, with one counter per category. Parameters and locals of
//! each function, and the locals of the entry handler, get negative slots
//! starting at -1: parameters first, then locals.

use std::collections::HashMap;

use bilbinary_tree::{BlockKind, Category, Node, keys};
use indexmap::IndexMap;

use crate::compactor::SymbolResolutionError;

/// Index of a global name within its category.
pub type GlobalIndex = u32;

/// Negative slot of a parameter or local.
pub type LocalSlot = i32;

/// Names of one category, indexed in declaration order.
#[derive(Debug, Clone, Default)]
pub struct GlobalNames {
    indices: HashMap<String, GlobalIndex>,
    next: GlobalIndex,
}

impl GlobalNames {
    /// Bind `name` to the next index. A repeated name is rebound.
    fn declare(&mut self, name: &str) -> GlobalIndex {
        let index = self.next;
        self.indices.insert(name.to_string(), index);
        self.next += 1;
        index
    }

    /// Index of a name.
    pub fn get(&self, name: &str) -> Option<GlobalIndex> {
        self.indices.get(name).copied()
    }

    /// Number of declarations seen, including rebinds.
    pub fn count(&self) -> GlobalIndex {
        self.next
    }
}

/// Parameters and locals of one function or handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalScope {
    slots: IndexMap<String, LocalSlot>,
    next: LocalSlot,
    lowest: LocalSlot,
}

impl Default for LocalScope {
    fn default() -> Self {
        Self {
            slots: IndexMap::new(),
            next: -1,
            lowest: 0,
        }
    }
}

impl LocalScope {
    /// Claim the next slot, binding `name` to it when there is one.
    ///
    /// Consumes the scope and returns the updated one, so slot assignment is a
    /// fold over the declared entries.
    fn bind(mut self, name: Option<&str>, owner: &str) -> Result<Self, SymbolResolutionError> {
        if let Some(name) = name {
            if self.slots.contains_key(name) {
                return Err(SymbolResolutionError::DuplicateLocal {
                    scope: owner.to_string(),
                    name: name.to_string(),
                });
            }
            self.slots.insert(name.to_string(), self.next);
        }
        self.lowest = self.lowest.min(self.next);
        self.next -= 1;
        Ok(self)
    }

    /// Start a new frame at slot -1, keeping the names bound so far.
    fn restart(mut self) -> Self {
        self.next = -1;
        self
    }

    /// Bind every entry of a declaration's `args` or `locals` list.
    fn bind_entries(self, entries: Option<&Node>, owner: &str) -> Result<Self, SymbolResolutionError> {
        let entries = entries.and_then(Node::as_sequence).unwrap_or(&[]);
        entries.iter().try_fold(self, |scope, entry| {
            let name = entry.get(keys::VARIABLE).and_then(Node::as_str);
            scope.bind(name, owner)
        })
    }

    /// Slot of a name.
    pub fn slot(&self, name: &str) -> Option<LocalSlot> {
        self.slots.get(name).copied()
    }

    /// Number of slots in the largest frame bound into this scope.
    pub fn len(&self) -> usize {
        self.lowest.unsigned_abs() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bound names and their slots, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, LocalSlot)> {
        self.slots.iter().map(|(name, &slot)| (name.as_str(), slot))
    }
}

/// Names declared by one script, resolved to indices and slots.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    functions: GlobalNames,
    variables: GlobalNames,
    lists: GlobalNames,
    images: GlobalNames,
    /// Locals of each function, by function name.
    function_locals: HashMap<String, LocalScope>,
    /// Locals of the entry handler.
    handler_locals: LocalScope,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from a script's top-level declarations.
    pub fn build(declarations: &[Node]) -> Result<Self, SymbolResolutionError> {
        declarations
            .iter()
            .try_fold(Self::new(), |table, decl| table.declare(decl))
    }

    fn declare(mut self, decl: &Node) -> Result<Self, SymbolResolutionError> {
        let kind = decl.block_kind();

        if let Some(category) = kind.declares() {
            if let Some(name) = decl.get(category.key()).and_then(Node::as_str) {
                self.names_mut(category).declare(name);
            }
        }

        match kind {
            BlockKind::Function => {
                if let Some(name) = decl.get(keys::FUNCTION).and_then(Node::as_str) {
                    let owner = format!("function {:?}", name);
                    let scope = LocalScope::default()
                        .bind_entries(decl.get(keys::ARGS), &owner)?
                        .bind_entries(decl.get(keys::LOCALS), &owner)?;
                    self.function_locals.insert(name.to_string(), scope);
                }
            }
            BlockKind::WhenGreenFlagClicked => {
                // Handlers share names but each frame starts at -1.
                let handler = std::mem::take(&mut self.handler_locals).restart();
                self.handler_locals =
                    handler.bind_entries(decl.get(keys::LOCALS), "when-green-flag-clicked")?;
            }
            _ => {}
        }

        Ok(self)
    }

    fn names_mut(&mut self, category: Category) -> &mut GlobalNames {
        match category {
            Category::Function => &mut self.functions,
            Category::Variable => &mut self.variables,
            Category::List => &mut self.lists,
            Category::Image => &mut self.images,
        }
    }

    /// Names declared in a category.
    pub fn names(&self, category: Category) -> &GlobalNames {
        match category {
            Category::Function => &self.functions,
            Category::Variable => &self.variables,
            Category::List => &self.lists,
            Category::Image => &self.images,
        }
    }

    /// Global index of a name.
    pub fn global(&self, category: Category, name: &str) -> Option<GlobalIndex> {
        self.names(category).get(name)
    }

    /// Parameters and locals of a function.
    pub fn function_locals(&self, function: &str) -> Option<&LocalScope> {
        self.function_locals.get(function)
    }

    /// Locals of the entry handler.
    pub fn handler_locals(&self) -> &LocalScope {
        &self.handler_locals
    }
}

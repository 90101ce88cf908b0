//! Block kinds and their environment-typed fields.

use std::fmt;

/// Well-known mapping keys.
pub mod keys {
    pub const NAME: &str = "name";
    pub const ARGS: &str = "args";
    pub const LOCALS: &str = "locals";
    pub const BLOCKS: &str = "blocks";
    pub const VALUE: &str = "value";
    pub const VARIABLE: &str = "variable";
    pub const FUNCTION: &str = "function";
    pub const LIST: &str = "list";
    pub const IMAGE: &str = "image";
    pub const SCRIPTS: &str = "scripts";
    pub const PORT_SETTINGS: &str = "port-settings";
    pub const PORT_PARAMETERS: &str = "port-parameters";
    /// Authoring-only annotation carried by blocks converted from Python.
    pub const PYTHON_INFO: &str = "python-info";
}

/// A namespace of global names resolved through the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Function,
    Variable,
    List,
    Image,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Function,
        Category::Variable,
        Category::List,
        Category::Image,
    ];

    /// The mapping key that holds a name of this category.
    pub fn key(self) -> &'static str {
        match self {
            Category::Function => keys::FUNCTION,
            Category::Variable => keys::VARIABLE,
            Category::List => keys::LIST,
            Category::Image => keys::IMAGE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The kinds of block the compactor treats specially.
///
/// Every other instruction is [`BlockKind::Other`] and is walked without any
/// name resolution of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    // =========================================================================
    // Declarations
    // =========================================================================
    Function,
    Variable,
    List,
    Image,
    /// The program entry handler.
    WhenGreenFlagClicked,

    // =========================================================================
    // Environment accessors
    // =========================================================================
    CallFunction,
    VariableRef,
    SetVariableTo,
    ChangeVariableBy,
    ListLength,
    ListAdd,
    ListContains,
    ListRef,
    ListDelete,
    ListReplace,
    ListInsert,
    LedMatrix,

    Other,
}

impl BlockKind {
    /// Classify a block by its `name` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "function" => BlockKind::Function,
            "variable" => BlockKind::Variable,
            "list" => BlockKind::List,
            "image" => BlockKind::Image,
            "when-green-flag-clicked" => BlockKind::WhenGreenFlagClicked,
            "call-function" => BlockKind::CallFunction,
            "variable-ref" => BlockKind::VariableRef,
            "set-variable-to" => BlockKind::SetVariableTo,
            "change-variable-by" => BlockKind::ChangeVariableBy,
            "list-length" => BlockKind::ListLength,
            "list-add" => BlockKind::ListAdd,
            "list-contains?" => BlockKind::ListContains,
            "list-ref" => BlockKind::ListRef,
            "list-delete" => BlockKind::ListDelete,
            "list-replace" => BlockKind::ListReplace,
            "list-insert" => BlockKind::ListInsert,
            "led-matrix" => BlockKind::LedMatrix,
            _ => BlockKind::Other,
        }
    }

    /// The field of this block that names something in the environment.
    pub fn environment_field(self) -> Option<Category> {
        match self {
            BlockKind::Function | BlockKind::CallFunction => Some(Category::Function),

            BlockKind::Variable
            | BlockKind::VariableRef
            | BlockKind::SetVariableTo
            | BlockKind::ChangeVariableBy => Some(Category::Variable),

            BlockKind::List
            | BlockKind::ListLength
            | BlockKind::ListAdd
            | BlockKind::ListContains
            | BlockKind::ListRef
            | BlockKind::ListDelete
            | BlockKind::ListReplace
            | BlockKind::ListInsert => Some(Category::List),

            BlockKind::Image | BlockKind::LedMatrix => Some(Category::Image),

            BlockKind::WhenGreenFlagClicked | BlockKind::Other => None,
        }
    }

    /// The global category a top-level declaration of this kind introduces.
    pub fn declares(self) -> Option<Category> {
        match self {
            BlockKind::Function => Some(Category::Function),
            BlockKind::Variable => Some(Category::Variable),
            BlockKind::List => Some(Category::List),
            BlockKind::Image => Some(Category::Image),
            _ => None,
        }
    }

    /// Whether the block reads or writes a variable, and so may refer to a
    /// local slot of the enclosing function or handler.
    pub fn is_variable_accessor(self) -> bool {
        matches!(
            self,
            BlockKind::VariableRef | BlockKind::SetVariableTo | BlockKind::ChangeVariableBy
        )
    }

    /// Whether the block owns a local scope.
    pub fn opens_scope(self) -> bool {
        matches!(self, BlockKind::Function | BlockKind::WhenGreenFlagClicked)
    }

    /// Whether a top-level script entry of this kind is sent to the target.
    pub fn is_toplevel(self) -> bool {
        self.opens_scope() || self.declares().is_some()
    }
}

//! Entities: one node of the binding tree per bindable C++ declaration.
//!
//! An entity wraps the first cursor seen for its scope key and knows how to
//! render the pybind11 registration code for that declaration. The emitter
//! assembles the pieces as
//!
//! ```text
//! <type_str> <struct_name> = <init_expr(parent symbol)>;
//! <update_stmts(struct_name)>
//! <extra_code>
//! ```
//!
//! with every `top_level_extra_code` placed at file scope before the
//! declaration function.

use std::fmt::{self, Debug, Display, Formatter};

use weaver_ast::{
    nodes::{Access, CursorKind},
    translation_unit::{Cursor, Type},
};

use crate::{config::IoConfig, gen_unit::GenUnit, pass_state::PassState};

pub mod class;
pub mod docstring;
pub mod enumeration;
pub mod function;
pub mod namespace;
pub mod variable;

pub use class::ClassEntity;
pub use enumeration::EnumEntity;
pub use function::FunctionEntity;
pub use namespace::NamespaceEntity;
pub use variable::VariableEntity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Namespace,
    Class,
    Enum,
    Function,
    Variable,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Namespace => write!(f, "Namespace"),
            EntityKind::Class => write!(f, "Class"),
            EntityKind::Enum => write!(f, "Enum"),
            EntityKind::Function => write!(f, "Function"),
            EntityKind::Variable => write!(f, "Variable"),
        }
    }
}

pub trait Entity: Debug {
    fn cursor(&self) -> &Cursor;

    fn kind(&self) -> EntityKind;

    /// Key that tells this entity apart from its siblings; two siblings with
    /// the same key are a reopened namespace or a redeclaration.
    fn scope_key(&self) -> &str;

    /// Fully qualified C++ name, unique across the tree.
    fn reference_name(&self) -> &str;

    /// C++ identifier of the generated binding object.
    fn struct_name(&self) -> &str;

    /// Expression that creates the binding object under `parent_scope_symbol`.
    fn init_expr(&self, parent_scope_symbol: &str) -> String;

    /// Statements that populate the object named `object_symbol`.
    fn update_stmts(&self, object_symbol: &str) -> String;

    /// Full C++ type of the binding object.
    fn type_str(&self) -> String;

    fn extra_code(&self) -> String {
        String::new()
    }

    fn top_level_extra_code(&self) -> String {
        String::new()
    }

    /// Reference names of entities that must be registered first.
    fn dependency(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_namespace(&self) -> bool {
        self.kind() == EntityKind::Namespace
    }
}

/// Per-IO switches that change how entities render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    pub gen_docstring: bool,
    pub strict_visibility: bool,
}

impl RenderOptions {
    #[must_use]
    pub fn from_io(io: &IoConfig) -> Self {
        Self {
            gen_docstring: io.gen_docstring,
            strict_visibility: io.strict_visibility_mode,
        }
    }

    /// The raw comment of `cursor` when docstrings are enabled.
    #[must_use]
    pub fn comment<'c>(&self, cursor: &'c Cursor) -> Option<&'c str> {
        if self.gen_docstring {
            cursor.raw_comment()
        } else {
            None
        }
    }

    /// Whether a class member or nested declaration with `access` is bound.
    #[must_use]
    pub fn exposes(&self, access: Access) -> bool {
        match access {
            Access::Public | Access::Invalid => true,
            Access::Protected => !self.strict_visibility,
            Access::Private => false,
        }
    }
}

/// Builds the entity for `cursor`, or `None` for declarations that have no
/// binding of their own.
pub fn create_entity(
    gu: &GenUnit,
    state: &mut PassState,
    cursor: &Cursor,
) -> Option<Box<dyn Entity>> {
    let options = RenderOptions::from_io(gu.io());
    let in_record = cursor
        .semantic_parent()
        .is_some_and(|parent| parent.kind().is_record());
    if in_record && !options.exposes(cursor.access()) {
        return None;
    }
    match cursor.kind() {
        CursorKind::Namespace => Some(Box::new(NamespaceEntity::new(state, cursor, options))),
        CursorKind::ClassDecl | CursorKind::StructDecl
            if is_named(cursor) && (cursor.is_definition() || cursor.is_concrete_template()) =>
        {
            Some(Box::new(ClassEntity::new(state, cursor, options, |decl| {
                gu.is_cursor_in_inputs(decl)
            })))
        }
        CursorKind::EnumDecl if is_named(cursor) && cursor.is_definition() => {
            Some(Box::new(EnumEntity::new(state, cursor, options)))
        }
        CursorKind::FunctionDecl if !is_operator(cursor) => {
            Some(Box::new(FunctionEntity::new(state, cursor, options)))
        }
        CursorKind::VarDecl if !in_record => {
            Some(Box::new(VariableEntity::new(state, cursor)))
        }
        _ => None,
    }
}

/// Turns a C++ name into an identifier fragment: `::` becomes `__`, any
/// other character outside `[A-Za-z0-9_]` becomes `_`.
#[must_use]
pub fn mangle(name: &str) -> String {
    name.replace("::", "__")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

pub(crate) fn struct_name_for(state: &mut PassState, kind: EntityKind, reference_name: &str) -> String {
    state.unique_struct_name(&format!("{kind}_{}", mangle(reference_name)))
}

pub(crate) fn spelling_or(ty: Option<Type>, fallback: &str) -> String {
    ty.map_or_else(|| fallback.to_string(), |ty| ty.spelling().to_string())
}

/// Comma-separated parameter types of a function-like cursor.
pub(crate) fn argument_types(cursor: &Cursor) -> String {
    cursor
        .arguments()
        .iter()
        .map(|arg| spelling_or(arg.cursor_type(), "int"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The `(...)` tail of a display name such as `f(int, double)`.
pub(crate) fn signature_suffix(display_name: &str) -> &str {
    display_name
        .find('(')
        .map_or("", |pos| &display_name[pos..])
}

pub(crate) fn is_operator(cursor: &Cursor) -> bool {
    cursor
        .spelling()
        .strip_prefix("operator")
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'))
}

/// Anonymous records and enums have an empty spelling, or one such as
/// `(anonymous struct at a.h:3:5)` depending on the provider.
fn is_named(cursor: &Cursor) -> bool {
    let spelling = cursor.spelling();
    !spelling.is_empty() && !spelling.starts_with('(')
}

use weaver_ast::translation_unit::Cursor;

use super::{
    docstring::{inject_docstring, DocMode},
    struct_name_for, Entity, EntityKind, RenderOptions,
};
use crate::pass_state::PassState;

const ANONYMOUS_KEY: &str = "(anonymous)";

/// A namespace, bound as a Python submodule.
///
/// Anonymous namespaces do not get a submodule; their members are registered
/// on the enclosing module.
#[derive(Debug)]
pub struct NamespaceEntity {
    cursor: Cursor,
    scope_key: String,
    reference_name: String,
    struct_name: String,
    doc: Option<String>,
}

impl NamespaceEntity {
    pub fn new(state: &mut PassState, cursor: &Cursor, options: RenderOptions) -> Self {
        let scope_key = if cursor.spelling().is_empty() {
            ANONYMOUS_KEY.to_string()
        } else {
            cursor.spelling().to_string()
        };
        let qualified = cursor.qualified_name();
        let reference_name = if cursor.spelling().is_empty() {
            if qualified.is_empty() {
                ANONYMOUS_KEY.to_string()
            } else {
                format!("{qualified}::{ANONYMOUS_KEY}")
            }
        } else {
            qualified
        };
        let struct_name = struct_name_for(state, EntityKind::Namespace, &reference_name);
        Self {
            cursor: cursor.clone(),
            scope_key,
            reference_name,
            struct_name,
            doc: options.comment(cursor).map(str::to_string),
        }
    }

    fn is_anonymous(&self) -> bool {
        self.cursor.spelling().is_empty()
    }
}

impl Entity for NamespaceEntity {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Namespace
    }

    fn scope_key(&self) -> &str {
        &self.scope_key
    }

    fn reference_name(&self) -> &str {
        &self.reference_name
    }

    fn struct_name(&self) -> &str {
        &self.struct_name
    }

    fn init_expr(&self, parent_scope_symbol: &str) -> String {
        if self.is_anonymous() {
            return parent_scope_symbol.to_string();
        }
        inject_docstring(
            &format!("{parent_scope_symbol}.def_submodule(\"{}\")", self.cursor.spelling()),
            self.doc.as_deref(),
            DocMode::LastArg,
        )
    }

    fn update_stmts(&self, _object_symbol: &str) -> String {
        String::new()
    }

    fn type_str(&self) -> String {
        if self.is_anonymous() {
            "pybind11::module_ &".to_string()
        } else {
            "pybind11::module_".to_string()
        }
    }
}

use weaver_ast::translation_unit::Cursor;

use super::{struct_name_for, Entity, EntityKind};
use crate::pass_state::PassState;

/// A namespace-scope variable, exported as a module attribute holding its
/// value at import time.
#[derive(Debug)]
pub struct VariableEntity {
    cursor: Cursor,
    scope_key: String,
    reference_name: String,
    struct_name: String,
}

impl VariableEntity {
    pub fn new(state: &mut PassState, cursor: &Cursor) -> Self {
        let reference_name = cursor.qualified_name();
        let struct_name = struct_name_for(state, EntityKind::Variable, &reference_name);
        Self {
            cursor: cursor.clone(),
            scope_key: cursor.spelling().to_string(),
            reference_name,
            struct_name,
        }
    }
}

impl Entity for VariableEntity {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Variable
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
        parent_scope_symbol.to_string()
    }

    fn update_stmts(&self, object_symbol: &str) -> String {
        format!(
            "{object_symbol}.attr(\"{}\") = {};",
            self.cursor.spelling(),
            self.reference_name
        )
    }

    fn type_str(&self) -> String {
        "pybind11::module_ &".to_string()
    }
}

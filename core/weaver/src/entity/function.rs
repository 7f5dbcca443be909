use weaver_ast::translation_unit::Cursor;

use super::{
    argument_types,
    docstring::{inject_docstring, DocMode},
    signature_suffix, spelling_or, struct_name_for, Entity, EntityKind, RenderOptions,
};
use crate::pass_state::PassState;

/// A free function; each overload is its own entity keyed by its signature.
#[derive(Debug)]
pub struct FunctionEntity {
    cursor: Cursor,
    scope_key: String,
    reference_name: String,
    struct_name: String,
    doc: Option<String>,
}

impl FunctionEntity {
    pub fn new(state: &mut PassState, cursor: &Cursor, options: RenderOptions) -> Self {
        let reference_name = format!(
            "{}{}",
            cursor.qualified_name(),
            signature_suffix(cursor.display_name())
        );
        let struct_name = struct_name_for(state, EntityKind::Function, &reference_name);
        Self {
            cursor: cursor.clone(),
            scope_key: cursor.display_name().to_string(),
            reference_name,
            struct_name,
            doc: options.comment(cursor).map(str::to_string),
        }
    }

    /// `static_cast<R (*)(A...)>(&ns::f)`, which picks one overload.
    fn function_pointer(&self) -> String {
        format!(
            "static_cast<{} (*)({})>(&{})",
            spelling_or(self.cursor.result_type(), "void"),
            argument_types(&self.cursor),
            self.cursor.qualified_name()
        )
    }
}

impl Entity for FunctionEntity {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Function
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
        let args = inject_docstring(&self.function_pointer(), self.doc.as_deref(), DocMode::Append);
        format!("{object_symbol}.def(\"{}\", {args});", self.cursor.spelling())
    }

    fn type_str(&self) -> String {
        "pybind11::module_ &".to_string()
    }
}

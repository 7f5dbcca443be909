use weaver_ast::{nodes::CursorKind, translation_unit::Cursor};

use super::{
    docstring::{inject_docstring, DocMode},
    struct_name_for, Entity, EntityKind, RenderOptions,
};
use crate::pass_state::PassState;

#[derive(Debug)]
pub struct EnumEntity {
    cursor: Cursor,
    scope_key: String,
    reference_name: String,
    struct_name: String,
    options: RenderOptions,
}

impl EnumEntity {
    pub fn new(state: &mut PassState, cursor: &Cursor, options: RenderOptions) -> Self {
        let reference_name = cursor.qualified_name();
        let struct_name = struct_name_for(state, EntityKind::Enum, &reference_name);
        Self {
            cursor: cursor.clone(),
            scope_key: cursor.spelling().to_string(),
            reference_name,
            struct_name,
            options,
        }
    }
}

impl Entity for EnumEntity {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Enum
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
        inject_docstring(
            &format!(
                "{}({parent_scope_symbol}, \"{}\")",
                self.type_str(),
                self.cursor.spelling()
            ),
            self.options.comment(&self.cursor),
            DocMode::LastArg,
        )
    }

    fn update_stmts(&self, object_symbol: &str) -> String {
        self.cursor
            .children()
            .iter()
            .filter(|child| *child.kind() == CursorKind::EnumConstantDecl)
            .map(|value| {
                let args = inject_docstring(
                    &format!("\"{}\", {}::{}", value.spelling(), self.reference_name, value.spelling()),
                    self.options.comment(value),
                    DocMode::Append,
                );
                format!("{object_symbol}.value({args});")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn type_str(&self) -> String {
        format!("pybind11::enum_<{}>", self.reference_name)
    }
}
